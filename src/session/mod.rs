//! Practice sessions built from flagged sentences.

pub mod engine;
pub mod error;
pub mod item;

pub use engine::{
    Advance, Claim, Counts, CurrentItem, Outcome, PracticeSession, Reveal, filler_count,
};
pub use error::SessionError;
pub use item::{ExerciseItem, ItemKind, ItemState};
