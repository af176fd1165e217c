pub mod messages;
pub mod practice;
mod theme;

pub use messages::{describe, describe_service_error};
pub use theme::Theme;
