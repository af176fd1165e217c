#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    /// Built from a flagged sentence; the user should find and fix the error.
    IncorrectPrompt,
    /// Filler; the user should recognize the sentence as grammatical.
    CorrectPrompt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    /// No text generated yet for this occurrence.
    Pending,
    Presented,
    /// The user called an incorrect prompt incorrect and owes a correction.
    AwaitingCorrection,
    Resolved,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseItem {
    /// The flagged sentence, or for correct prompts the seed picked on first
    /// materialization (empty until then).
    pub source_text: String,
    pub kind: ItemKind,
    pub materialized: Option<String>,
    pub state: ItemState,
}

impl ExerciseItem {
    pub fn incorrect(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            kind: ItemKind::IncorrectPrompt,
            materialized: None,
            state: ItemState::Pending,
        }
    }

    pub fn correct_filler() -> Self {
        Self {
            source_text: String::new(),
            kind: ItemKind::CorrectPrompt,
            materialized: None,
            state: ItemState::Pending,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ItemState::Resolved
    }

    pub fn has_seed(&self) -> bool {
        !self.source_text.is_empty()
    }

    pub(crate) fn present(&mut self, text: String) {
        self.materialized = Some(text);
        self.state = ItemState::Presented;
    }

    /// A fresh occurrence for the next round; its text is generated again.
    pub(crate) fn recirculated(&self) -> Self {
        Self {
            source_text: self.source_text.clone(),
            kind: self.kind,
            materialized: None,
            state: ItemState::Pending,
        }
    }
}
