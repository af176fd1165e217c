use thiserror::Error;

use crate::llm::ServiceError;

/// Errors returned by [`super::PracticeSession`] operations.
///
/// None of them leave partial state behind; the same call can be repeated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("practice session already completed")]
    Complete,
    #[error("current exercise has not been presented yet")]
    NotPresented,
    #[error("current exercise was already answered")]
    AlreadyAnswered,
    #[error("current exercise has not been answered")]
    Unanswered,
    #[error("a correction must be submitted for the current exercise")]
    CorrectionPending,
    #[error("no flagged sentence left to seed a correct exercise")]
    SeedsExhausted,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SessionError {
    /// Whether repeating the failed call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionError::Service(err) if err.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_passing_service_failures_are_transient() {
        let timeout = SessionError::Service(ServiceError::Timeout);
        assert!(timeout.is_transient());
        let rejected = SessionError::Service(ServiceError::Authentication);
        assert!(!rejected.is_transient());
        assert!(!SessionError::SeedsExhausted.is_transient());
        assert!(!SessionError::Unanswered.is_transient());
    }
}
