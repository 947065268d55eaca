/// Third Umpire: Error Taxonomy
///
/// Every rejection is synchronous and non-partial: the state a command was
/// applied to is left untouched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// A required selection is missing, or the innings/match has concluded.
    #[error("ConfigurationError: {0}")]
    Configuration(String),

    /// Illegal value, unknown kind, or missing participant.
    #[error("ValidationError: {0}")]
    Validation(String),

    /// Nothing to undo.
    #[error("NoOpError: {0}")]
    NoOp(String),

    /// Envelope out of order or from an unsupported schema.
    #[error("SequenceError: {0}")]
    Sequence(String),

    /// A transition produced a state that breaks a match invariant.
    #[error("InvariantViolation: {0}")]
    Invariant(String),
}

impl ScoringError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        ScoringError::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ScoringError::Validation(msg.into())
    }
}
