//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Agent could not be constructed (missing provider, bad template, ...)
    #[error("Agent initialization failed: {0}")]
    InitializationFailed(String),

    /// Agent processing failed for a local reason
    #[error("Agent processing failed: {0}")]
    ProcessingFailed(String),

    /// The external text-generation service failed or was unreachable
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The model kept requesting tools past the configured turn budget
    #[error("Turn limit of {0} reached without a final answer")]
    TurnLimitExceeded(usize),
}

impl Error {
    /// Whether this error originated from the external generation service
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TurnLimitExceeded(5);
        assert_eq!(err.to_string(), "Turn limit of 5 reached without a final answer");

        let err = Error::Generation("connection refused".to_string());
        assert_eq!(err.to_string(), "Generation failed: connection refused");
        assert!(err.is_generation());
        assert!(!Error::ProcessingFailed("x".to_string()).is_generation());
    }
}
