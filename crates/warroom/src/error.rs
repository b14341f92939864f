//! Error types for the war room

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a CSV source at startup
#[derive(Debug, Error)]
pub enum LoadError {
    /// A required source file does not exist
    #[error("Missing data file: {}", .path.display())]
    MissingFile { path: PathBuf },

    /// The file exists but could not be read as CSV
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A row failed schema validation
    #[error("{}{}: {message}", .path.display(), line_suffix(.line))]
    Row {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    /// Two metric rows share the same (ticker, period, metric) identity
    #[error("{} line {line}: duplicate metric {key} (first seen on line {first_line})", .path.display())]
    DuplicateMetric {
        path: PathBuf,
        line: u64,
        first_line: u64,
        key: String,
    },
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" line {l}")).unwrap_or_default()
}

impl LoadError {
    /// File the error refers to
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::MissingFile { path }
            | Self::Read { path, .. }
            | Self::Row { path, .. }
            | Self::DuplicateMetric { path, .. } => path,
        }
    }
}

/// War room errors
#[derive(Debug, Error)]
pub enum WarRoomError {
    /// Data could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (empty question, unknown tool, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The text-generation service failed or was unreachable
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The research loop ran out of turns
    #[error("Turn limit of {0} reached without a final answer")]
    TurnLimit(usize),

    /// Prompt template failure
    #[error("Prompt error: {0}")]
    Prompt(#[from] agent_prompt::PromptError),

    /// Any other agent failure
    #[error("Agent error: {0}")]
    Agent(String),
}

impl WarRoomError {
    /// Whether the error came from the external generation service
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation(_))
    }
}

/// Result type alias for war room operations
pub type Result<T> = std::result::Result<T, WarRoomError>;

impl From<agent_core::Error> for WarRoomError {
    fn from(err: agent_core::Error) -> Self {
        match err {
            agent_core::Error::Generation(msg) => Self::Generation(msg),
            agent_core::Error::TurnLimitExceeded(n) => Self::TurnLimit(n),
            other => Self::Agent(other.to_string()),
        }
    }
}

impl From<agent_llm::LLMError> for WarRoomError {
    fn from(err: agent_llm::LLMError) -> Self {
        match err {
            agent_llm::LLMError::ConfigurationError(msg) => Self::Config(msg),
            other => Self::Generation(other.to_string()),
        }
    }
}

/// Convert WarRoomError to agent_core::Error
impl From<WarRoomError> for agent_core::Error {
    fn from(err: WarRoomError) -> Self {
        match err {
            WarRoomError::Generation(msg) => agent_core::Error::Generation(msg),
            WarRoomError::TurnLimit(n) => agent_core::Error::TurnLimitExceeded(n),
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_names_file_and_line() {
        let err = LoadError::Row {
            path: PathBuf::from("data/metrics.csv"),
            line: Some(7),
            message: "fiscal quarter 5 outside 1-4".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "data/metrics.csv line 7: fiscal quarter 5 outside 1-4"
        );

        let err = LoadError::MissingFile {
            path: PathBuf::from("data/transcripts.csv"),
        };
        assert_eq!(err.to_string(), "Missing data file: data/transcripts.csv");
        assert_eq!(err.path(), std::path::Path::new("data/transcripts.csv"));
    }

    #[test]
    fn test_core_error_round_trip_keeps_kind() {
        let err: WarRoomError = agent_core::Error::Generation("refused".to_string()).into();
        assert!(err.is_generation());

        let err: WarRoomError = agent_core::Error::TurnLimitExceeded(4).into();
        assert!(matches!(err, WarRoomError::TurnLimit(4)));

        let core: agent_core::Error = WarRoomError::Generation("x".to_string()).into();
        assert!(core.is_generation());

        let core: agent_core::Error = WarRoomError::Config("bad".to_string()).into();
        assert!(matches!(core, agent_core::Error::ProcessingFailed(_)));
    }

    #[test]
    fn test_llm_configuration_error_is_config() {
        let err: WarRoomError =
            agent_llm::LLMError::ConfigurationError("ANTHROPIC_API_KEY not set".to_string()).into();
        assert!(matches!(err, WarRoomError::Config(_)));
    }
}
