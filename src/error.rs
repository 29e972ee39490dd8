//! Error types for Taskpilot
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Taskpilot
#[derive(Debug, Error)]
pub enum TaskpilotError {
    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Provider asked us to back off
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Tool execution error
    #[error("Tool error: {0}")]
    Tool(String),

    /// Plan could not be built
    #[error("Plan error: {0}")]
    Plan(String),

    /// Missing or invalid configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Prompt template error
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Taskpilot operations
pub type Result<T> = std::result::Result<T, TaskpilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error() {
        let err = TaskpilotError::Llm("bad gateway".to_string());
        assert_eq!(err.to_string(), "LLM error: bad gateway");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = TaskpilotError::RateLimited { retry_after_secs: 30 };
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }

    #[test]
    fn test_config_error() {
        let err = TaskpilotError::Config("GROQ_API_KEY not set".to_string());
        assert_eq!(err.to_string(), "Config error: GROQ_API_KEY not set");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TaskpilotError = io_err.into();
        assert!(matches!(err, TaskpilotError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TaskpilotError = json_err.into();
        assert!(matches!(err, TaskpilotError::Json(_)));
    }
}
