//! Error types for the Fieldhand domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Fieldhand operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Database errors ---
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool input: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Import failed: {0}")]
    Import(String),
}

/// Failure modes of a single bounded agent run.
///
/// `UnknownTool` and `ToolExecution` are recovered inside the loop and fed
/// back to the model as observations. `ParseFailure` and `ToolLimitExceeded`
/// end the run with a fallback answer. None of them escape `run`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopError {
    #[error("Could not parse reasoning step: {0}")]
    ParseFailure(String),

    #[error("Tool call limit of {limit} exceeded")]
    ToolLimitExceeded { limit: usize },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool {tool_name} failed: {reason}")]
    ToolExecution { tool_name: String, reason: String },
}

impl From<ToolError> for LoopError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(name) => LoopError::UnknownTool(name),
            ToolError::ExecutionFailed { tool_name, reason } => {
                LoopError::ToolExecution { tool_name, reason }
            }
            other => LoopError::ToolExecution {
                tool_name: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "SQL Executor".into(),
            reason: "no such table: Crop".into(),
        });
        assert!(err.to_string().contains("SQL Executor"));
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn not_found_maps_to_unknown_tool() {
        let err: LoopError = ToolError::NotFound("Crystal Ball".into()).into();
        assert_eq!(err, LoopError::UnknownTool("Crystal Ball".into()));
    }

    #[test]
    fn invalid_arguments_maps_to_tool_execution() {
        let err: LoopError = ToolError::InvalidArguments("bad tuple".into()).into();
        assert!(matches!(err, LoopError::ToolExecution { .. }));
        assert!(err.to_string().contains("bad tuple"));
    }
}
