//! Error types for each port.

use thiserror::Error;

/// Errors from a ReAct agent run.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AgentError {
    /// An error from the model/LLM provider.
    #[error("model error: {0}")]
    Model(String),

    /// An error during tool execution.
    #[error("tool error in {tool}: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Error message.
        message: String,
    },

    /// The agent failed but retrying might succeed.
    #[error("retryable: {0}")]
    Retryable(String),

    /// The agent failed and retrying won't help (budget exceeded, invalid input).
    #[error("non-retryable: {0}")]
    NonRetryable(String),

    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Orchestration errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum OrchError {
    /// Every worker in the pool failed.
    #[error("all workers failed")]
    AllWorkersFailed,

    /// The synthesizer call failed.
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Dispatching a worker task failed at the runtime level (e.g. the task panicked).
    #[error("dispatch failed: {0}")]
    DispatchFailed(String),

    /// An agent error propagated through orchestration.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Session repository errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RepoError {
    /// Session id not found.
    #[error("session not found: {0}")]
    NotFound(String),

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_error_display() {
        assert_eq!(AgentError::Model("timeout".into()).to_string(), "model error: timeout");
        assert_eq!(
            AgentError::Tool {
                tool: "fetch".into(),
                message: "500".into()
            }
            .to_string(),
            "tool error in fetch: 500"
        );
    }

    #[test]
    fn orch_error_wraps_agent_error() {
        let err: OrchError = AgentError::Cancelled.into();
        assert_eq!(err.to_string(), "agent error: cancelled");
    }

    #[test]
    fn repo_error_display() {
        assert_eq!(
            RepoError::NotFound("sess-1".into()).to_string(),
            "session not found: sess-1"
        );
    }
}
