//! Error types for the completion workflow.

use thiserror::Error;

use crate::service::QueryState;

/// Result type for pipeline setup operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised before a workflow runs (settings, input parsing).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration could not be turned into workflow settings.
    #[error("Invalid configuration: {0}")]
    Config(#[from] postcrawl_config::ConfigError),

    /// The completion event was not valid JSON.
    #[error("Invalid completion event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

/// A call to an external service failed at the transport or API level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct ServiceError {
    /// The API operation, e.g. `glue:StartCrawler`.
    pub operation: String,
    /// Rendered error from the service client.
    pub message: String,
}

impl ServiceError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Terminal failures of a single workflow invocation.
///
/// None of these are retried; the caller re-delivers the signal if it wants
/// another attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowFailure {
    /// No content-type marker in the job name. Expected traffic, not a crash.
    #[error("no crawler for job name '{job_name}'")]
    UnclassifiedSignal { job_name: String },

    /// The catalog has no entry for the resolved prefix.
    #[error("no tables found with prefix {prefix} in database {database}")]
    NoMatchingEntry { database: String, prefix: String },

    /// The validation query ended in a terminal state other than SUCCEEDED.
    #[error("query {run_id} did not succeed (state {state}): {reason}")]
    QueryNotSucceeded {
        run_id: String,
        state: QueryState,
        reason: String,
    },

    /// An external service call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl WorkflowFailure {
    /// Stable name of the failure kind, for alerting and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowFailure::UnclassifiedSignal { .. } => "UnclassifiedSignal",
            WorkflowFailure::NoMatchingEntry { .. } => "NoMatchingEntry",
            WorkflowFailure::QueryNotSucceeded { .. } => "QueryNotSucceeded",
            WorkflowFailure::Service(_) => "ServiceError",
        }
    }

    /// Reason string reported to the caller.
    ///
    /// For a failed query this is the reason the query service gave; for
    /// everything else it is the failure kind.
    pub fn reason(&self) -> String {
        match self {
            WorkflowFailure::QueryNotSucceeded { reason, .. } => reason.clone(),
            other => other.kind().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_uses_service_text_for_queries() {
        let failure = WorkflowFailure::QueryNotSucceeded {
            run_id: "q-1".into(),
            state: QueryState::Failed,
            reason: "Syntax error".into(),
        };
        assert_eq!(failure.kind(), "QueryNotSucceeded");
        assert_eq!(failure.reason(), "Syntax error");
        assert!(failure.to_string().contains("FAILED"));
    }

    #[test]
    fn test_reason_is_kind_otherwise() {
        let failure = WorkflowFailure::UnclassifiedSignal {
            job_name: "cleanup-job".into(),
        };
        assert_eq!(failure.reason(), "UnclassifiedSignal");

        let failure = WorkflowFailure::from(ServiceError::new("glue:GetTables", "throttled"));
        assert_eq!(failure.reason(), "ServiceError");
        assert_eq!(failure.to_string(), "glue:GetTables failed: throttled");
    }
}
