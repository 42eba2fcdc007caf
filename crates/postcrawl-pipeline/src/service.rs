//! Contracts for the external services the workflow drives.
//!
//! The workflow never talks to a client library directly; it is handed a
//! [`Services`] bundle at construction.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;

// ============================================================================
// Refresh task (crawler)
// ============================================================================

/// Lifecycle state of a metadata-refresh task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshState {
    Starting,
    Running,
    Stopping,
    Ready,
    /// A state this crate does not know about. Treated as still in progress.
    Other(String),
}

impl RefreshState {
    /// Parse the service's state string (`READY`, `RUNNING`, ...).
    pub fn parse(state: &str) -> Self {
        match state {
            "STARTING" => RefreshState::Starting,
            "RUNNING" => RefreshState::Running,
            "STOPPING" => RefreshState::Stopping,
            "READY" => RefreshState::Ready,
            other => RefreshState::Other(other.to_string()),
        }
    }

    /// `READY` (refresh complete) or `STOPPING` (halting).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshState::Ready | RefreshState::Stopping)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RefreshState::Starting => "STARTING",
            RefreshState::Running => "RUNNING",
            RefreshState::Stopping => "STOPPING",
            RefreshState::Ready => "READY",
            RefreshState::Other(s) => s,
        }
    }
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Starts and observes metadata-refresh tasks by name.
#[async_trait]
pub trait RefreshTaskService: Send + Sync + fmt::Debug {
    /// Start the task. Starting a task that is already running must succeed.
    async fn start(&self, name: &str) -> Result<(), ServiceError>;

    /// Current state of the task.
    async fn state(&self, name: &str) -> Result<RefreshState, ServiceError>;
}

// ============================================================================
// Catalog
// ============================================================================

/// A queryable table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub database: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: database.into(),
        }
    }
}

/// Lists catalog entries.
#[async_trait]
pub trait CatalogService: Send + Sync + fmt::Debug {
    /// Entries in `database` whose name matches `prefix*`, in the service's
    /// own order.
    async fn list_entries(
        &self,
        database: &str,
        prefix: &str,
    ) -> Result<Vec<CatalogEntry>, ServiceError>;
}

// ============================================================================
// Query
// ============================================================================

/// State of a query run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    /// A state this crate does not know about. Treated as still in progress.
    Other(String),
}

impl QueryState {
    /// Parse the service's state string (`SUCCEEDED`, `FAILED`, ...).
    pub fn parse(state: &str) -> Self {
        match state {
            "QUEUED" => QueryState::Queued,
            "RUNNING" => QueryState::Running,
            "SUCCEEDED" => QueryState::Succeeded,
            "FAILED" => QueryState::Failed,
            "CANCELLED" => QueryState::Cancelled,
            other => QueryState::Other(other.to_string()),
        }
    }

    /// Terminal states are absorbing: `SUCCEEDED`, `FAILED`, `CANCELLED`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded | QueryState::Failed | QueryState::Cancelled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            QueryState::Queued => "QUEUED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
            QueryState::Other(s) => s,
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a query run as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatus {
    pub state: QueryState,
    /// Why the run changed state, when the service says.
    pub reason: Option<String>,
}

impl QueryStatus {
    pub fn new(state: QueryState) -> Self {
        Self {
            state,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// A query submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub database: String,
    /// Where the service writes results, e.g. `s3://bucket/results/`.
    pub output_location: String,
}

/// Submits queries and reports their status.
#[async_trait]
pub trait QueryService: Send + Sync + fmt::Debug {
    /// Submit a query and return its run identifier.
    async fn submit(&self, request: &QueryRequest) -> Result<String, ServiceError>;

    /// Current status of a run.
    async fn status(&self, run_id: &str) -> Result<QueryStatus, ServiceError>;
}

// ============================================================================
// Bundle
// ============================================================================

/// Service handles injected into the orchestrator.
#[derive(Debug, Clone)]
pub struct Services {
    pub refresh: Arc<dyn RefreshTaskService>,
    pub catalog: Arc<dyn CatalogService>,
    pub query: Arc<dyn QueryService>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_terminal_set() {
        assert!(RefreshState::Ready.is_terminal());
        assert!(RefreshState::Stopping.is_terminal());
        assert!(!RefreshState::Starting.is_terminal());
        assert!(!RefreshState::Running.is_terminal());
        assert!(!RefreshState::Other("PAUSED".into()).is_terminal());
    }

    #[test]
    fn test_refresh_parse() {
        assert_eq!(RefreshState::parse("READY"), RefreshState::Ready);
        assert_eq!(RefreshState::parse("RUNNING"), RefreshState::Running);
        // Case-sensitive, like the service.
        assert_eq!(
            RefreshState::parse("ready"),
            RefreshState::Other("ready".into())
        );
        assert_eq!(RefreshState::Stopping.to_string(), "STOPPING");
    }

    #[test]
    fn test_query_terminal_set() {
        for state in [QueryState::Succeeded, QueryState::Failed, QueryState::Cancelled] {
            assert!(state.is_terminal(), "{state} should be terminal");
        }
        for state in [QueryState::Queued, QueryState::Running] {
            assert!(!state.is_terminal(), "{state} should not be terminal");
        }
    }

    #[test]
    fn test_query_parse_display() {
        for text in ["QUEUED", "RUNNING", "SUCCEEDED", "FAILED", "CANCELLED"] {
            assert_eq!(QueryState::parse(text).as_str(), text);
        }
        assert_eq!(
            QueryState::parse("UNKNOWN_STATE"),
            QueryState::Other("UNKNOWN_STATE".into())
        );
    }

    #[test]
    fn test_query_status_with_reason() {
        let status = QueryStatus::new(QueryState::Failed).with_reason("Syntax error");
        assert_eq!(status.reason.as_deref(), Some("Syntax error"));
    }
}
