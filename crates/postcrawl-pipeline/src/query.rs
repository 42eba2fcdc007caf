//! Runs the validation query against a resolved table and waits for it.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::ServiceError;
use crate::service::{QueryRequest, QueryService, QueryState, QueryStatus};
use crate::waiter::{PollSchedule, TaskWaiter};

/// Reason reported when a run fails without saying why.
pub const UNKNOWN_REASON: &str = "Unknown";

/// The query used to prove a table is readable end to end.
pub fn validation_query(table: &str) -> String {
    format!("SELECT * FROM {table}")
}

/// Terminal result of a validation query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub run_id: String,
    pub state: QueryState,
    /// Present only when `state` is not `SUCCEEDED`.
    pub reason: Option<String>,
    /// Where the results were written.
    pub output_location: String,
}

impl QueryOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == QueryState::Succeeded
    }
}

/// Submits the validation query and polls it to a terminal state.
///
/// The wait has no deadline: a run that never finishes blocks the invocation.
#[derive(Debug, Clone)]
pub struct QueryCoordinator {
    service: Arc<dyn QueryService>,
    waiter: TaskWaiter,
}

impl QueryCoordinator {
    pub fn new(service: Arc<dyn QueryService>, interval: Duration) -> Self {
        Self {
            service,
            waiter: TaskWaiter::new(PollSchedule::unbounded(interval)),
        }
    }

    /// Run `SELECT *` over `table` in `database`, writing results to
    /// `output_location`, and return once the run is terminal.
    pub async fn run_validation_query(
        &self,
        table: &str,
        database: &str,
        output_location: &str,
    ) -> Result<QueryOutcome, ServiceError> {
        let request = QueryRequest {
            query: validation_query(table),
            database: database.to_string(),
            output_location: output_location.to_string(),
        };

        info!(query = %request.query, database, "Starting Athena query");
        let run_id = self.service.submit(&request).await?;
        info!(
            query_run_id = %run_id,
            output_location,
            "Athena query started, results will be written under the output location"
        );

        let result = self
            .waiter
            .wait(
                || self.service.status(&run_id),
                |status: &QueryStatus| status.state.is_terminal(),
            )
            .await?;

        let QueryStatus { state, reason } = result.state;
        info!(query_run_id = %run_id, state = %state, "Athena query finished");

        let reason = if state == QueryState::Succeeded {
            None
        } else {
            Some(reason.unwrap_or_else(|| UNKNOWN_REASON.to_string()))
        };

        Ok(QueryOutcome {
            run_id,
            state,
            reason,
            output_location: request.output_location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ScriptedQueries, ServiceCall};

    const OUT: &str = "s3://athena-out/results/";

    fn coordinator(queries: Arc<ScriptedQueries>) -> QueryCoordinator {
        QueryCoordinator::new(queries, Duration::from_secs(5))
    }

    #[test]
    fn test_validation_query_text() {
        assert_eq!(validation_query("csv_raw"), "SELECT * FROM csv_raw");
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeded_has_no_reason() {
        let queries = Arc::new(ScriptedQueries::new(
            "q-1",
            [
                QueryStatus::new(QueryState::Queued),
                QueryStatus::new(QueryState::Running),
                // A reason on success is ignored.
                QueryStatus::new(QueryState::Succeeded).with_reason("done"),
            ],
        ));

        let outcome = coordinator(queries.clone())
            .run_validation_query("csv_raw", "lake", OUT)
            .await
            .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.run_id, "q-1");
        assert_eq!(outcome.reason, None);
        assert_eq!(outcome.output_location, OUT);

        let calls = queries.calls();
        assert_eq!(
            calls[0],
            ServiceCall::SubmitQuery(QueryRequest {
                query: "SELECT * FROM csv_raw".into(),
                database: "lake".into(),
                output_location: OUT.into(),
            })
        );
        assert_eq!(calls.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_carries_service_reason() {
        let queries = Arc::new(ScriptedQueries::new(
            "q-2",
            [QueryStatus::new(QueryState::Failed).with_reason("Syntax error")],
        ));

        let outcome = coordinator(queries)
            .run_validation_query("csv_raw", "lake", OUT)
            .await
            .unwrap();

        assert!(!outcome.succeeded());
        assert_eq!(outcome.state, QueryState::Failed);
        assert_eq!(outcome.reason.as_deref(), Some("Syntax error"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_without_reason_is_unknown() {
        let queries = Arc::new(ScriptedQueries::new(
            "q-3",
            [QueryStatus::new(QueryState::Cancelled)],
        ));

        let outcome = coordinator(queries)
            .run_validation_query("t", "lake", OUT)
            .await
            .unwrap();

        assert_eq!(outcome.state, QueryState::Cancelled);
        assert_eq!(outcome.reason.as_deref(), Some(UNKNOWN_REASON));
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_running_query_is_not_cut_off() {
        let mut script: Vec<QueryStatus> = (0..200)
            .map(|_| QueryStatus::new(QueryState::Running))
            .collect();
        script.push(QueryStatus::new(QueryState::Succeeded));
        let queries = Arc::new(ScriptedQueries::new("q-4", script));

        let outcome = coordinator(queries)
            .run_validation_query("t", "lake", OUT)
            .await
            .unwrap();

        // Well past the crawler's 90s bound.
        assert!(outcome.succeeded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_error_propagates() {
        let queries = Arc::new(
            ScriptedQueries::new("q-5", [QueryStatus::new(QueryState::Succeeded)])
                .with_submit_error(ServiceError::new("athena:StartQueryExecution", "bad bucket")),
        );

        let err = coordinator(queries.clone())
            .run_validation_query("t", "lake", OUT)
            .await
            .unwrap_err();

        assert_eq!(err.operation, "athena:StartQueryExecution");
        assert_eq!(queries.calls().len(), 1);
    }
}
