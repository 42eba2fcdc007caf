//! Amazon Athena adapter for the validation query.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_athena::types::{QueryExecutionContext, ResultConfiguration};
use postcrawl_pipeline::{QueryRequest, QueryService, QueryState, QueryStatus, ServiceError};

use crate::{SdkClients, service_error};

/// Query execution through `StartQueryExecution` / `GetQueryExecution`.
#[derive(Debug, Clone)]
pub struct AthenaQueries {
    clients: Arc<SdkClients>,
}

impl AthenaQueries {
    pub fn new(clients: Arc<SdkClients>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl QueryService for AthenaQueries {
    async fn submit(&self, request: &QueryRequest) -> Result<String, ServiceError> {
        let output = self
            .clients
            .athena()
            .await
            .start_query_execution()
            .query_string(&request.query)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&request.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| service_error("athena:StartQueryExecution", e))?;

        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::new("athena:StartQueryExecution", "no QueryExecutionId returned")
            })
    }

    async fn status(&self, run_id: &str) -> Result<QueryStatus, ServiceError> {
        let output = self
            .clients
            .athena()
            .await
            .get_query_execution()
            .query_execution_id(run_id)
            .send()
            .await
            .map_err(|e| service_error("athena:GetQueryExecution", e))?;

        let status = output.query_execution().and_then(|q| q.status());
        to_query_status(
            run_id,
            status.and_then(|s| s.state()).map(|s| s.as_str()),
            status.and_then(|s| s.state_change_reason()),
        )
    }
}

fn to_query_status(
    run_id: &str,
    state: Option<&str>,
    reason: Option<&str>,
) -> Result<QueryStatus, ServiceError> {
    let state = state.map(QueryState::parse).ok_or_else(|| {
        ServiceError::new(
            "athena:GetQueryExecution",
            format!("query {run_id} reported no state"),
        )
    })?;
    Ok(QueryStatus {
        state,
        reason: reason.map(str::to_string),
    })
}
