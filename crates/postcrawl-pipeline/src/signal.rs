//! Completion signals from the upstream job scheduler.
//!
//! The event envelope looks like:
//!
//! ```json
//! { "source": "aws.glue", "detail": { "jobName": "ingest-csv-001", "state": "SUCCEEDED" } }
//! ```
//!
//! Only `detail.jobName` drives the workflow; the rest is carried as an opaque
//! payload for logging.

use serde_json::Value;

use crate::error::Result;

/// Job name used when the event does not carry one.
pub const UNKNOWN_JOB: &str = "unknown";

/// A job-finished event, consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSignal {
    job_name: String,
    payload: Value,
}

impl CompletionSignal {
    /// Build a signal directly from a job name and payload.
    pub fn new(job_name: impl Into<String>, payload: Value) -> Self {
        Self {
            job_name: job_name.into(),
            payload,
        }
    }

    /// Build a signal from a decoded event.
    ///
    /// A missing or non-string `detail.jobName` becomes [`UNKNOWN_JOB`]; the
    /// classifier then rejects it like any other unrecognised job.
    pub fn from_event(event: Value) -> Self {
        let job_name = event
            .get("detail")
            .and_then(|detail| detail.get("jobName"))
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_JOB)
            .to_string();
        Self {
            job_name,
            payload: event,
        }
    }

    /// Parse a signal from the raw JSON event text.
    pub fn from_json(text: &str) -> Result<Self> {
        let event: Value = serde_json::from_str(text)?;
        Ok(Self::from_event(event))
    }

    /// Name of the job that finished.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// The full event as received.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_event_reads_job_name() {
        let signal = CompletionSignal::from_event(json!({
            "source": "aws.glue",
            "detail": {"jobName": "ingest-csv-001", "state": "SUCCEEDED"}
        }));
        assert_eq!(signal.job_name(), "ingest-csv-001");
        assert_eq!(signal.payload()["source"], "aws.glue");
    }

    #[test]
    fn test_missing_detail_is_unknown() {
        let signal = CompletionSignal::from_event(json!({"source": "aws.glue"}));
        assert_eq!(signal.job_name(), UNKNOWN_JOB);
    }

    #[test]
    fn test_non_string_job_name_is_unknown() {
        let signal = CompletionSignal::from_event(json!({"detail": {"jobName": 42}}));
        assert_eq!(signal.job_name(), UNKNOWN_JOB);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(CompletionSignal::from_json("{not json").is_err());
        let signal = CompletionSignal::from_json(r#"{"detail":{"jobName":"a-json-job"}}"#).unwrap();
        assert_eq!(signal.job_name(), "a-json-job");
    }
}
