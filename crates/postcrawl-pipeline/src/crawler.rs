//! Drives a crawler run to a terminal state, with a soft deadline.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ServiceError;
use crate::service::{RefreshState, RefreshTaskService};
use crate::waiter::{PollSchedule, TaskWaiter};

/// What happened to the crawler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub crawler: String,
    /// Last observed state; not terminal if `timed_out`.
    pub state: RefreshState,
    pub timed_out: bool,
    pub samples: u64,
}

/// Starts a crawler and waits for it.
#[derive(Debug, Clone)]
pub struct CrawlerCoordinator {
    service: Arc<dyn RefreshTaskService>,
    waiter: TaskWaiter,
}

impl CrawlerCoordinator {
    pub fn new(service: Arc<dyn RefreshTaskService>, schedule: PollSchedule) -> Self {
        Self {
            service,
            waiter: TaskWaiter::new(schedule),
        }
    }

    /// Start `crawler` and wait until it is `READY` or `STOPPING`.
    ///
    /// Running out of time is logged and reported, never returned as an
    /// error: the workflow carries on with whatever the catalog holds.
    pub async fn run(&self, crawler: &str) -> Result<RefreshReport, ServiceError> {
        info!(crawler, "Starting crawler");
        self.service.start(crawler).await?;

        let result = self
            .waiter
            .wait(|| self.service.state(crawler), RefreshState::is_terminal)
            .await?;

        if result.timed_out {
            warn!(
                crawler,
                state = %result.state,
                waited_secs = result.waited.as_secs(),
                "Crawler did not reach READY in time, continuing anyway"
            );
        } else {
            info!(crawler, state = %result.state, "Crawler finished");
        }

        Ok(RefreshReport {
            crawler: crawler.to_string(),
            state: result.state,
            timed_out: result.timed_out,
            samples: result.samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::mock::{ScriptedCrawler, ServiceCall};

    fn schedule() -> PollSchedule {
        PollSchedule::bounded(Duration::from_secs(5), Duration::from_secs(90))
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ready_immediately() {
        let crawler = Arc::new(ScriptedCrawler::new([RefreshState::Ready]));
        let coordinator = CrawlerCoordinator::new(crawler.clone(), schedule());

        let report = coordinator.run("csv-crawler").await.unwrap();

        assert_eq!(report.state, RefreshState::Ready);
        assert!(!report.timed_out);
        assert_eq!(report.samples, 1);
        assert_eq!(
            crawler.calls(),
            vec![
                ServiceCall::StartCrawler("csv-crawler".into()),
                ServiceCall::CrawlerState("csv-crawler".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stopping_is_terminal() {
        let crawler = Arc::new(ScriptedCrawler::new([
            RefreshState::Starting,
            RefreshState::Running,
            RefreshState::Stopping,
        ]));
        let coordinator = CrawlerCoordinator::new(crawler, schedule());

        let report = coordinator.run("c").await.unwrap();
        assert_eq!(report.state, RefreshState::Stopping);
        assert_eq!(report.samples, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_soft() {
        let crawler = Arc::new(ScriptedCrawler::new([RefreshState::Running]));
        let coordinator = CrawlerCoordinator::new(crawler, schedule());

        let report = coordinator.run("slow-crawler").await.unwrap();

        assert!(report.timed_out);
        assert_eq!(report.state, RefreshState::Running);
        assert_eq!(report.samples, 18);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_failure_propagates() {
        let crawler = Arc::new(
            ScriptedCrawler::new([RefreshState::Ready])
                .with_start_error(ServiceError::new("glue:StartCrawler", "access denied")),
        );
        let coordinator = CrawlerCoordinator::new(crawler.clone(), schedule());

        let err = coordinator.run("c").await.unwrap_err();
        assert_eq!(err.operation, "glue:StartCrawler");
        // No polling after a failed start.
        assert_eq!(crawler.calls().len(), 1);
    }
}
