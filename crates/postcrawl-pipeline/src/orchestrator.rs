//! The end-to-end completion workflow.
//!
//! ```text
//! START → CLASSIFIED → REFRESHED → RESOLVED → QUERIED → DONE(success|failure)
//! ```
//!
//! Each invocation handles one signal, strictly in sequence. Any failure ends
//! the invocation; nothing is retried here.

use std::fmt;

use tracing::{Instrument, error, info, info_span, warn};

use crate::catalog::CatalogResolver;
use crate::classifier::{Classification, classify};
use crate::crawler::{CrawlerCoordinator, RefreshReport};
use crate::error::WorkflowFailure;
use crate::query::{QueryCoordinator, QueryOutcome};
use crate::service::{CatalogEntry, Services};
use crate::settings::WorkflowSettings;
use crate::signal::CompletionSignal;

/// Last stage an invocation completed before it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStage {
    Start,
    Classified,
    Refreshed,
    Resolved,
    Queried,
}

impl WorkflowStage {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::Start => "START",
            WorkflowStage::Classified => "CLASSIFIED",
            WorkflowStage::Refreshed => "REFRESHED",
            WorkflowStage::Resolved => "RESOLVED",
            WorkflowStage::Queried => "QUERIED",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one invocation, with whatever each stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub job_name: String,
    pub stage: WorkflowStage,
    pub classification: Option<Classification>,
    pub refresh: Option<RefreshReport>,
    pub table: Option<CatalogEntry>,
    pub query: Option<QueryOutcome>,
    /// Set iff the invocation failed.
    pub failure: Option<WorkflowFailure>,
}

impl WorkflowOutcome {
    fn new(job_name: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            stage: WorkflowStage::Start,
            classification: None,
            refresh: None,
            table: None,
            query: None,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Failure reason for the caller, `None` on success.
    pub fn reason(&self) -> Option<String> {
        self.failure.as_ref().map(WorkflowFailure::reason)
    }

    fn advance(&mut self, stage: WorkflowStage) {
        info!(from = %self.stage, to = %stage, "Workflow stage complete");
        self.stage = stage;
    }
}

/// Composes classification, crawl, lookup and query into one workflow.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    settings: WorkflowSettings,
    crawler: CrawlerCoordinator,
    resolver: CatalogResolver,
    query: QueryCoordinator,
}

impl Orchestrator {
    pub fn new(services: Services, settings: WorkflowSettings) -> Self {
        Self {
            crawler: CrawlerCoordinator::new(services.refresh, settings.crawler_poll),
            resolver: CatalogResolver::new(services.catalog),
            query: QueryCoordinator::new(services.query, settings.query_poll_interval),
            settings,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Handle one completion signal to a final success/failure outcome.
    pub async fn handle(&self, signal: &CompletionSignal) -> WorkflowOutcome {
        let span = info_span!("completion", job_name = %signal.job_name());
        async {
            info!(event = %signal.payload(), "Received completion signal");

            let mut outcome = WorkflowOutcome::new(signal.job_name());
            if let Err(failure) = self.drive(signal, &mut outcome).await {
                outcome.failure = Some(failure);
            }

            match &outcome.failure {
                None => info!(stage = %outcome.stage, "Workflow succeeded"),
                Some(failure) => warn!(
                    stage = %outcome.stage,
                    kind = failure.kind(),
                    reason = %failure.reason(),
                    "Workflow failed"
                ),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        signal: &CompletionSignal,
        outcome: &mut WorkflowOutcome,
    ) -> Result<(), WorkflowFailure> {
        let classification = classify(signal, &self.settings.crawlers)?;
        let prefix = classification.table_prefix;
        let crawler = classification.crawler.clone();
        outcome.classification = Some(classification);
        outcome.advance(WorkflowStage::Classified);

        // A soft timeout inside the crawler wait does not stop the workflow.
        let refresh = self.crawler.run(&crawler).await?;
        outcome.refresh = Some(refresh);
        outcome.advance(WorkflowStage::Refreshed);

        let entry = self.resolver.resolve(&self.settings.database, prefix).await?;
        let table = entry.name.clone();
        outcome.table = Some(entry);
        outcome.advance(WorkflowStage::Resolved);

        let query = self
            .query
            .run_validation_query(
                &table,
                &self.settings.database,
                &self.settings.output_location,
            )
            .await?;
        outcome.query = Some(query.clone());
        outcome.advance(WorkflowStage::Queried);

        if !query.succeeded() {
            let reason = query.reason.unwrap_or_default();
            error!(
                query_run_id = %query.run_id,
                state = %query.state,
                reason = %reason,
                "Athena query did NOT succeed"
            );
            return Err(WorkflowFailure::QueryNotSucceeded {
                run_id: query.run_id,
                state: query.state,
                reason,
            });
        }

        info!(
            query_run_id = %query.run_id,
            output_location = %query.output_location,
            "Athena query SUCCEEDED"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CrawlerNames;
    use crate::mock::{ScriptedCatalog, ScriptedCrawler, ScriptedQueries, ScriptedServices};
    use crate::service::{QueryState, QueryStatus, RefreshState};

    fn settings() -> WorkflowSettings {
        WorkflowSettings::new(
            CrawlerNames {
                txt: "txt-crawler".into(),
                csv: "csv-crawler".into(),
                json: "json-crawler".into(),
            },
            "lake",
            "s3://athena-out/results/",
        )
    }

    #[test]
    fn test_stage_order() {
        assert!(WorkflowStage::Start < WorkflowStage::Classified);
        assert!(WorkflowStage::Resolved < WorkflowStage::Queried);
        assert_eq!(WorkflowStage::Refreshed.to_string(), "REFRESHED");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_recorded_on_catalog_failure() {
        let scripted = ScriptedServices::new(
            ScriptedCrawler::new([RefreshState::Ready]),
            ScriptedCatalog::new([]),
            ScriptedQueries::new("q", [QueryStatus::new(QueryState::Succeeded)]),
        );
        let orchestrator = Orchestrator::new(scripted.services(), settings());

        let outcome = orchestrator
            .handle(&CompletionSignal::new("daily-json-load", serde_json::Value::Null))
            .await;

        assert_eq!(outcome.stage, WorkflowStage::Refreshed);
        assert_eq!(outcome.refresh.as_ref().unwrap().crawler, "json-crawler");
        assert!(outcome.table.is_none());
        assert_eq!(outcome.reason().as_deref(), Some("NoMatchingEntry"));
    }
}
