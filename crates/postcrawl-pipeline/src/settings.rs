//! Per-invocation workflow settings, resolved from configuration.

use std::time::Duration;

use postcrawl_config::{ConfigError, PostcrawlConfig};

use crate::classifier::CrawlerNames;
use crate::error::Result;
use crate::waiter::PollSchedule;

/// Default time between state checks for both waits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default soft bound on the crawler wait.
pub const DEFAULT_CRAWLER_MAX_WAIT: Duration = Duration::from_secs(90);

/// Everything the orchestrator needs besides its service handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub crawlers: CrawlerNames,
    /// Catalog database holding the crawled tables.
    pub database: String,
    /// Query result location, e.g. `s3://bucket/results/`.
    pub output_location: String,
    /// Crawler wait: bounded, soft.
    pub crawler_poll: PollSchedule,
    /// Query wait interval. The query wait itself is unbounded.
    pub query_poll_interval: Duration,
}

impl WorkflowSettings {
    /// Settings with the default poll timings.
    pub fn new(
        crawlers: CrawlerNames,
        database: impl Into<String>,
        output_location: impl Into<String>,
    ) -> Self {
        Self {
            crawlers,
            database: database.into(),
            output_location: output_location.into(),
            crawler_poll: PollSchedule::bounded(DEFAULT_POLL_INTERVAL, DEFAULT_CRAWLER_MAX_WAIT),
            query_poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Build settings from a loaded configuration.
    ///
    /// Fails if a required value is missing, before any service is called.
    pub fn from_config(config: &PostcrawlConfig) -> Result<Self> {
        config.validate()?;

        let crawlers = config.crawlers();
        let query = config.query();
        let output_location = query
            .output_location()
            .ok_or_else(|| ConfigError::MissingField {
                field: "output_bucket".to_string(),
                section: "query".to_string(),
                env_var: postcrawl_config::env::ATHENA_OUTPUT_BUCKET_ENV.to_string(),
            })?;

        Ok(Self {
            crawlers: CrawlerNames::from_section(&crawlers),
            database: config.catalog().database.unwrap_or_default(),
            output_location,
            crawler_poll: PollSchedule::bounded(
                Duration::from_secs(crawlers.poll_interval_secs),
                Duration::from_secs(crawlers.max_wait_secs),
            ),
            query_poll_interval: Duration::from_secs(query.poll_interval_secs),
        })
    }
}
