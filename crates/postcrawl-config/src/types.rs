//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [crawlers]               # crawler per content type + wait bound
//! [catalog]                # Glue database holding the crawled tables
//! [query]                  # Athena result location + poll interval
//! [aws]                    # region / profile overrides
//! [logging]                # console + file log output
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostcrawlConfig {
    /// Crawler names and the crawler wait bound.
    pub crawlers: Option<CrawlersSection>,

    /// Catalog database settings.
    pub catalog: Option<CatalogSection>,

    /// Validation query settings.
    pub query: Option<QuerySection>,

    /// AWS SDK overrides.
    pub aws: Option<AwsSection>,

    /// Log output settings.
    pub logging: Option<LoggingSection>,
}

impl PostcrawlConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced wholesale, not merged field by field.
    pub fn merge(&mut self, other: PostcrawlConfig) {
        if other.crawlers.is_some() {
            self.crawlers = other.crawlers;
        }

        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }

        if other.query.is_some() {
            self.query = other.query;
        }

        if other.aws.is_some() {
            self.aws = other.aws;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Crawler section, or defaults if absent.
    pub fn crawlers(&self) -> CrawlersSection {
        self.crawlers.clone().unwrap_or_default()
    }

    /// Catalog section, or defaults if absent.
    pub fn catalog(&self) -> CatalogSection {
        self.catalog.clone().unwrap_or_default()
    }

    /// Query section, or defaults if absent.
    pub fn query(&self) -> QuerySection {
        self.query.clone().unwrap_or_default()
    }

    /// AWS section, or defaults if absent.
    pub fn aws(&self) -> AwsSection {
        self.aws.clone().unwrap_or_default()
    }

    /// Logging section, or defaults if absent.
    pub fn logging(&self) -> LoggingSection {
        self.logging.clone().unwrap_or_default()
    }

    /// Check that every value the completion workflow needs is present.
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        let crawlers = self.crawlers();
        require(&crawlers.txt, "txt", "crawlers", "TXT_CRAWLER")?;
        require(&crawlers.csv, "csv", "crawlers", "CSV_CRAWLER")?;
        require(&crawlers.json, "json", "crawlers", "JSON_CRAWLER")?;
        if crawlers.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "crawlers.poll_interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        require(&self.catalog().database, "database", "catalog", "GLUE_DATABASE")?;

        let query = self.query();
        require(
            &query.output_bucket,
            "output_bucket",
            "query",
            "ATHENA_OUTPUT_BUCKET",
        )?;
        if query.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "query.poll_interval_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

fn require(value: &Option<String>, field: &str, section: &str, env_var: &str) -> Result<()> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingField {
            field: field.to_string(),
            section: section.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Crawlers
// ─────────────────────────────────────────────────────────────────────────────

/// Crawler configuration.
///
/// ```toml
/// [crawlers]
/// txt = "raw-txt-crawler"
/// csv = "raw-csv-crawler"
/// json = "raw-json-crawler"
/// poll_interval_secs = 5
/// max_wait_secs = 90
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlersSection {
    /// Crawler refreshing the `txt_` tables.
    pub txt: Option<String>,
    /// Crawler refreshing the `csv_` tables.
    pub csv: Option<String>,
    /// Crawler refreshing the `json_` tables.
    pub json: Option<String>,
    /// Seconds between crawler state checks.
    pub poll_interval_secs: u64,
    /// Soft bound on the crawler wait; the workflow continues after it.
    pub max_wait_secs: u64,
}

impl Default for CrawlersSection {
    fn default() -> Self {
        Self {
            txt: None,
            csv: None,
            json: None,
            poll_interval_secs: 5,
            max_wait_secs: 90,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    /// Glue database the crawlers write tables into.
    pub database: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────────────────────────────────

/// Validation query configuration.
///
/// ```toml
/// [query]
/// output_bucket = "my-athena-results"
/// results_prefix = "results/"
/// poll_interval_secs = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    /// Bucket receiving Athena query results.
    pub output_bucket: Option<String>,
    /// Key prefix under the bucket.
    pub results_prefix: String,
    /// Seconds between query state checks. The query wait has no bound.
    pub poll_interval_secs: u64,
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            output_bucket: None,
            results_prefix: "results/".to_string(),
            poll_interval_secs: 5,
        }
    }
}

impl QuerySection {
    /// Full S3 location for query results, e.g. `s3://bucket/results/`.
    pub fn output_location(&self) -> Option<String> {
        let bucket = self.output_bucket.as_deref()?.trim_end_matches('/');
        let prefix = self.results_prefix.trim_matches('/');
        if prefix.is_empty() {
            Some(format!("s3://{bucket}/"))
        } else {
            Some(format!("s3://{bucket}/{prefix}/"))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AWS
// ─────────────────────────────────────────────────────────────────────────────

/// AWS SDK overrides. Unset values fall back to the SDK's default chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSection {
    pub region: Option<String>,
    pub profile: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Log output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Emit console logs as JSON lines instead of human-readable text.
    pub json: bool,
    /// Also write a daily rolling JSON log file.
    pub file: bool,
    /// Directory for the log file. Defaults to `<config dir>/logs`.
    pub dir: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
