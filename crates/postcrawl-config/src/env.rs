//! Environment overrides.
//!
//! The deployed handler is configured through environment variables, so these
//! are applied on top of any file layers.

use crate::{CatalogSection, CrawlersSection, PostcrawlConfig, QuerySection};

/// Crawler for `txt` jobs.
pub const TXT_CRAWLER_ENV: &str = "TXT_CRAWLER";
/// Crawler for `csv` jobs.
pub const CSV_CRAWLER_ENV: &str = "CSV_CRAWLER";
/// Crawler for `json` jobs.
pub const JSON_CRAWLER_ENV: &str = "JSON_CRAWLER";
/// Glue database holding the crawled tables.
pub const GLUE_DATABASE_ENV: &str = "GLUE_DATABASE";
/// Bucket for Athena query results.
pub const ATHENA_OUTPUT_BUCKET_ENV: &str = "ATHENA_OUTPUT_BUCKET";

/// Apply overrides from the process environment.
///
/// Returns the names of the variables that were applied.
pub fn apply_env_overrides(config: &mut PostcrawlConfig) -> Vec<&'static str> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup. Empty values are ignored.
pub fn apply_overrides_from<F>(config: &mut PostcrawlConfig, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut applied = Vec::new();

    if let Some(value) = get(TXT_CRAWLER_ENV) {
        config.crawlers.get_or_insert_with(CrawlersSection::default).txt = Some(value);
        applied.push(TXT_CRAWLER_ENV);
    }

    if let Some(value) = get(CSV_CRAWLER_ENV) {
        config.crawlers.get_or_insert_with(CrawlersSection::default).csv = Some(value);
        applied.push(CSV_CRAWLER_ENV);
    }

    if let Some(value) = get(JSON_CRAWLER_ENV) {
        config.crawlers.get_or_insert_with(CrawlersSection::default).json = Some(value);
        applied.push(JSON_CRAWLER_ENV);
    }

    if let Some(value) = get(GLUE_DATABASE_ENV) {
        config
            .catalog
            .get_or_insert_with(CatalogSection::default)
            .database = Some(value);
        applied.push(GLUE_DATABASE_ENV);
    }

    if let Some(value) = get(ATHENA_OUTPUT_BUCKET_ENV) {
        config
            .query
            .get_or_insert_with(QuerySection::default)
            .output_bucket = Some(value);
        applied.push(ATHENA_OUTPUT_BUCKET_ENV);
    }

    applied
}
