//! Maps a finished job to the crawler and table prefix for its output.

use std::fmt;

use postcrawl_config::CrawlersSection;
use tracing::{info, warn};

use crate::error::WorkflowFailure;
use crate::signal::CompletionSignal;

/// Content type produced by a job, recognised from a marker in its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Txt,
    Csv,
    Json,
}

impl ContentType {
    /// Match order. The first marker found in the job name wins.
    pub const PRIORITY: [ContentType; 3] = [ContentType::Txt, ContentType::Csv, ContentType::Json];

    /// Substring looked for in the job name.
    pub fn marker(self) -> &'static str {
        match self {
            ContentType::Txt => "txt",
            ContentType::Csv => "csv",
            ContentType::Json => "json",
        }
    }

    /// Catalog table prefix for this content type, e.g. `csv_`.
    pub fn table_prefix(self) -> &'static str {
        match self {
            ContentType::Txt => "txt_",
            ContentType::Csv => "csv_",
            ContentType::Json => "json_",
        }
    }

    /// Case-sensitive substring match, first match in [`Self::PRIORITY`] order.
    pub fn detect(job_name: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|content_type| job_name.contains(content_type.marker()))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Crawler name for each content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerNames {
    pub txt: String,
    pub csv: String,
    pub json: String,
}

impl CrawlerNames {
    /// Names from a `[crawlers]` section. Unset names become empty strings.
    pub fn from_section(section: &CrawlersSection) -> Self {
        Self {
            txt: section.txt.clone().unwrap_or_default(),
            csv: section.csv.clone().unwrap_or_default(),
            json: section.json.clone().unwrap_or_default(),
        }
    }

    pub fn for_type(&self, content_type: ContentType) -> &str {
        match content_type {
            ContentType::Txt => &self.txt,
            ContentType::Csv => &self.csv,
            ContentType::Json => &self.json,
        }
    }
}

/// Which crawler to run and which tables to look at afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub content_type: ContentType,
    pub crawler: String,
    pub table_prefix: &'static str,
}

/// Classify a completion signal.
///
/// Unknown job names are ordinary traffic: they come back as
/// [`WorkflowFailure::UnclassifiedSignal`] with a warning, not a panic.
pub fn classify(
    signal: &CompletionSignal,
    crawlers: &CrawlerNames,
) -> Result<Classification, WorkflowFailure> {
    let job_name = signal.job_name();
    let Some(content_type) = ContentType::detect(job_name) else {
        warn!(job_name, "No crawler found for job name");
        return Err(WorkflowFailure::UnclassifiedSignal {
            job_name: job_name.to_string(),
        });
    };

    let classification = Classification {
        content_type,
        crawler: crawlers.for_type(content_type).to_string(),
        table_prefix: content_type.table_prefix(),
    };
    info!(
        job_name,
        content_type = %content_type,
        crawler = %classification.crawler,
        table_prefix = classification.table_prefix,
        "Classified completion signal"
    );
    Ok(classification)
}
