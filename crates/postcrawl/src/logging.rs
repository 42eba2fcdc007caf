//! Tracing setup: console output plus an optional rolling JSON file.

use std::path::PathBuf;

use postcrawl_config::LoggingSection;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const VERBOSE_FILTER: &str =
    "postcrawl=debug,postcrawl_pipeline=debug,postcrawl_aws=debug,postcrawl_config=debug,info";
const DEFAULT_FILTER: &str = "postcrawl=info,postcrawl_pipeline=info,postcrawl_aws=info,warn";
const FILE_FILTER: &str =
    "postcrawl=trace,postcrawl_pipeline=trace,postcrawl_aws=trace,postcrawl_config=trace,info";

/// Install the global subscriber.
///
/// Console logs go to stderr so stdout stays clean for command output. The
/// returned guard flushes the file writer and must live until exit.
pub fn init(verbose: bool, logging: &LoggingSection) -> Option<WorkerGuard> {
    let filter = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };

    let console: Box<dyn Layer<Registry> + Send + Sync> = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::new(filter))
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::new(filter))
            .boxed()
    };

    let (file, guard) = if logging.file {
        let log_dir = logging
            .dir
            .clone()
            .or_else(|| postcrawl_config::xdg_config_dir().map(|d| d.join("logs")))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "postcrawl.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(EnvFilter::new(FILE_FILTER));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}
