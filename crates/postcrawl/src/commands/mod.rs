//! CLI command handlers.

pub mod classify;
pub mod config;
pub mod handle;

use postcrawl_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration, with environment overrides applied.
    pub config: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}
