//! Configuration system for the postcrawl completion handler.
//!
//! Provides TOML-based configuration with:
//! - Crawler names per content type (`[crawlers]`)
//! - Catalog database and query result location (`[catalog]`, `[query]`)
//! - Config file layering (user config dir + project-local + explicit file)
//! - Environment overrides using the deployment's variable names
//!   (`TXT_CRAWLER`, `GLUE_DATABASE`, `ATHENA_OUTPUT_BUCKET`, ...)

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options,
    xdg_config_dir, xdg_config_path,
};
pub use env::{apply_env_overrides, apply_overrides_from};
pub use error::{ConfigError, Result};
pub use types::*;
