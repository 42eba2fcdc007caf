//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/postcrawl/config.toml` (user config)
//! 2. `./postcrawl.toml` (project-local)
//! 3. An explicit `--config` file
//! 4. Environment variables (see [`crate::env`])

use std::path::{Path, PathBuf};

use crate::{ConfigError, PostcrawlConfig, Result, apply_env_overrides};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "postcrawl.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "postcrawl";

/// Environment variable to override the config directory.
///
/// When set, this takes precedence over the platform default.
/// Useful for testing and for running several deployments side by side.
const CONFIG_DIR_ENV: &str = "POSTCRAWL_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: PostcrawlConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Environment variables that overrode file values.
    pub env_overrides: Vec<&'static str>,
    /// Warnings generated during loading (e.g., unparseable optional layers).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all layers, then applying
/// environment overrides.
///
/// `explicit` is a file named on the command line; unlike the discovered
/// layers it must exist and parse.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let mut loaded = load_config_with_options(None, None, explicit)?;
    loaded.env_overrides = apply_env_overrides(&mut loaded.config);
    Ok(loaded)
}

/// Load file layers with explicit control over the directories searched.
///
/// No environment overrides are applied here.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = PostcrawlConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // 1. User config: explicit dir, then env var, then platform default
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    // 3. Explicit file
    if let Some(path) = explicit {
        config.merge(load_config_file(path)?);
        sources.push(ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        });
    }

    Ok(LoadedConfig {
        config,
        sources,
        env_overrides: Vec::new(),
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<PostcrawlConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    PostcrawlConfig::from_toml(&contents)
}

/// Get the user config file path for postcrawl.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the user config directory for postcrawl.
///
/// Checks `POSTCRAWL_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a discovered config file and merge it into the existing config.
///
/// A missing or broken layer is skipped; breakage is reported as a warning.
fn load_layer(config: &mut PostcrawlConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
