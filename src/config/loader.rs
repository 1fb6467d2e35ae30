//! Configuration file discovery and loading.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. Config file (`--config`, or `~/.rescache/config.yml` when present)
//! 3. `RESCACHE_DIR` environment variable for the cache directory

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::CacheConfig;
use crate::error::{CacheError, Result};

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "RESCACHE_DIR";

/// User config location: `~/.rescache/config.yml`.
pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs::home_dir()?.join(".rescache").join("config.yml"))
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the user config is read if it
/// exists and defaults are used otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<CacheConfig> {
    let config = match explicit {
        Some(path) => load_config_file(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => load_config_file(&path)?,
            None => CacheConfig::default(),
        },
    };
    Ok(apply_env_overrides(config, |name| std::env::var(name).ok()))
}

/// Load a single config file.
pub fn load_config_file(path: &Path) -> Result<CacheConfig> {
    let content = fs::read_to_string(path).map_err(|e| CacheError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse YAML content into a validated [`CacheConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<CacheConfig> {
    let config: CacheConfig = if content.trim().is_empty() {
        CacheConfig::default()
    } else {
        serde_yaml::from_str(content).map_err(|e| CacheError::Config {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    config.max_age().map_err(|e| CacheError::Config {
        path: source_path.to_path_buf(),
        message: format!("invalid max_age: {}", e),
    })?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    mut config: CacheConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> CacheConfig {
    if let Some(dir) = lookup(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
        config.cache_dir = Some(PathBuf::from(dir));
    }
    config
}
