//! Configuration schema for rescache.
//!
//! Maps to the YAML file at `~/.rescache/config.yml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cache::{default_cache_dir, parse_ttl};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory. Defaults to the platform cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Default maximum entry age for fetches ("30m", "24h", "7d").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,

    /// Re-hash stored bytes before serving them.
    #[serde(skip_serializing_if = "is_false")]
    pub verify_checksums: bool,

    /// Network timeout for remote access, in seconds.
    #[serde(
        default = "default_timeout",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_age: None,
            verify_checksums: false,
            timeout_secs: default_timeout(),
        }
    }
}

impl CacheConfig {
    /// Cache directory to use, falling back to the default location.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Parsed default maximum age, if one is configured.
    pub fn max_age(&self) -> anyhow::Result<Option<Duration>> {
        self.max_age.as_deref().map(parse_ttl).transpose()
    }

    /// Network timeout as a std duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout() -> u64 {
    30
}

fn is_default_timeout(v: &u64) -> bool {
    *v == default_timeout()
}

fn is_false(v: &bool) -> bool {
    !v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_defaults() {
        let config: CacheConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.verify_checksums);
        assert_eq!(config.resolved_cache_dir(), default_cache_dir());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
cache_dir: /var/cache/rescache
max_age: 24h
verify_checksums: true
timeout_secs: 5
"#;
        let config: CacheConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.resolved_cache_dir(), PathBuf::from("/var/cache/rescache"));
        assert_eq!(config.max_age().unwrap(), Some(Duration::hours(24)));
        assert!(config.verify_checksums);
        assert_eq!(config.timeout(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn bad_max_age_is_an_error() {
        let config = CacheConfig {
            max_age: Some("whenever".to_string()),
            ..CacheConfig::default()
        };
        assert!(config.max_age().is_err());
    }

    #[test]
    fn defaults_are_not_serialized() {
        let yaml = serde_yaml::to_string(&CacheConfig::default()).unwrap();
        assert_eq!(yaml.trim(), "{}");
    }
}
