//! Configuration loading and parsing.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//!
//! # Example
//!
//! ```
//! use rescache::config::parse_config;
//! use std::path::Path;
//!
//! let config = parse_config("max_age: 24h\n", Path::new("config.yml")).unwrap();
//! assert_eq!(config.max_age().unwrap(), Some(chrono::Duration::hours(24)));
//! ```

pub mod loader;
pub mod schema;

pub use loader::{
    apply_env_overrides, default_config_path, load_config, load_config_file, parse_config,
    CACHE_DIR_ENV,
};
pub use schema::CacheConfig;
