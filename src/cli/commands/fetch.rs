//! Fetch command implementation.
//!
//! The `rescache fetch <URL>` command resolves a URL through the cache and
//! prints the path of the cached file.

use crate::cache::{parse_ttl, ExternalResourceCache, FreshnessRequirement, ResourceKey};
use crate::cli::args::FetchArgs;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::fetch::{CachingFetcher, ExternalResourceAccessor, HttpAccessor};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::format_bytes;

/// Exit code when the remote reports the resource as absent.
pub const EXIT_NOT_FOUND: i32 = 2;

/// The fetch command implementation.
pub struct FetchCommand<'a> {
    cache: &'a ExternalResourceCache,
    config: &'a CacheConfig,
    args: FetchArgs,
}

impl<'a> FetchCommand<'a> {
    /// Create a new fetch command.
    pub fn new(cache: &'a ExternalResourceCache, config: &'a CacheConfig, args: FetchArgs) -> Self {
        Self {
            cache,
            config,
            args,
        }
    }

    /// Freshness requirement from the flags, falling back to the config.
    pub fn requirement(&self) -> Result<FreshnessRequirement> {
        let max_age = match &self.args.max_age {
            Some(ttl) => Some(parse_ttl(ttl)?),
            None => self.config.max_age()?,
        };
        let requirement = FreshnessRequirement {
            max_age,
            ..FreshnessRequirement::default()
        };
        Ok(if self.args.revalidate {
            requirement.revalidate()
        } else {
            requirement
        })
    }

    /// Run the fetch with a specific transport.
    pub fn run_with(
        &self,
        accessor: impl ExternalResourceAccessor,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let requirement = self.requirement()?;
        let key = ResourceKey::new(self.args.url.as_str());
        let fetcher = CachingFetcher::new(self.cache, accessor);

        let mut spinner = ui.start_spinner(&format!("Fetching {}", self.args.url));
        let entry = match fetcher.get(&key, &self.args.url, &requirement) {
            Ok(entry) => entry,
            Err(e) => {
                spinner.finish_error(&format!("Failed to fetch {}", self.args.url));
                return Err(e);
            }
        };

        match entry.cached_file() {
            Some(path) => {
                spinner.finish_success(&format!(
                    "{} ({})",
                    self.args.url,
                    format_bytes(entry.content_length())
                ));
                ui.message(&path.display().to_string());
                Ok(CommandResult::success())
            }
            None => {
                spinner.finish_error(&format!("{} not found", self.args.url));
                ui.error(&format!("Resource not found: {}", self.args.url));
                Ok(CommandResult::failure(EXIT_NOT_FOUND))
            }
        }
    }
}

impl Command for FetchCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let accessor = HttpAccessor::with_timeout(self.config.timeout())?;
        self.run_with(accessor, ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ExternalResourceMetaData, RemoteCheck};
    use crate::fetch::RemoteResource;
    use chrono::Duration;
    use std::io::Cursor;
    use tempfile::TempDir;

    use crate::ui::MockUI;

    /// Remote holding a single resource, or nothing.
    struct StaticRemote(Option<&'static [u8]>);

    impl ExternalResourceAccessor for StaticRemote {
        fn fetch(&self, location: &str) -> Result<Option<RemoteResource>> {
            Ok(self.0.map(|body| RemoteResource {
                metadata: ExternalResourceMetaData::new(location),
                body: Box::new(Cursor::new(body)),
            }))
        }

        fn probe(&self, location: &str) -> Result<Option<ExternalResourceMetaData>> {
            Ok(self.0.map(|_| ExternalResourceMetaData::new(location)))
        }
    }

    fn fetch_args(url: &str) -> FetchArgs {
        FetchArgs {
            url: url.to_string(),
            max_age: None,
            revalidate: false,
        }
    }

    #[test]
    fn flags_override_config_max_age() {
        let config = CacheConfig {
            max_age: Some("1d".to_string()),
            ..CacheConfig::default()
        };
        let temp = TempDir::new().unwrap();
        let cache = ExternalResourceCache::open(temp.path()).unwrap();

        let from_config = FetchCommand::new(&cache, &config, fetch_args("u"));
        assert_eq!(from_config.requirement().unwrap().max_age, Some(Duration::days(1)));

        let mut args = fetch_args("u");
        args.max_age = Some("10m".to_string());
        args.revalidate = true;
        let requirement = FetchCommand::new(&cache, &config, args).requirement().unwrap();
        assert_eq!(requirement.max_age, Some(Duration::minutes(10)));
        assert_eq!(requirement.remote, RemoteCheck::Required);
    }

    #[test]
    fn bad_ttl_is_an_error() {
        let config = CacheConfig::default();
        let temp = TempDir::new().unwrap();
        let cache = ExternalResourceCache::open(temp.path()).unwrap();
        let mut args = fetch_args("u");
        args.max_age = Some("later".to_string());

        assert!(FetchCommand::new(&cache, &config, args).requirement().is_err());
    }

    #[test]
    fn prints_cached_path() {
        let config = CacheConfig::default();
        let temp = TempDir::new().unwrap();
        let cache = ExternalResourceCache::open(temp.path()).unwrap();
        let mut ui = MockUI::new();

        let result = FetchCommand::new(&cache, &config, fetch_args("https://repo/a.jar"))
            .run_with(StaticRemote(Some(b"abc")), &mut ui)
            .unwrap();

        assert!(result.success);
        let path = std::path::PathBuf::from(&ui.messages()[0]);
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
        assert_eq!(ui.spinners(), ["Fetching https://repo/a.jar"]);
    }

    #[test]
    fn absent_resource_exits_with_not_found() {
        let config = CacheConfig::default();
        let temp = TempDir::new().unwrap();
        let cache = ExternalResourceCache::open(temp.path()).unwrap();
        let mut ui = MockUI::new();

        let result = FetchCommand::new(&cache, &config, fetch_args("https://repo/gone.jar"))
            .run_with(StaticRemote(None), &mut ui)
            .unwrap();

        assert_eq!(result.exit_code, EXIT_NOT_FOUND);
        assert!(ui.errors()[0].contains("gone.jar"));
    }
}
