//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cache::ExternalResourceCache;
use crate::cli::args::Commands;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::ui::UserInterface;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output and prompts
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    config: CacheConfig,
}

impl CommandDispatcher {
    /// Create a dispatcher for the given resolved configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Get the configuration commands run with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, command: &Commands, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let cache = ExternalResourceCache::from_config(&self.config)?;
        match command {
            Commands::List(args) => super::list::ListCommand::new(&cache, args.clone()).execute(ui),
            Commands::Show(args) => super::show::ShowCommand::new(&cache, args.clone()).execute(ui),
            Commands::Fetch(args) => {
                super::fetch::FetchCommand::new(&cache, &self.config, args.clone()).execute(ui)
            }
            Commands::Invalidate(args) => {
                super::invalidate::InvalidateCommand::new(&cache, args.clone()).execute(ui)
            }
            Commands::Clear(args) => super::clear::ClearCommand::new(&cache, args.clone()).execute(ui),
            Commands::Stats => super::stats::StatsCommand::new(&cache).execute(ui),
        }
    }
}
