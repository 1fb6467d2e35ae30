//! Invalidate command implementation.

use crate::cache::{ExternalResourceCache, ResourceKey};
use crate::cli::args::InvalidateArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The invalidate command implementation.
pub struct InvalidateCommand<'a> {
    cache: &'a ExternalResourceCache,
    args: InvalidateArgs,
}

impl<'a> InvalidateCommand<'a> {
    /// Create a new invalidate command.
    pub fn new(cache: &'a ExternalResourceCache, args: InvalidateArgs) -> Self {
        Self { cache, args }
    }
}

impl Command for InvalidateCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let key = ResourceKey::new(self.args.key.as_str());
        if self.cache.invalidate(&key)? {
            ui.success(&format!("Invalidated {}", key));
        } else {
            ui.message(&format!("No cached entry for '{}'", key));
        }
        Ok(CommandResult::success())
    }
}
