//! Stats command implementation.

use crate::cache::ExternalResourceCache;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::format_bytes;

/// The stats command implementation.
pub struct StatsCommand<'a> {
    cache: &'a ExternalResourceCache,
}

impl<'a> StatsCommand<'a> {
    /// Create a new stats command.
    pub fn new(cache: &'a ExternalResourceCache) -> Self {
        Self { cache }
    }
}

impl Command for StatsCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let entries = self.cache.list()?;
        let missing = entries.iter().filter(|e| e.is_missing()).count();
        let total: u64 = entries.iter().map(|e| e.content_length()).sum();

        ui.message("Cache Statistics:\n");
        ui.message(&format!("  Total entries: {}", entries.len()));
        ui.message(&format!("  Stored: {}", entries.len() - missing));
        ui.message(&format!("  Missing: {}", missing));
        ui.message(&format!("  Total size: {}", format_bytes(total)));
        ui.message(&format!("  Location: {}", self.cache.root().display()));

        Ok(CommandResult::success())
    }
}
