//! List command implementation.
//!
//! The `rescache list` command lists cached entries, newest first.

use chrono::Utc;

use crate::cache::ExternalResourceCache;
use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{entry_summary, show_entry_details, EntryView};

/// The list command implementation.
pub struct ListCommand<'a> {
    cache: &'a ExternalResourceCache,
    args: ListArgs,
}

impl<'a> ListCommand<'a> {
    /// Create a new list command.
    pub fn new(cache: &'a ExternalResourceCache, args: ListArgs) -> Self {
        Self { cache, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ListArgs {
        &self.args
    }
}

impl Command for ListCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let entries = self.cache.list()?;

        if self.args.json {
            let views: Vec<EntryView> = entries.iter().map(EntryView::from).collect();
            ui.message(&serde_json::to_string_pretty(&views)?);
            return Ok(CommandResult::success());
        }

        if entries.is_empty() {
            ui.message("Cache is empty");
            return Ok(CommandResult::success());
        }

        ui.message(&format!("{} cached entries:\n", entries.len()));
        let now = Utc::now();
        for entry in &entries {
            if self.args.verbose {
                show_entry_details(ui, entry);
                ui.message("");
            } else {
                ui.message(&format!("  {}", entry_summary(entry, now)));
            }
        }

        Ok(CommandResult::success())
    }
}
