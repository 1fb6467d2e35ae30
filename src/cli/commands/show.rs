//! Show command implementation.
//!
//! The `rescache show <KEY>` command prints one entry's record.

use crate::cache::{ExternalResourceCache, ResourceKey};
use crate::cli::args::ShowArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};
use super::display::{show_entry_details, EntryView};

/// The show command implementation.
pub struct ShowCommand<'a> {
    cache: &'a ExternalResourceCache,
    args: ShowArgs,
}

impl<'a> ShowCommand<'a> {
    /// Create a new show command.
    pub fn new(cache: &'a ExternalResourceCache, args: ShowArgs) -> Self {
        Self { cache, args }
    }
}

impl Command for ShowCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let key = ResourceKey::new(self.args.key.as_str());
        let Some(entry) = self.cache.lookup(&key)? else {
            ui.error(&format!("No cached entry for '{}'", key));
            return Ok(CommandResult::failure(1));
        };

        if self.args.json {
            ui.message(&serde_json::to_string_pretty(&EntryView::from(&entry))?);
        } else {
            show_entry_details(ui, &entry);
        }
        Ok(CommandResult::success())
    }
}
