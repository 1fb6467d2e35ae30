//! Clear command implementation.

use crate::cache::ExternalResourceCache;
use crate::cli::args::ClearArgs;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The clear command implementation.
pub struct ClearCommand<'a> {
    cache: &'a ExternalResourceCache,
    args: ClearArgs,
}

impl<'a> ClearCommand<'a> {
    /// Create a new clear command.
    pub fn new(cache: &'a ExternalResourceCache, args: ClearArgs) -> Self {
        Self { cache, args }
    }
}

impl Command for ClearCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let count = self.cache.list()?.len();
        if count == 0 {
            ui.message("Cache is already empty");
            return Ok(CommandResult::success());
        }

        if !self.args.force
            && ui.is_interactive()
            && !ui.confirm(&format!("Clear {} cached entries?", count), false)?
        {
            ui.message("Cancelled");
            return Ok(CommandResult::success());
        }

        let cleared = self.cache.clear()?;
        ui.success(&format!("Cleared {} entries", cleared));
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResourceKey;
    use crate::ui::MockUI;
    use tempfile::TempDir;

    fn populated() -> (TempDir, ExternalResourceCache) {
        let temp = TempDir::new().unwrap();
        let cache = ExternalResourceCache::open(temp.path()).unwrap();
        cache
            .save_resource(&ResourceKey::new("a"), &b"abc"[..], None)
            .unwrap();
        cache.save_missing(&ResourceKey::new("b"), None).unwrap();
        (temp, cache)
    }

    #[test]
    fn empty_cache_is_noop() {
        let temp = TempDir::new().unwrap();
        let cache = ExternalResourceCache::open(temp.path()).unwrap();
        let mut ui = MockUI::new();

        ClearCommand::new(&cache, ClearArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(ui.has_message("already empty"));
    }

    #[test]
    fn non_interactive_clears_without_prompt() {
        let (_temp, cache) = populated();
        let mut ui = MockUI::new();

        ClearCommand::new(&cache, ClearArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(ui.confirmations().is_empty());
        assert_eq!(ui.successes(), ["Cleared 2 entries"]);
        assert!(cache.list().unwrap().is_empty());
    }

    #[test]
    fn declined_prompt_keeps_entries() {
        let (_temp, cache) = populated();
        let mut ui = MockUI::new();
        ui.set_interactive(true);
        ui.set_confirm_response(false);

        ClearCommand::new(&cache, ClearArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(ui.confirmations(), ["Clear 2 cached entries?"]);
        assert!(ui.has_message("Cancelled"));
        assert_eq!(cache.list().unwrap().len(), 2);
    }

    #[test]
    fn force_skips_prompt() {
        let (_temp, cache) = populated();
        let mut ui = MockUI::new();
        ui.set_interactive(true);

        ClearCommand::new(&cache, ClearArgs { force: true })
            .execute(&mut ui)
            .unwrap();

        assert!(ui.confirmations().is_empty());
        assert!(cache.list().unwrap().is_empty());
    }
}
