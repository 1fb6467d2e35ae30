//! Interactive terminal UI.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use std::io::Write;

use crate::error::{CacheError, Result};

use super::{should_use_colors, ProgressSpinner, SpinnerHandle, Theme, UserInterface};

/// Terminal UI writing results to stdout and errors to stderr.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: Theme,
    interactive: bool,
}

impl TerminalUI {
    /// Create a terminal UI.
    ///
    /// Prompts and spinners are only used when `interactive` is set and
    /// stdout is a terminal.
    pub fn new(interactive: bool) -> Self {
        let out = Term::stdout();
        let theme = if should_use_colors() {
            Theme::new()
        } else {
            Theme::plain()
        };
        let interactive = interactive && out.is_term();

        Self {
            out,
            err: Term::stderr(),
            theme,
            interactive,
        }
    }
}

impl UserInterface for TerminalUI {
    fn message(&mut self, msg: &str) {
        writeln!(self.out, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let theme = ColorfulTheme {
            prompt_prefix: style(String::new()),
            ..ColorfulTheme::default()
        };
        Confirm::with_theme(&theme)
            .with_prompt(question)
            .default(default)
            .interact_on(&self.out)
            .map_err(|e| CacheError::Other(anyhow::Error::new(e).context("reading confirmation")))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.interactive {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}
