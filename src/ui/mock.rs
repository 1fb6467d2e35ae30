//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use rescache::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.message("3 cached entries");
//! ui.success("Done");
//!
//! assert!(ui.messages().contains(&"3 cached entries".to_string()));
//! assert!(ui.successes().contains(&"Done".to_string()));
//! ```

use std::sync::{Arc, Mutex};

use crate::error::Result;

use super::{SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    interactive: bool,
    confirm_response: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    confirmations: Vec<String>,
    spinners: Vec<String>,
    spinner_results: Arc<Mutex<Vec<String>>>,
}

impl MockUI {
    /// Create a non-interactive MockUI.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Set the answer given to every confirmation.
    pub fn set_confirm_response(&mut self, response: bool) {
        self.confirm_response = response;
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all questions asked.
    pub fn confirmations(&self) -> &[String] {
        &self.confirmations
    }

    /// Get all spinner messages that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Get the final messages spinners finished with.
    pub fn spinner_results(&self) -> Vec<String> {
        self.spinner_results
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Whether any message contains `needle`.
    pub fn has_message(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

impl UserInterface for MockUI {
    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn confirm(&mut self, question: &str, _default: bool) -> Result<bool> {
        self.confirmations.push(question.to_string());
        Ok(self.confirm_response)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            results: Arc::clone(&self.spinner_results),
        })
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Spinner that records how it finished.
#[derive(Debug)]
pub struct MockSpinner {
    results: Arc<Mutex<Vec<String>>>,
}

impl MockSpinner {
    fn record(&self, msg: String) {
        if let Ok(mut results) = self.results.lock() {
            results.push(msg);
        }
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        self.record(format!("success: {}", msg));
    }

    fn finish_error(&mut self, msg: &str) {
        self.record(format!("error: {}", msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_output() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.warning("careful");
        ui.error("broken");

        assert_eq!(ui.messages(), ["hello"]);
        assert_eq!(ui.warnings(), ["careful"]);
        assert_eq!(ui.errors(), ["broken"]);
    }

    #[test]
    fn confirm_uses_configured_response() {
        let mut ui = MockUI::new();
        assert!(!ui.confirm("Clear?", true).unwrap());

        ui.set_confirm_response(true);
        assert!(ui.confirm("Clear?", false).unwrap());
        assert_eq!(ui.confirmations().len(), 2);
    }

    #[test]
    fn spinners_record_results() {
        let mut ui = MockUI::new();
        let mut spinner = ui.start_spinner("Fetching");
        spinner.finish_success("Fetched");

        assert_eq!(ui.spinners(), ["Fetching"]);
        assert_eq!(ui.spinner_results(), vec!["success: Fetched".to_string()]);
    }
}
