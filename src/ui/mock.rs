//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.

use crate::steps::StepResult;

use super::{OutputMode, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    step_results: Vec<StepResult>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
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

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all displayed step results.
    pub fn step_results(&self) -> &[StepResult] {
        &self.step_results
    }

    /// Check if any message, success, warning or error contains `text`.
    pub fn has_output(&self, text: &str) -> bool {
        self.messages
            .iter()
            .chain(&self.successes)
            .chain(&self.warnings)
            .chain(&self.errors)
            .any(|m| m.contains(text))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

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

    fn step_result(&mut self, result: &StepResult) {
        self.step_results.push(result.clone());
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
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
        ui.error("boom");
        assert_eq!(ui.messages(), &["hello".to_string()]);
        assert!(ui.has_output("careful"));
        assert!(ui.has_output("boom"));
        assert!(!ui.has_output("absent"));
    }

    #[test]
    fn captures_step_results() {
        let mut ui = MockUI::with_mode(OutputMode::Quiet);
        ui.step_result(&StepResult::skipped("a", "dependency failed"));
        assert_eq!(ui.step_results().len(), 1);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }
}
