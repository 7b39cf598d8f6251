//! Terminal UI.

use console::Term;
use std::io::Write;

use crate::steps::StepResult;

use super::{should_use_colors, AnvilTheme, OutputMode, UserInterface};

/// Terminal UI implementation.
///
/// Regular output goes to stdout; errors go to stderr so that `--json`
/// output stays parseable.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: AnvilTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            AnvilTheme::new()
        } else {
            AnvilTheme::plain()
        };

        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme,
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        writeln!(self.out, "{}", msg).ok();
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn step_result(&mut self, result: &StepResult) {
        let line = self
            .theme
            .format_status_line(result.status, &result.summary_line());
        writeln!(self.out, "  {}", line).ok();
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_header(title)).ok();
        }
    }
}

/// Create the UI used by the binary.
pub fn create_ui(mode: OutputMode) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode))
}
