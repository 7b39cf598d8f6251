//! Terminal output.
//!
//! Commands never print directly. They talk to a [`UserInterface`], which is
//! a styled terminal in the binary and a [`MockUI`] in tests.
//!
//! # Example
//!
//! ```
//! use anvil::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.show_header("anvil");
//! ui.success("Plan written");
//! assert_eq!(ui.successes(), &["Plan written".to_string()]);
//! ```

pub mod mock;
pub mod output;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use output::OutputMode;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, AnvilTheme};

use crate::steps::StepResult;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a plain line. Used for machine-readable output as well, so it
    /// is shown in every mode.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Display one step's outcome.
    fn step_result(&mut self, result: &StepResult);

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);
}
