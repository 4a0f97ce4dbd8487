//! Output highlighting.
//!
//! A [`Style`] is chosen once at startup and handed to the formatter and the
//! router. Plain styles return text untouched.

use std::io::IsTerminal;

use colored::{ColoredString, Colorize};

/// How output should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleMode {
    /// Highlight when stdout is a terminal.
    Interactive,
    /// Never highlight.
    Plain,
}

/// Highlighting capability threaded through output code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(mode: StyleMode) -> Self {
        let enabled = match mode {
            StyleMode::Interactive => std::io::stdout().is_terminal(),
            StyleMode::Plain => false,
        };
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, text: &str, f: impl FnOnce(&str) -> ColoredString) -> String {
        if self.enabled {
            f(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |t| t.bold())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed())
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(text, |t| t.red())
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow())
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint(text, |t| t.cyan())
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::plain()
    }
}
