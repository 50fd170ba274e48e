//! User-facing error rendering.
//!
//! A failed build should say what went wrong, what was looked at, and what to
//! try next. [`Diagnostic`] carries those parts and renders them for the
//! terminal.

use std::fmt::{self, Write};
use std::path::PathBuf;

/// Common hints shared by several commands.
pub mod suggestions {
    /// No manifest in the directory tree.
    pub const NO_MANIFEST: &str = "Create an `Extforge.toml` describing your extensions";

    /// An external tool exited with an error.
    pub const BUILD_FAILED: &str = "Run with `--verbose` to see the full tool output";
}

const RED_BOLD: &str = "\x1b[1;31m";
const GREEN_BOLD: &str = "\x1b[1;32m";
const RESET: &str = "\x1b[0m";

/// Continuation lines line up under the first line's text.
const INDENT: &str = "       ";

/// An error with the paths involved and hints for fixing it.
#[derive(Debug, Clone, Default)]
pub struct Diagnostic {
    pub message: String,
    /// File the error is about
    pub location: Option<PathBuf>,
    /// Notes, e.g. every path that was tried
    pub context: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            ..Diagnostic::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for the terminal, with ANSI colors when `color` is set.
    pub fn format(&self, color: bool) -> String {
        let paint = |style: &str, text: &str| {
            if color {
                format!("{}{}{}", style, text, RESET)
            } else {
                text.to_string()
            }
        };

        let mut out = String::new();
        // Aggregated errors put one finding per line
        let mut lines = self.message.lines();
        let _ = writeln!(
            out,
            "{}: {}",
            paint(RED_BOLD, "error"),
            lines.next().unwrap_or_default()
        );
        for line in lines {
            let _ = writeln!(out, "{}{}", INDENT, line);
        }

        if let Some(path) = &self.location {
            let _ = writeln!(out, "  --> {}", path.display());
        }
        for note in &self.context {
            let _ = writeln!(out, "  = {}", note);
        }

        if !self.suggestions.is_empty() {
            let _ = writeln!(out, "\n{}: consider:", paint(GREEN_BOLD, "help"));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
            }
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
