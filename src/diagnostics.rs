//! Shared diagnostic model threaded through every compiler stage.
//!
//! Every stage of the pipeline (lexer, parser, name analyzer, type checker,
//! code generator) reports through a single [`Reporter`] instead of each
//! owning its own error enum, so the CLI driver has one place to decide
//! whether to keep going.

use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Serialize};

/// A position in a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A span of source text, from `start` (inclusive) to `end` (exclusive).
///
/// Position is intentionally excluded from equality for AST comparisons in
/// tests; use [`Span::same_place_as`] when position actually matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub file: String,
}

impl Span {
    pub fn new(start: Position, end: Position, file: impl Into<String>) -> Self {
        Self {
            start,
            end,
            file: file.into(),
        }
    }

    pub fn same_place_as(&self, other: &Span) -> bool {
        self.start == other.start && self.end == other.end && self.file == other.file
    }

    /// Render a colored, multi-line "file:line:col: message" block, in the
    /// style of a typical rustc-ish diagnostic.
    pub fn render(&self, message: &str) -> String {
        format!(
            "{}: {}\n  {} {}:{}",
            "error".red().bold(),
            message,
            "-->".blue(),
            self.file,
            self.start
        )
    }
}

impl PartialEq for Span {
    fn eq(&self, _other: &Span) -> bool {
        true
    }
}

impl Eq for Span {}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// A single diagnostic emitted by any pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub position: Option<Span>,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>, position: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            position,
        }
    }

    pub fn error(message: impl Into<String>, position: Option<Span>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            position,
        }
    }

    pub fn fatal(message: impl Into<String>, position: Option<Span>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(span) => write!(f, "{}", span.render(&self.message)),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Append-only sink for diagnostics, shared by reference across a whole
/// compile run. A [`Reporter::has_errors`] check is made at every stage
/// boundary by the pipeline driver.
#[derive(Debug, Default, Clone)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error | Severity::Fatal => log::error!("{diagnostic}"),
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d.severity, Severity::Error | Severity::Fatal))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_equality_ignores_position() {
        let a = Span::new(Position::new(1, 1), Position::new(1, 2), "a.amy");
        let b = Span::new(Position::new(9, 9), Position::new(9, 9), "a.amy");
        assert_eq!(a, b);
    }

    #[test]
    fn reporter_tracks_errors() {
        let mut reporter = Reporter::new();
        assert!(!reporter.has_errors());
        reporter.push(Diagnostic::warning("just fyi", None));
        assert!(!reporter.has_errors());
        reporter.push(Diagnostic::error("bad", None));
        assert!(reporter.has_errors());
    }
}
