//! Severity-ranked, positioned diagnostics.
//!
//! Every problem found while parsing or loading a configuration travels as
//! a [`Diagnostic`] inside an accumulating [`Diagnostics`] list, never as a
//! bare error that aborts the pass. Warnings never fail an apply; an entry
//! at [`Severity::Error`] or above does.
//!
//! For identical input, error-severity diagnostics are stable across runs:
//! same message text, same positions.

use crate::ast::{Position, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// Suspicious but not fatal; never fails an apply.
    Warn,
    /// The apply cannot be published.
    Error,
    /// The apply cannot be published and the agent is likely misconfigured
    /// beyond this one document.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A single positioned message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub start_pos: Position,
    pub end_pos: Position,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        start_pos: Position,
        end_pos: Position,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            start_pos,
            end_pos,
        }
    }

    /// An error-severity diagnostic covering `span`.
    pub fn error(message: impl Into<String>, span: &Span) -> Self {
        Self::new(Severity::Error, message, span.start.clone(), span.end.clone())
    }

    /// A warn-severity diagnostic covering `span`.
    pub fn warn(message: impl Into<String>, span: &Span) -> Self {
        Self::new(Severity::Warn, message, span.start.clone(), span.end.clone())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_pos.is_none() {
            write!(f, "{}: {}", self.severity, self.message)
        } else {
            write!(f, "{}: {}: {}", self.start_pos, self.severity, self.message)
        }
    }
}

/// An ordered, accumulating list of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if any entry is at [`Severity::Error`] or above.
    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity >= Severity::Error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
