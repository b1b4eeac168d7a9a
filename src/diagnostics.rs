//! Non-fatal diagnostic sink.
//!
//! Parsing a document that references a missing `#include` file, or that
//! contains an `Is`/`Is Not` comparison the folder declines to fold, is not
//! a fatal condition (spec §4.8). Callers get a structured list back *and*
//! the same information flows through `tracing`, so embedding applications
//! that already run a subscriber see it without inspecting the return
//! value.

use crate::error::SourcePos;

/// A single non-fatal condition observed while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub pos: SourcePos,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An `#include` directive referencing a file the configured
    /// `IncludeResolver` could not resolve.
    UnresolvedInclude,
    /// A subtree that could not be constant-folded (e.g. `Is`/`Is Not`)
    /// was left as a plain expression node.
    UnfoldableExpression,
}

/// Diagnostics collected over the course of one `parse_program` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pos: SourcePos, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            pos,
            kind,
            message: message.into(),
        };
        match diagnostic.kind {
            DiagnosticKind::UnresolvedInclude => {
                tracing::warn!(pos = %diagnostic.pos, "{}", diagnostic.message)
            }
            DiagnosticKind::UnfoldableExpression => {
                tracing::debug!(pos = %diagnostic.pos, "{}", diagnostic.message)
            }
        }
        self.0.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
