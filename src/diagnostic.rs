//! Compiler and runtime messages, and the result of one compilation.

use std::fmt;
use std::sync::Arc;

use crate::artifact::Artifact;

/// How serious a [`Diagnostic`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note.
    Info,
    /// Suspicious but runnable code.
    Warning,
    /// Code that cannot run, or a fault raised while running it.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Half-open byte range `[start, end)` into the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    /// Build a span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Where a diagnostic points in the source. Lines and columns are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Location {
    /// 1-based line.
    pub line: u32,
    /// 1-based column, counted in characters.
    pub column: u32,
    /// Byte range the location was derived from, when known.
    pub span: Option<Span>,
}

/// A single compiler or runtime message. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    severity: Severity,
    location: Option<Location>,
    text: String,
}

impl Diagnostic {
    /// Build a diagnostic.
    pub fn new(severity: Severity, location: Option<Location>, text: impl Into<String>) -> Self {
        Self {
            severity,
            location,
            text: text.into(),
        }
    }

    /// Error-severity diagnostic.
    pub fn error(location: Option<Location>, text: impl Into<String>) -> Self {
        Self::new(Severity::Error, location, text)
    }

    /// Warning-severity diagnostic.
    pub fn warning(location: Option<Location>, text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, location, text)
    }

    /// Info-severity diagnostic.
    pub fn info(location: Option<Location>, text: impl Into<String>) -> Self {
        Self::new(Severity::Info, location, text)
    }

    /// Severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Source location, if any.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `true` for [`Severity::Error`].
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{}[{}:{}]: {}",
                self.severity, loc.line, loc.column, self.text
            ),
            None => write!(f, "{}: {}", self.severity, self.text),
        }
    }
}

/// Maps byte offsets of one source text to line/column locations.
#[derive(Clone, Debug)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Index `text`.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            text: Arc::from(text),
            line_starts,
        }
    }

    /// Location of the start of `span`.
    pub fn location(&self, span: Span) -> Location {
        let offset = span.start.min(self.text.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self
            .text
            .get(line_start..offset)
            .map_or(offset - line_start, |s| s.chars().count());
        Location {
            line: u32::try_from(line_idx + 1).unwrap_or(u32::MAX),
            column: u32::try_from(column + 1).unwrap_or(u32::MAX),
            span: Some(span),
        }
    }
}

/// The result of compiling one source text.
///
/// `has_errors` is derived from the diagnostics, and an outcome with errors never carries an
/// artifact.
#[derive(Clone)]
pub struct CompilationOutcome {
    artifact: Option<Arc<dyn Artifact>>,
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl CompilationOutcome {
    /// Build an outcome. The artifact is dropped when any diagnostic is an error.
    pub fn new(artifact: Option<Arc<dyn Artifact>>, diagnostics: Vec<Diagnostic>) -> Self {
        let has_errors = diagnostics.iter().any(Diagnostic::is_error);
        Self {
            artifact: if has_errors { None } else { artifact },
            diagnostics,
            has_errors,
        }
    }

    /// Outcome for a compiler that failed internally.
    pub fn internal_failure(text: impl Into<String>) -> Self {
        Self::new(None, vec![Diagnostic::error(None, text)])
    }

    /// Runnable artifact, absent when compilation failed.
    pub fn artifact(&self) -> Option<&Arc<dyn Artifact>> {
        self.artifact.as_ref()
    }

    /// Diagnostics in the order the compiler produced them.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// `true` iff at least one diagnostic has [`Severity::Error`].
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }
}

impl fmt::Debug for CompilationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationOutcome")
            .field("has_artifact", &self.artifact.is_some())
            .field("diagnostics", &self.diagnostics)
            .field("has_errors", &self.has_errors)
            .finish()
    }
}

#[cfg(test)]
#[path = "../tests/unit/diagnostic.rs"]
mod tests;
