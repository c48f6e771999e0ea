use std::fmt;

use crate::diagnostic::{Severity, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptError {
    pub(crate) span: Span,
    pub(crate) message: String,
}

impl ScriptError {
    pub(crate) fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script error at byte {}: {}", self.span.start, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// A compile-time message that still needs a line/column mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScriptMessage {
    pub(crate) severity: Severity,
    pub(crate) span: Span,
    pub(crate) message: String,
}

impl ScriptMessage {
    pub(crate) fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
        }
    }
}

impl From<ScriptError> for ScriptMessage {
    fn from(e: ScriptError) -> Self {
        Self {
            severity: Severity::Error,
            span: e.span,
            message: e.message,
        }
    }
}
