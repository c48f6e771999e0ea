//! The runnable side of a compilation: what an artifact is and what it can draw on.

use crate::diagnostic::{Diagnostic, Location};
use crate::foundation::core::{Affine, BezPath, Canvas, Color};

/// Drawing operations a surface exposes to user code.
///
/// Geometry is in canvas pixel space before `transform` is applied.
pub trait DrawTarget {
    /// Size of the surface being drawn.
    fn canvas(&self) -> Canvas;

    /// Replace every pixel with `color`, discarding anything drawn so far.
    fn clear(&mut self, color: Color);

    /// Fill `path` (non-zero winding) with a solid color.
    fn fill_path(&mut self, path: &BezPath, transform: Affine, color: Color);

    /// Stroke `path` with a solid color.
    fn stroke_path(&mut self, path: &BezPath, transform: Affine, line_width: f64, color: Color);
}

/// A fault raised by user drawing code while it runs.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionFault {
    /// What went wrong.
    pub message: String,
    /// Where in the source it went wrong, if known.
    pub location: Option<Location>,
}

impl ExecutionFault {
    /// Fault without a location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Error diagnostic describing this fault.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.location, format!("runtime error: {}", self.message))
    }
}

/// Compiled, runnable drawing code.
///
/// Artifacts are immutable and shared between surfaces; each `draw` call is independent.
pub trait Artifact: Send + Sync {
    /// Run the drawing entry point against `target`.
    fn draw(&self, target: &mut dyn DrawTarget) -> Result<(), ExecutionFault>;
}
