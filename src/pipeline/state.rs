use std::collections::BTreeMap;
use std::sync::Arc;

use crate::diagnostic::Diagnostic;
use crate::foundation::core::Canvas;
use crate::render::{RenderedImage, SurfaceKind};

/// Latest known compile and render status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Idle; the last compile succeeded, possibly with warnings.
    #[default]
    Ready,
    /// A compile is in flight.
    Working,
    /// The last compile reported at least one error.
    Error,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ready => "ready",
            Self::Working => "working",
            Self::Error => "error",
        })
    }
}

/// Everything an observer needs to display the pipeline, published after every change.
#[derive(Clone, Debug, Default)]
pub struct PipelineSnapshot {
    /// Bumped on every publish.
    pub revision: u64,
    pub state: PipelineState,
    /// Compile diagnostics followed by the diagnostics of the latest render tick.
    ///
    /// In the `Error` state a resize or configuration change re-renders the last good artifact,
    /// so the render part then describes that artifact rather than the current source.
    pub diagnostics: Vec<Diagnostic>,
    /// Current image per surface kind.
    pub images: BTreeMap<SurfaceKind, Arc<RenderedImage>>,
    pub canvas: Canvas,
    /// Label of the selected surface configuration.
    pub configuration: String,
}

/// Counters kept by the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ControllerStats {
    pub compiles_started: u64,
    /// Completions that were current and got applied.
    pub compiles_committed: u64,
    /// Completions dropped as stale or cancelled.
    pub compiles_discarded: u64,
    pub render_ticks: u64,
    /// Superseded images the controller let go of.
    pub images_released: u64,
}
