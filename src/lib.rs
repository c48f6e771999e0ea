//! livedraw is a live preview pipeline for small drawing sketches.
//!
//! Source edits go in; the [`PipelineController`] cancels stale work, compiles the newest
//! source, runs the artifact on every registered surface and publishes the images together
//! with the merged diagnostics.
//!
//! - Compile with a [`CompilerService`] (the built-in one is [`ScriptCompiler`])
//! - Render with [`SurfaceAdapter`]s ([`RasterSurface`], [`GpuSurface`])
//! - Observe through [`PipelineController::subscribe`]
#![forbid(unsafe_code)]

mod foundation;
mod script;

pub mod artifact;
pub mod cancel;
pub mod compiler;
/// JSON-loadable controller settings.
pub mod config;
pub mod diagnostic;
pub mod pipeline;
pub mod render;

pub use crate::artifact::{Artifact, DrawTarget, ExecutionFault};
pub use crate::cancel::{CancelSignal, CancelToken, Cancelled};
pub use crate::compiler::{CompilerService, ExecLimits, ScriptArtifact, ScriptCompiler};
pub use crate::config::{LiveDrawConfig, SurfaceConfiguration};
pub use crate::diagnostic::{
    CompilationOutcome, Diagnostic, LineIndex, Location, Severity, Span,
};
pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Color, ColorSpace, ImageDescriptor, PixelFormat, Point, Rect, Vec2,
};
pub use crate::foundation::error::{LiveDrawError, LiveDrawResult};
pub use crate::pipeline::{
    ControllerStats, PipelineController, PipelineEvent, PipelineSnapshot, PipelineState,
};
pub use crate::render::{
    GpuMode, GpuSurface, RasterSurface, RenderedImage, SurfaceAdapter, SurfaceKind,
    SurfaceOutput, default_surfaces,
};
