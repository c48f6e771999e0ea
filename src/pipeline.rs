//! The live preview pipeline: input changes in, compiled and rendered snapshots out.

mod controller;
mod event;
mod state;

pub use controller::PipelineController;
pub use event::PipelineEvent;
pub use state::{ControllerStats, PipelineSnapshot, PipelineState};
