//! Rendering surfaces: where artifacts get executed and turned into images.

mod convert;
mod cpu;
pub(crate) mod display_list;
mod gpu;
mod raster;
mod surface;

pub use gpu::{GpuMode, GpuSurface};
pub use raster::RasterSurface;
pub use surface::{RenderedImage, SurfaceAdapter, SurfaceKind, SurfaceOutput};

/// The standard surface set: raster first, then gpu.
pub fn default_surfaces(gpu_mode: GpuMode) -> Vec<Box<dyn SurfaceAdapter>> {
    vec![
        Box::new(RasterSurface::new()),
        Box::new(GpuSurface::new(gpu_mode)),
    ]
}
