use std::panic::{self, AssertUnwindSafe};

use crate::artifact::Artifact;
use crate::diagnostic::Diagnostic;
use crate::foundation::core::ImageDescriptor;
use crate::render::cpu::{self, CpuTarget};
use crate::render::display_list::DisplayList;
use crate::render::surface::{
    RenderedImage, SurfaceAdapter, SurfaceKind, SurfaceOutput, panic_message,
};

/// How the gpu surface produces images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuMode {
    /// Record a display list, then replay it on a fresh offscreen device.
    #[default]
    Offscreen,
    /// Interface only: no work, no diagnostics, no image.
    Stub,
}

/// Deferred surface. User code never touches a device directly; it records into a display
/// list that is submitted in one go when the tick finishes.
#[derive(Debug, Default)]
pub struct GpuSurface {
    mode: GpuMode,
}

impl GpuSurface {
    pub fn new(mode: GpuMode) -> Self {
        Self { mode }
    }

    pub fn offscreen() -> Self {
        Self::new(GpuMode::Offscreen)
    }

    pub fn stub() -> Self {
        Self::new(GpuMode::Stub)
    }

    pub fn mode(&self) -> GpuMode {
        self.mode
    }
}

impl SurfaceAdapter for GpuSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Gpu
    }

    fn execute(&mut self, artifact: &dyn Artifact, descriptor: &ImageDescriptor) -> SurfaceOutput {
        if self.mode == GpuMode::Stub {
            return SurfaceOutput::default();
        }

        let (w, h) = match descriptor.raster_dims() {
            Ok(dims) => dims,
            Err(e) => return SurfaceOutput::failed(Diagnostic::error(None, e.to_string())),
        };

        let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut list = DisplayList::new(descriptor.canvas());
            let fault = artifact.draw(&mut list).err();

            let mut ctx = vello_cpu::RenderContext::new(w, h);
            list.replay(&mut CpuTarget::new(&mut ctx, descriptor.canvas()));
            tracing::trace!(items = list.items().len(), "gpu display list submitted");
            (fault, cpu::finish(&mut ctx, w, h))
        }));

        let (fault, premul) = match drawn {
            Ok(done) => done,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::warn!(surface = "gpu", %msg, "drawing panicked; display list discarded");
                return SurfaceOutput::failed(Diagnostic::error(
                    None,
                    format!("gpu surface: drawing panicked: {msg}"),
                ));
            }
        };

        SurfaceOutput {
            diagnostics: fault.iter().map(|f| f.to_diagnostic()).collect(),
            image: Some(RenderedImage::from_premul_rgba8(
                SurfaceKind::Gpu,
                *descriptor,
                &premul,
            )),
        }
    }
}
