use std::panic::{self, AssertUnwindSafe};

use crate::artifact::Artifact;
use crate::diagnostic::Diagnostic;
use crate::foundation::core::ImageDescriptor;
use crate::render::cpu::{self, CpuTarget};
use crate::render::surface::{
    RenderedImage, SurfaceAdapter, SurfaceKind, SurfaceOutput, panic_message,
};

/// Immediate-mode CPU surface. Draw calls go straight into a `vello_cpu` context that is kept
/// between ticks while the size stays the same.
#[derive(Default)]
pub struct RasterSurface {
    ctx: Option<vello_cpu::RenderContext>,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("has_context", &self.ctx.is_some())
            .finish()
    }
}

impl SurfaceAdapter for RasterSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Raster
    }

    fn execute(&mut self, artifact: &dyn Artifact, descriptor: &ImageDescriptor) -> SurfaceOutput {
        let (w, h) = match descriptor.raster_dims() {
            Ok(dims) => dims,
            Err(e) => return SurfaceOutput::failed(Diagnostic::error(None, e.to_string())),
        };

        let mut ctx = cpu::take_context(&mut self.ctx, w, h);
        // A fault still finalizes whatever was drawn before it.
        let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
            let fault = artifact
                .draw(&mut CpuTarget::new(&mut ctx, descriptor.canvas()))
                .err();
            (fault, cpu::finish(&mut ctx, w, h))
        }));

        let (fault, premul) = match drawn {
            Ok(done) => done,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::warn!(surface = "raster", %msg, "drawing panicked; context discarded");
                return SurfaceOutput::failed(Diagnostic::error(
                    None,
                    format!("raster surface: drawing panicked: {msg}"),
                ));
            }
        };
        self.ctx = Some(ctx);

        SurfaceOutput {
            diagnostics: fault.iter().map(|f| f.to_diagnostic()).collect(),
            image: Some(RenderedImage::from_premul_rgba8(
                SurfaceKind::Raster,
                *descriptor,
                &premul,
            )),
        }
    }
}
