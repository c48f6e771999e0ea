use std::path::Path;

use crate::artifact::Artifact;
use crate::diagnostic::Diagnostic;
use crate::foundation::core::ImageDescriptor;
use crate::foundation::error::{LiveDrawError, LiveDrawResult};
use crate::render::convert;

/// Which rendering technology a surface uses. Ordering follows registration order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Immediate-mode CPU rasterization.
    Raster,
    /// Deferred, device-backed rendering.
    Gpu,
}

impl SurfaceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Raster => "raster",
            Self::Gpu => "gpu",
        }
    }
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A finished image in the layout described by its descriptor. Color channels are premultiplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedImage {
    kind: SurfaceKind,
    descriptor: ImageDescriptor,
    data: Vec<u8>,
}

impl RenderedImage {
    /// Encode premultiplied RGBA8 pixels into `descriptor`'s format and color space.
    pub(crate) fn from_premul_rgba8(
        kind: SurfaceKind,
        descriptor: ImageDescriptor,
        premul: &[u8],
    ) -> Self {
        Self {
            kind,
            descriptor,
            data: convert::encode(premul, &descriptor),
        }
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn descriptor(&self) -> &ImageDescriptor {
        &self.descriptor
    }

    /// Raw pixel bytes, tightly packed rows.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Straight-alpha, sRGB-encoded RGBA8, ready for PNG encoding.
    pub fn to_rgba8_straight(&self) -> Vec<u8> {
        convert::decode_rgba8_straight(&self.data, &self.descriptor)
    }

    /// Encode as an 8-bit RGBA PNG file.
    pub fn write_png(&self, path: &Path) -> LiveDrawResult<()> {
        image::save_buffer_with_format(
            path,
            &self.to_rgba8_straight(),
            self.descriptor.width,
            self.descriptor.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| LiveDrawError::render(format!("write png '{}': {e}", path.display())))
    }
}

/// What one surface produced for one render tick.
#[derive(Debug, Default)]
pub struct SurfaceOutput {
    /// Faults and surface problems, in the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
    /// Finished image, absent when the surface could not produce one.
    pub image: Option<RenderedImage>,
}

impl SurfaceOutput {
    pub(crate) fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
            image: None,
        }
    }
}

/// Runs artifacts against one rendering technology.
///
/// An adapter owns whatever device state it needs and may reuse it across calls. `execute`
/// never fails: problems are reported as diagnostics next to whatever image could be produced.
pub trait SurfaceAdapter: Send {
    fn kind(&self) -> SurfaceKind;

    /// Allocate a target matching `descriptor`, run `artifact` against it and finalize.
    fn execute(&mut self, artifact: &dyn Artifact, descriptor: &ImageDescriptor) -> SurfaceOutput;
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
