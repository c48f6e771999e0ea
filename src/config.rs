use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::compiler::ExecLimits;
use crate::foundation::core::{Canvas, ColorSpace, ImageDescriptor, PixelFormat};
use crate::foundation::error::{LiveDrawError, LiveDrawResult};
use crate::render::GpuMode;

/// One selectable output configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceConfiguration {
    /// Label shown to the user, e.g. "RGBA (sRGB)".
    pub label: String,
    pub pixel_format: PixelFormat,
    #[serde(default)]
    pub color_space: Option<ColorSpace>,
}

impl SurfaceConfiguration {
    pub fn new(
        label: impl Into<String>,
        pixel_format: PixelFormat,
        color_space: Option<ColorSpace>,
    ) -> Self {
        Self {
            label: label.into(),
            pixel_format,
            color_space,
        }
    }

    /// Image descriptor for this configuration at `canvas` size.
    pub fn descriptor(&self, canvas: Canvas) -> ImageDescriptor {
        ImageDescriptor::new(canvas, self.pixel_format, self.color_space)
    }

    /// Platform 8-bit format without and with sRGB, then half-float linear.
    pub fn defaults() -> Vec<Self> {
        let platform = PixelFormat::platform_default();
        vec![
            Self::new(platform.label(), platform, None),
            Self::new(
                format!("{} (sRGB)", platform.label()),
                platform,
                Some(ColorSpace::Srgb),
            ),
            Self::new(
                "F16 (sRGB Linear)",
                PixelFormat::RgbaF16,
                Some(ColorSpace::SrgbLinear),
            ),
        ]
    }
}

/// Controller settings. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LiveDrawConfig {
    pub width: u32,
    pub height: u32,
    /// Available output configurations, in presentation order.
    pub configurations: Vec<SurfaceConfiguration>,
    /// Index into `configurations` selected at startup.
    pub selected_configuration: usize,
    pub gpu_mode: GpuMode,
    /// Bounds applied to every run of user code.
    pub limits: ExecLimits,
}

impl Default for LiveDrawConfig {
    fn default() -> Self {
        let canvas = Canvas::default();
        Self {
            width: canvas.width,
            height: canvas.height,
            configurations: SurfaceConfiguration::defaults(),
            selected_configuration: 0,
            gpu_mode: GpuMode::default(),
            limits: ExecLimits::default(),
        }
    }
}

impl LiveDrawConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> LiveDrawResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| LiveDrawError::serde(format!("parse livedraw config JSON: {e}")))
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> LiveDrawResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            LiveDrawError::config(format!("open config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> LiveDrawResult<()> {
        self.canvas()?;
        if self.configurations.is_empty() {
            return Err(LiveDrawError::config(
                "at least one surface configuration is required",
            ));
        }
        if self.selected_configuration >= self.configurations.len() {
            return Err(LiveDrawError::config(format!(
                "selected_configuration {} is out of range (0..{})",
                self.selected_configuration,
                self.configurations.len()
            )));
        }
        if self.limits.max_steps == 0 {
            return Err(LiveDrawError::config("limits.max_steps must be > 0"));
        }
        Ok(())
    }

    /// Initial canvas, validated.
    pub fn canvas(&self) -> LiveDrawResult<Canvas> {
        Canvas::new(self.width, self.height)
            .map_err(|e| LiveDrawError::config(format!("initial size: {e}")))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
