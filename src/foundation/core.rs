use crate::foundation::error::{LiveDrawError, LiveDrawResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Drawing surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas. Both dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> LiveDrawResult<Self> {
        if width == 0 || height == 0 {
            return Err(LiveDrawError::validation(format!(
                "canvas dimensions must be > 0, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered by the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
        }
    }
}

/// Memory layout of an output image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8 bits per channel, R G B A byte order.
    Rgba8888,
    /// 8 bits per channel, B G R A byte order.
    Bgra8888,
    /// IEEE half float per channel, R G B A order, little-endian.
    RgbaF16,
}

impl PixelFormat {
    /// The native 8-bit layout of the host platform.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            Self::Bgra8888
        } else {
            Self::Rgba8888
        }
    }

    /// Bytes used by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 | Self::Bgra8888 => 4,
            Self::RgbaF16 => 8,
        }
    }

    /// Short human label ("RGBA", "BGRA", "F16").
    pub fn label(self) -> &'static str {
        match self {
            Self::Rgba8888 => "RGBA",
            Self::Bgra8888 => "BGRA",
            Self::RgbaF16 => "F16",
        }
    }
}

/// Color space tag attached to a surface configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// sRGB transfer function; stored values are gamma-encoded.
    Srgb,
    /// sRGB primaries with a linear transfer function.
    SrgbLinear,
}

/// Everything a surface needs to know to allocate its target image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Output memory layout.
    pub pixel_format: PixelFormat,
    /// Optional color space; `None` leaves drawn values untouched.
    pub color_space: Option<ColorSpace>,
}

impl ImageDescriptor {
    /// Descriptor for `canvas` with the given format and color space.
    pub fn new(canvas: Canvas, pixel_format: PixelFormat, color_space: Option<ColorSpace>) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            pixel_format,
            color_space,
        }
    }

    /// Canvas covered by this descriptor.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Size of a tightly packed image with this descriptor.
    pub fn byte_len(&self) -> usize {
        self.canvas()
            .pixel_count()
            .saturating_mul(self.pixel_format.bytes_per_pixel())
    }

    /// Validate the dimensions against what the rasterizer accepts and return them as `u16`.
    pub fn raster_dims(&self) -> LiveDrawResult<(u16, u16)> {
        if self.width == 0 || self.height == 0 {
            return Err(LiveDrawError::validation(format!(
                "surface size must be > 0, got {}x{}",
                self.width, self.height
            )));
        }
        let w: u16 = self.width.try_into().map_err(|_| {
            LiveDrawError::validation(format!("surface width exceeds u16: {}", self.width))
        })?;
        let h: u16 = self.height.try_into().map_err(|_| {
            LiveDrawError::validation(format!("surface height exceeds u16: {}", self.height))
        })?;
        Ok((w, h))
    }
}

/// Straight (non-premultiplied) RGBA color with channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Build a color from normalized channels.
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Build a color from 8-bit straight channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        )
    }

    /// Quantize to 8-bit straight channels, clamping out-of-range values.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            if x.is_nan() {
                return 0;
            }
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
