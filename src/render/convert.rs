use crate::foundation::core::{ColorSpace, ImageDescriptor, PixelFormat};

/// Convert premultiplied, sRGB-encoded RGBA8 into the layout `desc` asks for.
pub(crate) fn encode(premul: &[u8], desc: &ImageDescriptor) -> Vec<u8> {
    let linear = desc.color_space == Some(ColorSpace::SrgbLinear);
    let mut out = Vec::with_capacity(desc.byte_len());

    for px in premul.chunks_exact(4) {
        match (desc.pixel_format, linear) {
            (PixelFormat::Rgba8888, false) => out.extend_from_slice(px),
            (PixelFormat::Bgra8888, false) => out.extend_from_slice(&[px[2], px[1], px[0], px[3]]),
            (fmt, _) => {
                let mut c = unit(px);
                if linear {
                    c = map_straight(c, srgb_to_linear);
                }
                write_unit(&mut out, fmt, c);
            }
        }
    }
    out
}

/// Inverse of [`encode`], down to straight-alpha sRGB RGBA8.
pub(crate) fn decode_rgba8_straight(data: &[u8], desc: &ImageDescriptor) -> Vec<u8> {
    let linear = desc.color_space == Some(ColorSpace::SrgbLinear);
    let bpp = desc.pixel_format.bytes_per_pixel();
    let mut out = Vec::with_capacity(desc.canvas().pixel_count() * 4);

    for px in data.chunks_exact(bpp) {
        let premul = match desc.pixel_format {
            PixelFormat::Rgba8888 => unit(px),
            PixelFormat::Bgra8888 => unit(&[px[2], px[1], px[0], px[3]]),
            PixelFormat::RgbaF16 => {
                let mut c = [0.0f32; 4];
                for (i, ch) in c.iter_mut().enumerate() {
                    *ch = f16_bits_to_f32(u16::from_le_bytes([px[2 * i], px[2 * i + 1]]));
                }
                c
            }
        };
        let mut straight = unpremultiply(premul);
        if linear {
            for ch in &mut straight[..3] {
                *ch = linear_to_srgb(*ch);
            }
        }
        out.extend(straight.iter().map(|&v| to_u8(v)));
    }
    out
}

fn unit(px: &[u8]) -> [f32; 4] {
    [
        f32::from(px[0]) / 255.0,
        f32::from(px[1]) / 255.0,
        f32::from(px[2]) / 255.0,
        f32::from(px[3]) / 255.0,
    ]
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn unpremultiply(c: [f32; 4]) -> [f32; 4] {
    let a = c[3];
    if a <= 0.0 {
        return [0.0; 4];
    }
    [
        (c[0] / a).min(1.0),
        (c[1] / a).min(1.0),
        (c[2] / a).min(1.0),
        a,
    ]
}

/// Apply `f` to the straight color channels of a premultiplied pixel.
fn map_straight(c: [f32; 4], f: fn(f32) -> f32) -> [f32; 4] {
    let s = unpremultiply(c);
    let a = s[3];
    [f(s[0]) * a, f(s[1]) * a, f(s[2]) * a, a]
}

fn write_unit(out: &mut Vec<u8>, fmt: PixelFormat, c: [f32; 4]) {
    match fmt {
        PixelFormat::Rgba8888 => out.extend(c.iter().map(|&v| to_u8(v))),
        PixelFormat::Bgra8888 => out.extend([c[2], c[1], c[0], c[3]].iter().map(|&v| to_u8(v))),
        PixelFormat::RgbaF16 => {
            for v in c {
                out.extend_from_slice(&f32_to_f16_bits(v).to_le_bytes());
            }
        }
    }
}

pub(crate) fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub(crate) fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// IEEE 754 binary16 bits for `v`, round to nearest even.
pub(crate) fn f32_to_f16_bits(v: f32) -> u16 {
    let x = v.to_bits();
    let sign = ((x >> 16) & 0x8000) as u16;
    let exp = ((x >> 23) & 0xff) as i32;
    let mant = x & 0x007f_ffff;

    if exp == 0xff {
        let nan_bit = if mant != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | nan_bit;
    }

    let e = exp - 127 + 15;
    if e >= 0x1f {
        return sign | 0x7c00;
    }
    if e <= 0 {
        // Subnormal or zero.
        if e < -10 {
            return sign;
        }
        let m = mant | 0x0080_0000;
        let shift = (14 - e) as u32;
        let half = m >> shift;
        let rem = m & ((1 << shift) - 1);
        let halfway = 1 << (shift - 1);
        let rounded = if rem > halfway || (rem == halfway && half & 1 == 1) {
            half + 1
        } else {
            half
        };
        return sign | rounded as u16;
    }

    let mut bits = ((e as u32) << 10) | (mant >> 13);
    let rem = mant & 0x1fff;
    if rem > 0x1000 || (rem == 0x1000 && bits & 1 == 1) {
        // A carry into the exponent is still the correctly rounded value.
        bits += 1;
    }
    sign | bits as u16
}

pub(crate) fn f16_bits_to_f32(h: u16) -> f32 {
    let sign = if h & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = i32::from((h >> 10) & 0x1f);
    let mant = f32::from(h & 0x03ff);
    match exp {
        0 => sign * mant * 2f32.powi(-24),
        0x1f if mant == 0.0 => sign * f32::INFINITY,
        0x1f => f32::NAN,
        _ => sign * (1.0 + mant / 1024.0) * 2f32.powi(exp - 15),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/convert.rs"]
mod tests;
