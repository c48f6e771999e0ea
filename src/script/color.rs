use crate::foundation::core::Color;

/// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional, hex digits are case-insensitive).
pub(crate) fn parse_hex(s: &str) -> Result<Color, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }

    let (r, g, b, a) = match s.len() {
        6 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        ),
        8 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ),
        _ => return Err("hex color must be #RRGGBB or #RRGGBBAA".to_owned()),
    };

    Ok(Color::from_rgba8(r, g, b, a))
}

/// 8-bit style channels (`0..=255`, clamped) into a color.
pub(crate) fn from_byte_channels(r: f64, g: f64, b: f64, a: f64) -> Color {
    fn norm(x: f64) -> f64 {
        (x / 255.0).clamp(0.0, 1.0)
    }
    Color::rgba(norm(r), norm(g), norm(b), norm(a))
}

/// HSL to RGB in sRGB space. Hue in degrees, saturation and lightness in `0..=1`.
pub(crate) fn hsl_to_color(h: f64, s: f64, l: f64) -> Color {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Color::rgba(l, l, l, 1.0);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Color::rgba(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        1.0,
    )
}
