use super::*;
use crate::foundation::core::Canvas;

fn desc(fmt: PixelFormat, cs: Option<ColorSpace>) -> ImageDescriptor {
    ImageDescriptor::new(
        Canvas {
            width: 2,
            height: 1,
        },
        fmt,
        cs,
    )
}

// Opaque red, then half-transparent white (premultiplied).
const PREMUL: [u8; 8] = [255, 0, 0, 255, 128, 128, 128, 128];

#[test]
fn rgba_is_copied_verbatim() {
    let d = desc(PixelFormat::Rgba8888, None);
    assert_eq!(encode(&PREMUL, &d), PREMUL.to_vec());
    assert_eq!(
        decode_rgba8_straight(&PREMUL, &d),
        vec![255, 0, 0, 255, 255, 255, 255, 128]
    );
}

#[test]
fn bgra_swaps_red_and_blue() {
    let d = desc(PixelFormat::Bgra8888, Some(ColorSpace::Srgb));
    let out = encode(&PREMUL, &d);
    assert_eq!(&out[..4], &[0, 0, 255, 255]);
    assert_eq!(&decode_rgba8_straight(&out, &d)[..4], &[255, 0, 0, 255]);
}

#[test]
fn f16_output_is_little_endian_half_floats() {
    let d = desc(PixelFormat::RgbaF16, None);
    let out = encode(&PREMUL, &d);
    assert_eq!(out.len(), d.byte_len());
    assert_eq!(&out[0..2], &0x3c00u16.to_le_bytes());
    assert_eq!(&out[2..4], &[0, 0]);
    assert_eq!(decode_rgba8_straight(&out, &d)[..4], [255, 0, 0, 255]);
}

#[test]
fn linear_color_space_darkens_midtones() {
    let d = desc(PixelFormat::Rgba8888, Some(ColorSpace::SrgbLinear));
    let grey = [128u8, 128, 128, 255];
    let out = encode(&grey, &d);
    assert!(out[0] < 64, "linear value of sRGB 0.5 is ~0.21, got {}", out[0]);
    assert_eq!(out[3], 255);

    let back = decode_rgba8_straight(&out, &d);
    assert!((i32::from(back[0]) - 128).abs() <= 3);
}

#[test]
fn half_float_conversion_edges() {
    assert_eq!(f32_to_f16_bits(0.0), 0);
    assert_eq!(f32_to_f16_bits(-0.0), 0x8000);
    assert_eq!(f32_to_f16_bits(1.0), 0x3c00);
    assert_eq!(f32_to_f16_bits(0.5), 0x3800);
    assert_eq!(f32_to_f16_bits(65504.0), 0x7bff);
    assert_eq!(f32_to_f16_bits(1.0e6), 0x7c00);
    assert_eq!(f32_to_f16_bits(f32::INFINITY), 0x7c00);
    assert!(f16_bits_to_f32(f32_to_f16_bits(f32::NAN)).is_nan());
    // Smallest positive subnormal.
    assert_eq!(f32_to_f16_bits(2f32.powi(-24)), 1);

    for v in [0.25f32, 0.75, 0.1, 0.333, 1.0 / 255.0] {
        let back = f16_bits_to_f32(f32_to_f16_bits(v));
        assert!((back - v).abs() <= v * 1e-3, "{v} -> {back}");
    }
}

#[test]
fn srgb_transfer_round_trips() {
    for v in [0.0f32, 0.01, 0.2, 0.5, 0.9, 1.0] {
        let back = linear_to_srgb(srgb_to_linear(v));
        assert!((back - v).abs() < 1e-5, "{v} -> {back}");
    }
}
