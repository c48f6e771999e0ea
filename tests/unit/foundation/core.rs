use super::*;

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert_eq!(Canvas::new(3, 4).unwrap().pixel_count(), 12);
    assert_eq!(
        Canvas::default(),
        Canvas {
            width: 256,
            height: 256
        }
    );
}

#[test]
fn descriptor_byte_len_follows_pixel_format() {
    let canvas = Canvas::new(10, 2).unwrap();
    let rgba = ImageDescriptor::new(canvas, PixelFormat::Rgba8888, None);
    let f16 = ImageDescriptor::new(canvas, PixelFormat::RgbaF16, Some(ColorSpace::SrgbLinear));
    assert_eq!(rgba.byte_len(), 80);
    assert_eq!(f16.byte_len(), 160);
    assert_eq!(f16.canvas(), canvas);
}

#[test]
fn raster_dims_enforce_u16_limits() {
    let mut d = ImageDescriptor::new(Canvas::default(), PixelFormat::Rgba8888, None);
    assert_eq!(d.raster_dims().unwrap(), (256, 256));

    d.width = 70_000;
    assert!(d.raster_dims().is_err());

    d.width = 0;
    assert!(d.raster_dims().is_err());
}

#[test]
fn color_quantization_clamps_and_rounds() {
    assert_eq!(Color::rgba(1.5, -0.2, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    assert_eq!(Color::from_rgba8(1, 2, 3, 4).to_rgba8(), [1, 2, 3, 4]);
    assert_eq!(Color::rgba(f64::NAN, 0.0, 0.0, 0.0).to_rgba8(), [0, 0, 0, 0]);
}

#[test]
fn pixel_format_serde_names_are_snake_case() {
    let v = serde_json::to_value(PixelFormat::RgbaF16).unwrap();
    assert_eq!(v, serde_json::json!("rgba_f16"));
    let cs: ColorSpace = serde_json::from_value(serde_json::json!("srgb_linear")).unwrap();
    assert_eq!(cs, ColorSpace::SrgbLinear);
}
