use super::*;

#[test]
fn empty_json_gives_defaults() {
    let cfg = LiveDrawConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, LiveDrawConfig::default());
    assert_eq!((cfg.width, cfg.height), (256, 256));
    assert_eq!(cfg.gpu_mode, GpuMode::Offscreen);
    assert_eq!(cfg.limits.max_steps, 5_000_000);
    cfg.validate().unwrap();
}

#[test]
fn default_configurations_follow_the_platform_format() {
    let confs = SurfaceConfiguration::defaults();
    let platform = PixelFormat::platform_default();
    let labels: Vec<&str> = confs.iter().map(|c| c.label.as_str()).collect();
    let srgb = format!("{} (sRGB)", platform.label());
    assert_eq!(labels, vec![platform.label(), srgb.as_str(), "F16 (sRGB Linear)"]);
    assert_eq!(confs[0].color_space, None);
    assert_eq!(confs[2].pixel_format, PixelFormat::RgbaF16);
}

#[test]
fn partial_json_overrides_fields() {
    let cfg = LiveDrawConfig::from_reader(
        r#"{
            "width": 64,
            "gpu_mode": "stub",
            "limits": { "max_steps": 99 },
            "configurations": [
                { "label": "plain", "pixel_format": "bgra8888" }
            ]
        }"#
        .as_bytes(),
    )
    .unwrap();
    assert_eq!((cfg.width, cfg.height), (64, 256));
    assert_eq!(cfg.gpu_mode, GpuMode::Stub);
    assert_eq!(cfg.limits.max_steps, 99);
    assert_eq!(cfg.limits.max_save_depth, 256);
    assert_eq!(cfg.configurations[0].color_space, None);
    cfg.validate().unwrap();
}

#[test]
fn validate_rejects_bad_values() {
    let zero = LiveDrawConfig {
        height: 0,
        ..LiveDrawConfig::default()
    };
    assert!(zero.validate().unwrap_err().to_string().starts_with("config error: "));

    let bad_index = LiveDrawConfig {
        selected_configuration: 3,
        ..LiveDrawConfig::default()
    };
    assert!(bad_index.validate().is_err());

    let none = LiveDrawConfig {
        configurations: Vec::new(),
        ..LiveDrawConfig::default()
    };
    assert!(none.validate().is_err());
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = LiveDrawConfig::from_reader("{ nope".as_bytes()).unwrap_err();
    assert!(matches!(err, LiveDrawError::Serde(_)));
}

#[test]
fn missing_file_is_a_config_error() {
    let err = LiveDrawConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, LiveDrawError::Config(_)));
}
