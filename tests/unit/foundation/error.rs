use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LiveDrawError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(LiveDrawError::config("x").to_string().contains("config error:"));
    assert!(
        LiveDrawError::runtime("x")
            .to_string()
            .contains("runtime error:")
    );
    assert!(LiveDrawError::render("x").to_string().contains("render error:"));
    assert!(
        LiveDrawError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LiveDrawError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
