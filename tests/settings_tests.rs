//! Renderer Settings Tests
//!
//! Tests for:
//! - Defaults and JSON loading with partial documents
//! - Validation of pool size, resolution, clear color and ambient
//! - Frame uniforms derived from settings

use umbra::errors::UmbraError;
use umbra::renderer::RendererSettings;
use umbra::renderer::core::uniforms::FrameUniforms;
use umbra::renderer::settings::MAX_SHADOW_MAPS;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn defaults_are_valid() {
    init_logger();
    let settings = RendererSettings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.shadow_map_pool_size, 4);
    assert_eq!(settings.shadow_map_resolution, 2048);
    assert!(settings.validate_frames);
}

#[test]
fn partial_json_fills_defaults() {
    init_logger();
    let settings = RendererSettings::from_json_str(
        r#"{ "shadow_map_pool_size": 2, "clear_color": [0.1, 0.2, 0.3, 1.0] }"#,
    )
    .unwrap();

    assert_eq!(settings.shadow_map_pool_size, 2);
    assert_eq!(settings.shadow_map_resolution, 2048);
    assert_eq!(settings.clear_color().g, 0.2);
    assert_eq!(settings.shader_dir, None);
}

#[test]
fn json_round_trip_preserves_settings() {
    init_logger();
    let settings = RendererSettings {
        shadow_map_pool_size: 8,
        shadow_map_resolution: 512,
        ambient: [0.1, 0.1, 0.2],
        active_camera: 1,
        shader_dir: Some("shaders".into()),
        ..Default::default()
    };
    let json = serde_json::to_string(&settings).unwrap();
    assert_eq!(RendererSettings::from_json_str(&json).unwrap(), settings);
}

#[test]
fn malformed_json_is_a_json_error() {
    init_logger();
    assert!(matches!(
        RendererSettings::from_json_str("{ \"shadow_map_pool_size\": \"four\" }"),
        Err(UmbraError::Json(_))
    ));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn invalid_values_are_rejected() {
    init_logger();
    let cases = [
        RendererSettings {
            shadow_map_pool_size: 0,
            ..Default::default()
        },
        RendererSettings {
            shadow_map_pool_size: MAX_SHADOW_MAPS + 1,
            ..Default::default()
        },
        RendererSettings {
            shadow_map_resolution: 0,
            ..Default::default()
        },
        RendererSettings {
            shadow_map_resolution: 1000,
            ..Default::default()
        },
        RendererSettings {
            clear_color: [1.5, 0.0, 0.0, 1.0],
            ..Default::default()
        },
        RendererSettings {
            ambient: [-0.1, 0.0, 0.0],
            ..Default::default()
        },
        RendererSettings {
            ambient: [f32::NAN, 0.0, 0.0],
            ..Default::default()
        },
    ];

    for settings in cases {
        assert!(
            matches!(settings.validate(), Err(UmbraError::InvalidSettings(_))),
            "{settings:?} should be rejected"
        );
    }
}

#[test]
fn json_loading_validates() {
    init_logger();
    assert!(matches!(
        RendererSettings::from_json_str(r#"{ "shadow_map_resolution": 3 }"#),
        Err(UmbraError::InvalidSettings(_))
    ));
}

// ============================================================================
// Frame Uniforms
// ============================================================================

#[test]
fn frame_uniforms_follow_settings() {
    init_logger();
    let settings = RendererSettings {
        shadow_map_pool_size: 2,
        ambient: [0.2, 0.3, 0.4],
        clear_color: [0.0, 0.0, 1.0, 1.0],
        ..Default::default()
    };

    let uniforms = FrameUniforms::new(&settings, (320, 200), 1, 1, 5);
    assert_eq!((uniforms.width, uniforms.height), (320, 200));
    assert_eq!(uniforms.light_count, 1);
    assert_eq!(uniforms.shadow_count, 1);
    assert_eq!(uniforms.pair_count, 5);
    assert_eq!(uniforms.ambient, [0.2, 0.3, 0.4, 0.0]);
    assert_eq!(uniforms.clear_color, [0.0, 0.0, 1.0, 1.0]);

    let many_lights = FrameUniforms::new(&settings, (320, 200), 1, 7, 0);
    assert_eq!(many_lights.shadow_count, 2);
}
