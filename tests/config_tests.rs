// Host-side tests for default constants and URL query overrides.

use glow_trail::core::config::{ConfigError, RenderConfig};
use glow_trail::core::constants::*;
use std::time::Duration;

#[test]
#[allow(clippy::assertions_on_constants)]
fn constants_are_within_reasonable_bounds() {
    assert!(MIN_RADIUS > 0.0);
    assert!(INITIAL_RADIUS >= MIN_RADIUS);
    assert!(RADIUS_STEP > 0.0);
    assert!(EASING_FACTOR > 0.0 && EASING_FACTOR <= 1.0);
    assert!(SHAKE_INTENSITY >= 0.0);
    assert!(PULSE_AMPLITUDE < INITIAL_RADIUS, "pulse must not invert the disc");
    assert!((1..=30).contains(&GIF_QUALITY));
    assert!(GIF_FRAME_DELAY_MS > 0 && GIF_FRAME_DELAY_MS < GIF_DURATION_MS);
}

#[test]
fn long_tail_fades_slower_than_normal() {
    fn alpha(css: &str) -> f32 {
        css.trim_end_matches(')')
            .rsplit(',')
            .next()
            .and_then(|a| a.trim().parse().ok())
            .expect("rgba colour")
    }
    assert!(alpha(LONG_TAIL_FADE_COLOR) < alpha(NORMAL_FADE_COLOR));
}

#[test]
fn defaults_follow_constants() {
    let cfg = RenderConfig::default();
    assert_eq!(cfg.base_radius, INITIAL_RADIUS);
    assert_eq!(cfg.easing_factor(), EASING_FACTOR);
    assert_eq!(cfg.capture.duration, Duration::from_secs(10));
    assert_eq!(cfg.capture.frame_delay_ms, 16);
    assert_eq!(cfg.capture.file_name, "wuslon.gif");
}

#[test]
fn easing_must_be_in_unit_interval() {
    assert!(RenderConfig::with_easing(0.25).is_ok());
    assert!(RenderConfig::with_easing(1.0).is_ok());
    for bad in [0.0, -0.1, 1.5, f32::NAN] {
        assert!(
            matches!(
                RenderConfig::with_easing(bad),
                Err(ConfigError::OutOfRange { key: "easing", .. })
            ),
            "easing {} accepted",
            bad
        );
    }
}

#[test]
fn query_overrides_apply() {
    let (cfg, errors) =
        RenderConfig::from_query("?radius=80&easing=0.2&jitter=0&capture_ms=3000&quality=5");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(cfg.base_radius, 80.0);
    assert_eq!(cfg.easing_factor(), 0.2);
    assert_eq!(cfg.jitter_intensity, 0.0);
    assert_eq!(cfg.capture.duration, Duration::from_millis(3000));
    assert_eq!(cfg.capture.quality, 5);
}

#[test]
fn empty_query_gives_defaults() {
    let (cfg, errors) = RenderConfig::from_query("");
    assert!(errors.is_empty());
    assert_eq!(cfg, RenderConfig::default());
}

#[test]
fn bad_pairs_are_reported_and_skipped() {
    let (cfg, errors) = RenderConfig::from_query("radius=abc&volume=3&easing=2&step=7");
    assert_eq!(cfg.base_radius, INITIAL_RADIUS);
    assert_eq!(cfg.easing_factor(), EASING_FACTOR);
    assert_eq!(cfg.radius_step, 7.0, "valid pairs still apply");
    assert_eq!(errors.len(), 3);
    assert!(matches!(errors[0], ConfigError::InvalidValue { ref key, .. } if key == "radius"));
    assert_eq!(errors[1], ConfigError::UnknownKey("volume".to_string()));
    assert!(matches!(errors[2], ConfigError::OutOfRange { key: "easing", .. }));
}

#[test]
fn query_radius_is_clamped_to_floor() {
    let (cfg, errors) = RenderConfig::from_query("radius=2");
    assert!(errors.is_empty());
    assert_eq!(cfg.base_radius, MIN_RADIUS);
}

#[test]
fn quality_outside_encoder_range_is_rejected() {
    let (cfg, errors) = RenderConfig::from_query("quality=0&glow=-1");
    assert_eq!(cfg.capture.quality, GIF_QUALITY);
    assert_eq!(cfg.glow_blur, GLOW_BLUR);
    assert_eq!(errors.len(), 2);
}

#[test]
fn capture_buffer_budget_follows_duration() {
    let cfg = RenderConfig::default();
    assert_eq!(cfg.capture.max_buffered_bytes, GIF_BUFFER_LIMIT_BYTES);
    assert_eq!(cfg.capture.expected_frames(), 625, "10 s at 16 ms");
    assert_eq!(cfg.capture.frame_pixel_budget(), 322_122);

    let (short, errors) = RenderConfig::from_query("capture_ms=1000&capture_mb=64");
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(short.capture.max_buffered_bytes, 64 * 1024 * 1024);
    assert_eq!(short.capture.expected_frames(), 63);
    assert!(short.capture.frame_pixel_budget() * 4 * 63 <= 64 * 1024 * 1024);
}
