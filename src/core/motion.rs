use super::config::RenderConfig;
use glam::Vec2;
use rand::Rng;

/// Result of one motion update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionStep {
    /// Eased position; becomes the next frame's `current`.
    pub position: Vec2,
    /// One-frame vibration, applied to the draw position only.
    pub jitter: Vec2,
    pub radius: f32,
}

impl MotionStep {
    #[inline]
    pub fn draw_position(&self) -> Vec2 {
        self.position + self.jitter
    }
}

/// Exponential smoothing toward `target`. Frame-rate dependent: one call per
/// refresh closes `easing` of the remaining distance.
#[inline]
pub fn ease_toward(current: Vec2, target: Vec2, easing: f32) -> Vec2 {
    current + (target - current) * easing
}

/// Two independent uniform draws in `[-intensity, +intensity]`.
#[inline]
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, intensity: f32) -> Vec2 {
    if intensity <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        rng.gen_range(-intensity..=intensity),
        rng.gen_range(-intensity..=intensity),
    )
}

/// Sinusoidal radius offset driven by wall-clock time, so the pulse rate does
/// not depend on the frame rate.
#[inline]
pub fn pulse_offset(elapsed_ms: f64, speed: f32, amplitude: f32) -> f32 {
    ((elapsed_ms * speed as f64).sin() as f32) * amplitude
}

#[inline]
pub fn effective_radius(
    base_radius: f32,
    pulsation: bool,
    elapsed_ms: f64,
    config: &RenderConfig,
) -> f32 {
    if pulsation {
        base_radius + pulse_offset(elapsed_ms, config.pulse_speed, config.pulse_amplitude)
    } else {
        base_radius
    }
}

pub fn step<R: Rng + ?Sized>(
    current: Vec2,
    target: Vec2,
    base_radius: f32,
    pulsation: bool,
    elapsed_ms: f64,
    config: &RenderConfig,
    rng: &mut R,
) -> MotionStep {
    MotionStep {
        position: ease_toward(current, target, config.easing_factor()),
        jitter: jitter(rng, config.jitter_intensity),
        radius: effective_radius(base_radius, pulsation, elapsed_ms, config),
    }
}
