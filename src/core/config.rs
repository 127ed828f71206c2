//! Per-session render and capture configuration.
//!
//! A `RenderConfig` is fixed once the loop starts. The page URL query string
//! may override the numeric defaults (`?radius=80&easing=0.2`); settings are
//! never persisted.

use super::constants::*;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown config key `{0}`")]
    UnknownKey(String),
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },
    #[error("`{key}` out of range: {value}")]
    OutOfRange { key: &'static str, value: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub base_radius: f32,
    pub radius_step: f32,
    pub min_radius: f32,
    easing_factor: f32,
    pub jitter_intensity: f32,
    pub glow_blur: f64,
    pub circle_color: &'static str,
    pub normal_fade_color: &'static str,
    pub long_fade_color: &'static str,
    pub pulse_amplitude: f32,
    pub pulse_speed: f32,
    pub pinch_sensitivity: f32,
    pub capture: CaptureConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub duration: Duration,
    pub frame_delay_ms: u32,
    /// NeuQuant sample interval handed to the GIF encoder (1 = best, 30 = fastest).
    pub quality: i32,
    pub file_name: &'static str,
    /// Ceiling on raw RGBA bytes buffered during one session.
    pub max_buffered_bytes: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(GIF_DURATION_MS as u64),
            frame_delay_ms: GIF_FRAME_DELAY_MS,
            quality: GIF_QUALITY,
            file_name: GIF_FILE_NAME,
            max_buffered_bytes: GIF_BUFFER_LIMIT_BYTES,
        }
    }
}

impl CaptureConfig {
    /// Frames a session records at one frame per `frame_delay_ms`.
    pub fn expected_frames(&self) -> u64 {
        let ms = self.duration.as_millis() as u64;
        ms.div_ceil(self.frame_delay_ms.max(1) as u64).max(1)
    }

    /// Pixels per snapshot that keep a full session inside the buffer limit.
    pub fn frame_pixel_budget(&self) -> u64 {
        (self.max_buffered_bytes as u64 / self.expected_frames() / 4).max(1)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_radius: INITIAL_RADIUS,
            radius_step: RADIUS_STEP,
            min_radius: MIN_RADIUS,
            easing_factor: EASING_FACTOR,
            jitter_intensity: SHAKE_INTENSITY,
            glow_blur: GLOW_BLUR,
            circle_color: CIRCLE_COLOR,
            normal_fade_color: NORMAL_FADE_COLOR,
            long_fade_color: LONG_TAIL_FADE_COLOR,
            pulse_amplitude: PULSE_AMPLITUDE,
            pulse_speed: PULSE_SPEED,
            pinch_sensitivity: PINCH_SENSITIVITY,
            capture: CaptureConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Defaults with a different easing factor. The factor must lie in (0, 1].
    pub fn with_easing(easing_factor: f32) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.easing_factor = check_easing(easing_factor)?;
        Ok(cfg)
    }

    #[inline]
    pub fn easing_factor(&self) -> f32 {
        self.easing_factor
    }

    /// Build a config from a URL query string such as `?radius=80&easing=0.2`.
    ///
    /// Each bad pair is reported and skipped; the remaining pairs still apply.
    pub fn from_query(query: &str) -> (Self, Vec<ConfigError>) {
        let mut cfg = Self::default();
        let mut errors = Vec::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if let Err(e) = cfg.apply_pair(key, value) {
                errors.push(e);
            }
        }
        (cfg, errors)
    }

    fn apply_pair(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let parse = |v: &str| -> Result<f64, ConfigError> {
            v.parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: v.to_string(),
                })
        };
        match key {
            "radius" => {
                let r = parse(value)? as f32;
                self.base_radius = r.max(self.min_radius);
            }
            "step" => self.radius_step = positive("step", parse(value)?)? as f32,
            "easing" => self.easing_factor = check_easing(parse(value)? as f32)?,
            "jitter" => self.jitter_intensity = non_negative("jitter", parse(value)?)? as f32,
            "glow" => self.glow_blur = non_negative("glow", parse(value)?)?,
            "pulse_amp" => {
                self.pulse_amplitude = non_negative("pulse_amp", parse(value)?)? as f32
            }
            "pulse_speed" => {
                self.pulse_speed = non_negative("pulse_speed", parse(value)?)? as f32
            }
            "pinch" => self.pinch_sensitivity = positive("pinch", parse(value)?)? as f32,
            "capture_ms" => {
                let ms = positive("capture_ms", parse(value)?)?;
                self.capture.duration = Duration::from_millis(ms as u64);
            }
            "capture_mb" => {
                let mb = positive("capture_mb", parse(value)?)?;
                self.capture.max_buffered_bytes = (mb * 1024.0 * 1024.0) as usize;
            }
            "quality" => {
                let q = parse(value)?;
                if !(1.0..=30.0).contains(&q) {
                    return Err(ConfigError::OutOfRange {
                        key: "quality",
                        value: q,
                    });
                }
                self.capture.quality = q as i32;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

fn check_easing(e: f32) -> Result<f32, ConfigError> {
    if e > 0.0 && e <= 1.0 {
        Ok(e)
    } else {
        Err(ConfigError::OutOfRange {
            key: "easing",
            value: e as f64,
        })
    }
}

fn positive(key: &'static str, v: f64) -> Result<f64, ConfigError> {
    if v > 0.0 {
        Ok(v)
    } else {
        Err(ConfigError::OutOfRange { key, value: v })
    }
}

fn non_negative(key: &'static str, v: f64) -> Result<f64, ConfigError> {
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(ConfigError::OutOfRange { key, value: v })
    }
}
