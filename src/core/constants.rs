/// Default look-and-feel and capture constants.
///
/// `RenderConfig::default()` is built from these; URL query overrides start
/// from the same values.
// Particle sizing (pixels)
pub const INITIAL_RADIUS: f32 = 60.0;
pub const RADIUS_STEP: f32 = 5.0;
pub const MIN_RADIUS: f32 = 10.0;

// Colours (CSS syntax, handed straight to the 2D context)
pub const CIRCLE_COLOR: &str = "#ffae00"; // glowing orange-yellow
pub const NORMAL_FADE_COLOR: &str = "rgba(0, 0, 0, 0.1)";
pub const LONG_TAIL_FADE_COLOR: &str = "rgba(0, 0, 0, 0.05)";

// Motion
pub const EASING_FACTOR: f32 = 0.1; // fraction of remaining distance closed per frame
pub const SHAKE_INTENSITY: f32 = 1.5; // half-width of the jitter distribution
pub const GLOW_BLUR: f64 = 15.0;

// Pulsation: radius += sin(elapsed_ms * speed) * amplitude
pub const PULSE_AMPLITUDE: f32 = 8.0;
pub const PULSE_SPEED: f32 = 0.005; // radians per millisecond

// Touch pinch: radius change per pixel of finger-distance change
pub const PINCH_SENSITIVITY: f32 = 0.5;

// Capture
pub const GIF_DURATION_MS: u32 = 10_000;
pub const GIF_FRAME_DELAY_MS: u32 = 16; // ~60fps
pub const GIF_QUALITY: i32 = 10; // NeuQuant sample interval, lower is better
pub const GIF_FILE_NAME: &str = "wuslon.gif";
// Raw snapshot bytes held for one session; wasm32 addresses at most 4 GiB.
pub const GIF_BUFFER_LIMIT_BYTES: usize = 768 * 1024 * 1024;

// HUD
pub const ERROR_NOTICE_MS: u64 = 5_000;
