//! Per-frame compositing: background choice, then the glowing particle.

use super::config::RenderConfig;
use super::display::DisplayState;
use super::motion::MotionStep;
use glam::Vec2;

/// What fills the canvas before the particle is drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Background<'v, V> {
    /// Translucent fill; lower alpha keeps a longer trail.
    Fade(&'static str),
    /// Live camera frame scaled to cover the whole canvas. `fallback` is
    /// painted instead if the frame cannot be drawn.
    Video {
        frame: &'v V,
        fallback: &'static str,
    },
}

/// Drawing operations the compositor needs from a 2D target.
pub trait Surface {
    /// Decoded video frame type this surface can blit.
    type Video;

    fn size(&self) -> (u32, u32);
    fn fill_background(&mut self, color: &str);
    /// Returns `false` if the frame could not be drawn.
    fn draw_video(&mut self, frame: &Self::Video, width: u32, height: u32) -> bool;
    /// Filled disc with a soft glow; the glow must not outlive this call.
    fn fill_glowing_disc(&mut self, center: Vec2, radius: f32, color: &str, glow_blur: f64);
}

/// Pick the background. The fade fallback covers camera latency or failure:
/// augmented mode with no decoded frame yet still paints the fade colour.
pub fn choose_background<'v, V>(
    display: &DisplayState,
    live_frame: Option<&'v V>,
    config: &RenderConfig,
) -> Background<'v, V> {
    let fade = display.background.fade_color(config);
    match live_frame {
        Some(frame) if display.augmented => Background::Video {
            frame,
            fallback: fade,
        },
        _ => Background::Fade(fade),
    }
}

pub fn paint<S: Surface>(
    surface: &mut S,
    background: Background<'_, S::Video>,
    motion: &MotionStep,
    config: &RenderConfig,
) {
    let (w, h) = surface.size();
    match background {
        Background::Fade(color) => surface.fill_background(color),
        Background::Video { frame, fallback } => {
            if !surface.draw_video(frame, w, h) {
                surface.fill_background(fallback);
            }
        }
    }
    surface.fill_glowing_disc(
        motion.draw_position(),
        motion.radius.max(0.0),
        config.circle_color,
        config.glow_blur,
    );
}
