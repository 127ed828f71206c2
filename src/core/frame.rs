//! One render-loop iteration, independent of the host scheduler.

use super::capture::{
    CaptureOutput, EncoderBackend, FrameSnapshot, Recorder, Scheduler, SnapshotRequest,
};
use super::compositor::{self, Surface};
use super::config::RenderConfig;
use super::display::DisplayState;
use super::motion::{self, MotionStep};
use glam::Vec2;
use rand::Rng;

/// A surface whose pixels can be copied out for capture.
pub trait Snapshot {
    /// Copy the current pixels, scaled down to `request.max_pixels` if needed.
    fn snapshot(&self, request: SnapshotRequest) -> Option<FrameSnapshot>;
}

pub struct FrameInputs<'a, V> {
    pub target: Vec2,
    pub display: &'a DisplayState,
    pub live_frame: Option<&'a V>,
    /// Wall-clock time since the loop started; drives pulsation.
    pub elapsed_ms: f64,
}

/// Loop-owned state. Only the loop writes `circle`; input handlers write the
/// target, which reaches the scene through `FrameInputs`.
pub struct Scene {
    config: RenderConfig,
    circle: Vec2,
}

impl Scene {
    pub fn new(config: RenderConfig, origin: Vec2) -> Self {
        Self {
            config,
            circle: origin,
        }
    }

    #[inline]
    pub fn circle(&self) -> Vec2 {
        self.circle
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Motion update followed by compositing.
    pub fn tick<S: Surface, R: Rng + ?Sized>(
        &mut self,
        surface: &mut S,
        inputs: &FrameInputs<'_, S::Video>,
        rng: &mut R,
    ) -> MotionStep {
        let step = motion::step(
            self.circle,
            inputs.target,
            inputs.display.radius(),
            inputs.display.pulsation,
            inputs.elapsed_ms,
            &self.config,
            rng,
        );
        self.circle = step.position;
        let background =
            compositor::choose_background(inputs.display, inputs.live_frame, &self.config);
        compositor::paint(surface, background, &step, &self.config);
        step
    }

    /// Full iteration: motion, compositing, then capture feed if recording.
    pub fn frame<S, R, B, Sch, O>(
        &mut self,
        surface: &mut S,
        inputs: &FrameInputs<'_, S::Video>,
        recorder: &Recorder<B, Sch, O>,
        rng: &mut R,
    ) -> MotionStep
    where
        S: Surface + Snapshot,
        R: Rng + ?Sized,
        B: EncoderBackend + 'static,
        Sch: Scheduler + 'static,
        O: CaptureOutput + 'static,
    {
        let step = self.tick(surface, inputs, rng);
        recorder.feed_with(|request| surface.snapshot(request));
        step
    }
}
