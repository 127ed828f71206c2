//! Capture session state machine.
//!
//! `idle → acquiring → recording → rendering → idle`, with
//! `acquiring → error → idle` when the encoder cannot be set up. At most one
//! session is live per `Recorder`; a start request while not idle is rejected,
//! never queued.
//!
//! The recording window is closed by a task handed to a [`Scheduler`]. Tearing
//! the session down cancels that task, so the late-firing transition cannot
//! observe a half-cleared session. A scheduler that cannot cancel is still safe:
//! a stale firing finds no encoder, releases whatever is left and stays idle.

use super::config::CaptureConfig;
use instant::Instant;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    /// Start accepted; waiting on the encoder's worker resource.
    Acquiring,
    Recording,
    Rendering,
    Error,
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaptureStatus::Idle => "idle",
            CaptureStatus::Acquiring => "acquiring",
            CaptureStatus::Recording => "recording",
            CaptureStatus::Rendering => "rendering",
            CaptureStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaptureError {
    #[error("cannot start recording, current status: {0}")]
    AlreadyActive(CaptureStatus),
    #[error("GIF encoder is not available; recording is disabled")]
    Unavailable,
    #[error("could not acquire the encoder worker: {0}")]
    WorkerAcquisition(String),
    #[error("could not construct the encoder: {0}")]
    EncoderInit(String),
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("capture buffer limit of {limit} bytes reached; recording stopped")]
    BufferLimit { limit: usize },
    #[error("out of memory while recording: {0}")]
    Allocation(String),
}

/// A copy of the rendered canvas, tagged with its display delay.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
    pub delay_ms: u32,
}

/// What the recorder asks of the surface for one captured frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub delay_ms: u32,
    /// Upper bound on `width * height` of the returned frame.
    pub max_pixels: u64,
}

impl SnapshotRequest {
    /// Largest size with the aspect ratio of `width x height` that fits the
    /// pixel budget. Never smaller than 1x1.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        let area = width as u64 * height as u64;
        if area <= self.max_pixels {
            return (width, height);
        }
        let scale = (self.max_pixels as f64 / area as f64).sqrt();
        let mut w = ((width as f64 * scale).floor() as u32).clamp(1, width);
        let mut h = ((height as f64 * scale).floor() as u32).clamp(1, height);
        // A side pinned at 1 can leave the other over budget on thin frames.
        if w as u64 * h as u64 > self.max_pixels {
            if w >= h {
                w = (self.max_pixels / h as u64).max(1) as u32;
            } else {
                h = (self.max_pixels / w as u64).max(1) as u32;
            }
        }
        (w, h)
    }
}

pub type FinishedCallback = Box<dyn FnOnce(Result<Vec<u8>, CaptureError>)>;

/// An encoder instance bound to one session.
pub trait FrameEncoder {
    /// Append a frame. Frames are encoded in the order they are added. An
    /// error ends the session.
    fn add_frame(&mut self, frame: FrameSnapshot) -> Result<(), CaptureError>;
    /// Finish encoding. `on_finished` runs exactly once, after every added
    /// frame has been consumed; it may run on a later task.
    fn finalize(self, on_finished: FinishedCallback);
}

/// Factory for encoders plus the auxiliary worker resource they run on.
pub trait EncoderBackend {
    type Worker;
    type Encoder: FrameEncoder;

    fn is_available(&self) -> bool;
    fn acquire_worker(&self) -> impl Future<Output = Result<Self::Worker, CaptureError>>;
    /// Construction failures are synchronous and happen before any frame.
    fn construct(&self, worker: &Self::Worker, quality: i32)
        -> Result<Self::Encoder, CaptureError>;
    fn release_worker(&self, worker: Self::Worker);
}

pub trait CancelToken {
    fn cancel(self);
}

/// One-shot delayed task runner.
pub trait Scheduler {
    type Token: CancelToken;
    fn schedule_once(&self, after: Duration, task: Box<dyn FnOnce()>) -> Self::Token;
}

/// Where finished captures and user-facing failures go.
pub trait CaptureOutput {
    fn deliver(&self, bytes: Vec<u8>, file_name: &str);
    fn notify_error(&self, error: &CaptureError);
}

struct Session<B: EncoderBackend, T> {
    status: CaptureStatus,
    generation: u64,
    started_at: Option<Instant>,
    encoder: Option<B::Encoder>,
    worker: Option<B::Worker>,
    deadline: Option<T>,
    frames_fed: usize,
    /// Snapshot bytes handed to the encoder this session.
    buffered_bytes: usize,
}

impl<B: EncoderBackend, T> Session<B, T> {
    fn reset(&mut self) {
        self.status = CaptureStatus::Idle;
        self.started_at = None;
        self.encoder = None;
        self.buffered_bytes = 0;
    }
}

struct Inner<B: EncoderBackend, S: Scheduler, O> {
    backend: B,
    scheduler: S,
    output: O,
    config: CaptureConfig,
    session: RefCell<Session<B, S::Token>>,
}

/// Owner of the single capture session.
pub struct Recorder<B: EncoderBackend, S: Scheduler, O: CaptureOutput> {
    inner: Rc<Inner<B, S, O>>,
}

impl<B: EncoderBackend, S: Scheduler, O: CaptureOutput> Clone for Recorder<B, S, O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B, S, O> Recorder<B, S, O>
where
    B: EncoderBackend + 'static,
    S: Scheduler + 'static,
    O: CaptureOutput + 'static,
{
    pub fn new(backend: B, scheduler: S, output: O, config: CaptureConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                backend,
                scheduler,
                output,
                config,
                session: RefCell::new(Session {
                    status: CaptureStatus::Idle,
                    generation: 0,
                    started_at: None,
                    encoder: None,
                    worker: None,
                    deadline: None,
                    frames_fed: 0,
                    buffered_bytes: 0,
                }),
            }),
        }
    }

    pub fn status(&self) -> CaptureStatus {
        self.inner.session.borrow().status
    }

    pub fn is_recording(&self) -> bool {
        self.status() == CaptureStatus::Recording
    }

    pub fn frames_fed(&self) -> usize {
        self.inner.session.borrow().frames_fed
    }

    /// Time left in the recording window, if recording.
    pub fn remaining(&self) -> Option<Duration> {
        let s = self.inner.session.borrow();
        match (s.status, s.started_at) {
            (CaptureStatus::Recording, Some(t0)) => {
                Some(self.inner.config.duration.saturating_sub(t0.elapsed()))
            }
            _ => None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Start a capture session.
    ///
    /// Suspends while the worker resource is acquired. Every failure except
    /// `AlreadyActive` is also reported through [`CaptureOutput::notify_error`];
    /// the recorder is idle again when this returns an error.
    pub async fn start(&self) -> Result<(), CaptureError> {
        let generation = self.begin()?;

        let worker = match self.inner.backend.acquire_worker().await {
            Ok(w) => w,
            Err(e) => {
                self.fail_start(generation, e.clone());
                return Err(e);
            }
        };
        let encoder = match self
            .inner
            .backend
            .construct(&worker, self.inner.config.quality)
        {
            Ok(enc) => enc,
            Err(e) => {
                self.inner.backend.release_worker(worker);
                self.fail_start(generation, e.clone());
                return Err(e);
            }
        };

        {
            let mut s = self.inner.session.borrow_mut();
            if s.generation != generation || s.status != CaptureStatus::Acquiring {
                // Torn down while the worker was being acquired.
                drop(s);
                drop(encoder);
                self.inner.backend.release_worker(worker);
                log::info!("[capture] session cleared during start; worker released");
                return Ok(());
            }
            s.status = CaptureStatus::Recording;
            s.started_at = Some(Instant::now());
            s.encoder = Some(encoder);
            s.worker = Some(worker);
            s.frames_fed = 0;
            s.buffered_bytes = 0;
        }
        log::info!(
            "[capture] recording for {:.1}s",
            self.inner.config.duration.as_secs_f32()
        );

        let weak: Weak<Inner<B, S, O>> = Rc::downgrade(&self.inner);
        let token = self.inner.scheduler.schedule_once(
            self.inner.config.duration,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Recorder { inner }.on_deadline(generation);
                }
            }),
        );
        let mut s = self.inner.session.borrow_mut();
        if s.generation == generation && s.status == CaptureStatus::Recording {
            s.deadline = Some(token);
        }
        Ok(())
    }

    fn begin(&self) -> Result<u64, CaptureError> {
        let mut s = self.inner.session.borrow_mut();
        if s.status != CaptureStatus::Idle {
            let err = CaptureError::AlreadyActive(s.status);
            log::warn!("[capture] {}", err);
            return Err(err);
        }
        if !self.inner.backend.is_available() {
            drop(s);
            let err = CaptureError::Unavailable;
            log::error!("[capture] {}", err);
            self.inner.output.notify_error(&err);
            return Err(err);
        }
        s.generation = s.generation.wrapping_add(1);
        s.status = CaptureStatus::Acquiring;
        Ok(s.generation)
    }

    fn fail_start(&self, generation: u64, err: CaptureError) {
        log::error!("[capture] {}", err);
        {
            let mut s = self.inner.session.borrow_mut();
            if s.generation != generation || s.status != CaptureStatus::Acquiring {
                return;
            }
            s.status = CaptureStatus::Error;
        }
        self.inner.output.notify_error(&err);
        self.inner.session.borrow_mut().reset();
    }

    /// Hand one frame to the encoder if recording. `snapshot` is only invoked
    /// while a session is recording; the request carries the constant frame
    /// delay and the per-frame pixel budget.
    ///
    /// Going over `max_buffered_bytes` ends the session with
    /// [`CaptureError::BufferLimit`] instead of growing without bound.
    pub fn feed_with(
        &self,
        snapshot: impl FnOnce(SnapshotRequest) -> Option<FrameSnapshot>,
    ) -> bool {
        {
            let s = self.inner.session.borrow();
            if s.status != CaptureStatus::Recording || s.encoder.is_none() {
                return false;
            }
        }
        let request = SnapshotRequest {
            delay_ms: self.inner.config.frame_delay_ms,
            max_pixels: self.inner.config.frame_pixel_budget(),
        };
        let Some(frame) = snapshot(request) else {
            return false;
        };

        let (generation, err) = {
            let mut s = self.inner.session.borrow_mut();
            let limit = self.inner.config.max_buffered_bytes;
            let total = s.buffered_bytes.saturating_add(frame.rgba.len());
            if total > limit {
                (s.generation, CaptureError::BufferLimit { limit })
            } else {
                let Some(encoder) = s.encoder.as_mut() else {
                    return false;
                };
                match encoder.add_frame(frame) {
                    Ok(()) => {
                        s.buffered_bytes = total;
                        s.frames_fed += 1;
                        return true;
                    }
                    Err(e) => (s.generation, e),
                }
            }
        };
        self.abort_recording(generation, err);
        false
    }

    /// End a recording session without encoding and tell the user why.
    fn abort_recording(&self, generation: u64, err: CaptureError) {
        let (token, encoder, worker) = {
            let mut s = self.inner.session.borrow_mut();
            if s.generation != generation || s.status != CaptureStatus::Recording {
                return;
            }
            s.status = CaptureStatus::Error;
            (s.deadline.take(), s.encoder.take(), s.worker.take())
        };
        log::error!("[capture] {}", err);
        if let Some(t) = token {
            t.cancel();
        }
        drop(encoder);
        if let Some(w) = worker {
            self.inner.backend.release_worker(w);
        }
        self.inner.output.notify_error(&err);
        self.inner.session.borrow_mut().reset();
    }

    /// Tear the session down without encoding: cancels the pending transition,
    /// drops the encoder and releases the worker.
    pub fn clear(&self) {
        let (token, encoder, worker) = {
            let mut s = self.inner.session.borrow_mut();
            if s.status == CaptureStatus::Idle && s.worker.is_none() {
                return;
            }
            let parts = (s.deadline.take(), s.encoder.take(), s.worker.take());
            s.reset();
            parts
        };
        if let Some(t) = token {
            t.cancel();
        }
        drop(encoder);
        if let Some(w) = worker {
            self.inner.backend.release_worker(w);
        }
        log::info!("[capture] session cleared");
    }

    fn on_deadline(&self, generation: u64) {
        let encoder = {
            let mut s = self.inner.session.borrow_mut();
            if s.generation != generation {
                return;
            }
            s.deadline = None;
            let taken = s.encoder.take();
            match (s.status, taken) {
                (CaptureStatus::Recording, Some(enc)) => {
                    s.status = CaptureStatus::Rendering;
                    log::info!(
                        "[capture] recording finished after {} frames, rendering GIF",
                        s.frames_fed
                    );
                    enc
                }
                (_, stray) => {
                    let worker = s.worker.take();
                    s.reset();
                    drop(s);
                    drop(stray);
                    if let Some(w) = worker {
                        self.inner.backend.release_worker(w);
                    }
                    return;
                }
            }
        };

        let weak: Weak<Inner<B, S, O>> = Rc::downgrade(&self.inner);
        encoder.finalize(Box::new(move |result| {
            if let Some(inner) = weak.upgrade() {
                Recorder { inner }.on_finished(generation, result);
            }
        }));
    }

    fn on_finished(&self, generation: u64, result: Result<Vec<u8>, CaptureError>) {
        let worker = {
            let mut s = self.inner.session.borrow_mut();
            if s.generation != generation || s.status != CaptureStatus::Rendering {
                log::info!("[capture] discarding output of a cleared session");
                return;
            }
            s.reset();
            s.worker.take()
        };
        match result {
            Ok(bytes) => {
                log::info!(
                    "[capture] GIF ready ({} bytes), preparing download",
                    bytes.len()
                );
                self.inner
                    .output
                    .deliver(bytes, self.inner.config.file_name);
            }
            Err(e) => {
                log::error!("[capture] {}", e);
                self.inner.output.notify_error(&e);
            }
        }
        if let Some(w) = worker {
            self.inner.backend.release_worker(w);
        }
    }
}
