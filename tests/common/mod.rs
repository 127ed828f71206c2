// Shared fakes for host-side tests: a recording drawing surface, a manual
// clock scheduler and an encoder backend that logs every call.

#![allow(dead_code)]

use glam::Vec2;
use glow_trail::core::capture::{
    CancelToken, CaptureError, CaptureOutput, EncoderBackend, FinishedCallback, FrameEncoder,
    FrameSnapshot, Recorder, Scheduler, SnapshotRequest,
};
use glow_trail::core::compositor::Surface;
use glow_trail::core::config::CaptureConfig;
use glow_trail::core::frame::Snapshot;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};
use std::time::Duration;

// ---------------- Surface ----------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FakeVideo(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Background(String),
    Video { id: u32, width: u32, height: u32 },
    Disc {
        center: Vec2,
        radius: f32,
        color: String,
        glow: f64,
    },
}

pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<Op>,
    /// Make every video draw fail.
    pub broken_video: bool,
    pub last_request: Cell<Option<SnapshotRequest>>,
    discs: u32,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            broken_video: false,
            last_request: Cell::new(None),
            discs: 0,
        }
    }
}

impl Surface for RecordingSurface {
    type Video = FakeVideo;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_background(&mut self, color: &str) {
        self.ops.push(Op::Background(color.to_string()));
    }

    fn draw_video(&mut self, frame: &FakeVideo, width: u32, height: u32) -> bool {
        if self.broken_video {
            return false;
        }
        self.ops.push(Op::Video {
            id: frame.0,
            width,
            height,
        });
        true
    }

    fn fill_glowing_disc(&mut self, center: Vec2, radius: f32, color: &str, glow_blur: f64) {
        self.discs += 1;
        self.ops.push(Op::Disc {
            center,
            radius,
            color: color.to_string(),
            glow: glow_blur,
        });
    }
}

impl Snapshot for RecordingSurface {
    /// A 1x1 frame whose red channel is the number of discs drawn so far.
    fn snapshot(&self, request: SnapshotRequest) -> Option<FrameSnapshot> {
        self.last_request.set(Some(request));
        Some(FrameSnapshot {
            width: 1,
            height: 1,
            rgba: vec![self.discs as u8, 0, 0, 255],
            delay_ms: request.delay_ms,
        })
    }
}

// ---------------- Scheduler ----------------

struct Pending {
    due_ms: u64,
    task: Option<Box<dyn FnOnce()>>,
    cancelled: Rc<Cell<bool>>,
}

#[derive(Default)]
struct Clock {
    now_ms: Cell<u64>,
    pending: RefCell<Vec<Pending>>,
    ignore_cancel: Cell<bool>,
}

/// Deterministic timer queue driven by `advance_to`.
#[derive(Clone, Default)]
pub struct ManualScheduler(Rc<Clock>);

pub struct ManualToken {
    cancelled: Rc<Cell<bool>>,
    ignore: bool,
}

impl CancelToken for ManualToken {
    fn cancel(self) {
        if !self.ignore {
            self.cancelled.set(true);
        }
    }
}

impl ManualScheduler {
    /// Tokens handed out from now on do nothing when cancelled.
    pub fn ignore_cancellation(&self) {
        self.0.ignore_cancel.set(true);
    }

    pub fn now_ms(&self) -> u64 {
        self.0.now_ms.get()
    }

    pub fn pending_count(&self) -> usize {
        self.0
            .pending
            .borrow()
            .iter()
            .filter(|p| p.task.is_some() && !p.cancelled.get())
            .count()
    }

    /// Move the clock forward, running every due, uncancelled task in order.
    pub fn advance_to(&self, ms: u64) {
        self.0.now_ms.set(ms);
        loop {
            let next = {
                let mut pending = self.0.pending.borrow_mut();
                pending
                    .iter_mut()
                    .filter(|p| p.due_ms <= ms && !p.cancelled.get())
                    .find_map(|p| p.task.take())
            };
            match next {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    type Token = ManualToken;

    fn schedule_once(&self, after: Duration, task: Box<dyn FnOnce()>) -> ManualToken {
        let cancelled = Rc::new(Cell::new(false));
        self.0.pending.borrow_mut().push(Pending {
            due_ms: self.0.now_ms.get() + after.as_millis() as u64,
            task: Some(task),
            cancelled: cancelled.clone(),
        });
        ManualToken {
            cancelled,
            ignore: self.0.ignore_cancel.get(),
        }
    }
}

// ---------------- Encoder backend ----------------

#[derive(Default)]
pub struct BackendLog {
    pub acquired: usize,
    pub released: Vec<u32>,
    pub constructed: usize,
    pub frames: Vec<FrameSnapshot>,
    pub finalized: usize,
    pub pending_finish: Option<FinishedCallback>,
    /// Make `add_frame` fail.
    pub reject_frames: bool,
}

/// Acquisition stays pending until the gate opens.
#[derive(Clone, Default)]
pub struct Gate(pub Rc<Cell<bool>>);

impl Future for Gate {
    type Output = ();
    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.0.get() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

pub struct FakeWorker(pub u32);

pub struct FakeEncoder {
    log: Rc<RefCell<BackendLog>>,
}

impl FrameEncoder for FakeEncoder {
    fn add_frame(&mut self, frame: FrameSnapshot) -> Result<(), CaptureError> {
        let mut log = self.log.borrow_mut();
        if log.reject_frames {
            return Err(CaptureError::Allocation("queue full".into()));
        }
        log.frames.push(frame);
        Ok(())
    }

    fn finalize(self, on_finished: FinishedCallback) {
        let mut log = self.log.borrow_mut();
        log.finalized += 1;
        log.pending_finish = Some(on_finished);
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub log: Rc<RefCell<BackendLog>>,
    pub unavailable: bool,
    pub fail_acquire: bool,
    pub fail_construct: bool,
    pub gate: Option<Gate>,
    pub next_id: Rc<Cell<u32>>,
}

impl FakeBackend {
    /// Run the completion callback the encoder is holding, if any.
    pub fn complete(&self, result: Result<Vec<u8>, CaptureError>) -> bool {
        let cb = self.log.borrow_mut().pending_finish.take();
        match cb {
            Some(cb) => {
                cb(result);
                true
            }
            None => false,
        }
    }
}

impl EncoderBackend for FakeBackend {
    type Worker = FakeWorker;
    type Encoder = FakeEncoder;

    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn acquire_worker(&self) -> impl Future<Output = Result<FakeWorker, CaptureError>> {
        let gate = self.gate.clone();
        let fail = self.fail_acquire;
        let log = self.log.clone();
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        async move {
            if let Some(g) = gate {
                g.await;
            }
            if fail {
                return Err(CaptureError::WorkerAcquisition("worker script offline".into()));
            }
            log.borrow_mut().acquired += 1;
            Ok(FakeWorker(id))
        }
    }

    fn construct(&self, _worker: &FakeWorker, _quality: i32) -> Result<FakeEncoder, CaptureError> {
        if self.fail_construct {
            return Err(CaptureError::EncoderInit("bad options".into()));
        }
        self.log.borrow_mut().constructed += 1;
        Ok(FakeEncoder {
            log: self.log.clone(),
        })
    }

    fn release_worker(&self, worker: FakeWorker) {
        self.log.borrow_mut().released.push(worker.0);
    }
}

// ---------------- Output ----------------

#[derive(Clone, Default)]
pub struct FakeOutput {
    pub delivered: Rc<RefCell<Vec<(Vec<u8>, String)>>>,
    pub errors: Rc<RefCell<Vec<CaptureError>>>,
}

impl CaptureOutput for FakeOutput {
    fn deliver(&self, bytes: Vec<u8>, file_name: &str) {
        self.delivered
            .borrow_mut()
            .push((bytes, file_name.to_string()));
    }

    fn notify_error(&self, error: &CaptureError) {
        self.errors.borrow_mut().push(error.clone());
    }
}

pub type FakeRecorder = Recorder<FakeBackend, ManualScheduler, FakeOutput>;

pub fn capture_config(duration_ms: u64) -> CaptureConfig {
    CaptureConfig {
        duration: Duration::from_millis(duration_ms),
        ..CaptureConfig::default()
    }
}

pub fn recorder(backend: &FakeBackend, duration_ms: u64) -> (FakeRecorder, ManualScheduler, FakeOutput) {
    recorder_with(backend, capture_config(duration_ms))
}

pub fn recorder_with(
    backend: &FakeBackend,
    config: CaptureConfig,
) -> (FakeRecorder, ManualScheduler, FakeOutput) {
    let scheduler = ManualScheduler::default();
    let output = FakeOutput::default();
    let rec = Recorder::new(backend.clone(), scheduler.clone(), output.clone(), config);
    (rec, scheduler, output)
}

/// A solid RGBA frame of the given size.
pub fn rgba_frame(width: u32, height: u32, delay_ms: u32) -> FrameSnapshot {
    FrameSnapshot {
        width,
        height,
        rgba: vec![128; (width * height * 4) as usize],
        delay_ms,
    }
}

// ---------------- Futures ----------------

fn noop_raw_waker() -> RawWaker {
    fn clone(_: *const ()) -> RawWaker {
        noop_raw_waker()
    }
    fn noop(_: *const ()) {}
    static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
    RawWaker::new(std::ptr::null(), &VTABLE)
}

/// Poll a future once without blocking.
pub fn poll_once<F: Future + ?Sized>(fut: Pin<&mut F>) -> Poll<F::Output> {
    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    fut.poll(&mut cx)
}
