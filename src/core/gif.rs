//! Animated GIF encoder backend built on `image::codecs::gif`.
//!
//! Frames are queued while recording and encoded after `finalize`, one frame
//! per task turn, so the render loop keeps running while the GIF is built.
//! The queue is bounded by the recorder's buffer limit and the downscaled
//! snapshot size.
//! The worker resource is the output buffer the encoder writes into; it is
//! reserved up front so an allocation failure surfaces at start, not mid-encode.

use super::capture::{CaptureError, EncoderBackend, FinishedCallback, FrameEncoder, FrameSnapshot};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{imageops, Delay, Frame, RgbaImage};
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::rc::Rc;

pub type LocalTask = Pin<Box<dyn Future<Output = ()>>>;

/// Single-threaded task host for the encode job.
pub trait LocalSpawner: Clone + 'static {
    fn spawn(&self, task: LocalTask);
    /// Resolves on a later turn of the host's task queue.
    fn yield_now(&self) -> LocalTask;
}

/// Growable byte sink shared between the worker and its encoder.
#[derive(Clone, Default, Debug)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn with_reserved(capacity: usize) -> Result<Self, CaptureError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|e| CaptureError::WorkerAcquisition(e.to_string()))?;
        Ok(Self(Rc::new(RefCell::new(buf))))
    }

    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Incremental GIF writer. Every frame is fitted to the first frame's size:
/// larger frames are cropped, smaller ones padded with transparent pixels.
pub struct GifWriter<W: Write> {
    encoder: GifEncoder<W>,
    size: Option<(u32, u32)>,
    frames: usize,
}

impl<W: Write> GifWriter<W> {
    pub fn new(out: W, quality: i32) -> Result<Self, CaptureError> {
        let mut encoder = GifEncoder::new_with_speed(out, quality.clamp(1, 30));
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| CaptureError::EncoderInit(e.to_string()))?;
        Ok(Self {
            encoder,
            size: None,
            frames: 0,
        })
    }

    pub fn push(&mut self, frame: FrameSnapshot) -> Result<(), CaptureError> {
        let FrameSnapshot {
            width,
            height,
            rgba,
            delay_ms,
        } = frame;
        let img = RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| CaptureError::Encode("frame size mismatch".to_string()))?;
        let (w, h) = *self.size.get_or_insert((width, height));
        let img = if (width, height) == (w, h) {
            img
        } else {
            let mut fitted = RgbaImage::new(w, h);
            imageops::replace(&mut fitted, &img, 0, 0);
            fitted
        };
        let delay = Delay::from_numer_denom_ms(delay_ms, 1);
        self.encoder
            .encode_frame(Frame::from_parts(img, 0, 0, delay))
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        self.frames += 1;
        Ok(())
    }

    /// Write the trailer. An animation with no frames is an error.
    pub fn finish(self) -> Result<usize, CaptureError> {
        if self.frames == 0 {
            return Err(CaptureError::Encode("no frames captured".to_string()));
        }
        let frames = self.frames;
        drop(self.encoder);
        Ok(frames)
    }
}

pub struct GifWorker {
    out: SharedBuffer,
}

pub struct QueuedGifEncoder<Sp: LocalSpawner> {
    spawner: Sp,
    out: SharedBuffer,
    quality: i32,
    frames: Vec<FrameSnapshot>,
}

impl<Sp: LocalSpawner> FrameEncoder for QueuedGifEncoder<Sp> {
    fn add_frame(&mut self, frame: FrameSnapshot) -> Result<(), CaptureError> {
        self.frames
            .try_reserve(1)
            .map_err(|e| CaptureError::Allocation(e.to_string()))?;
        self.frames.push(frame);
        Ok(())
    }

    fn finalize(self, on_finished: FinishedCallback) {
        let Self {
            spawner,
            out,
            quality,
            frames,
        } = self;
        let yielder = spawner.clone();
        spawner.spawn(Box::pin(async move {
            let result = encode_cooperatively(&yielder, out, quality, frames).await;
            on_finished(result);
        }));
    }
}

async fn encode_cooperatively<Sp: LocalSpawner>(
    spawner: &Sp,
    out: SharedBuffer,
    quality: i32,
    frames: Vec<FrameSnapshot>,
) -> Result<Vec<u8>, CaptureError> {
    let mut writer = GifWriter::new(out.clone(), quality)?;
    for frame in frames {
        writer.push(frame)?;
        spawner.yield_now().await;
    }
    writer.finish()?;
    Ok(out.take())
}

/// Encode a whole sequence in one go.
pub fn encode_gif(
    frames: impl IntoIterator<Item = FrameSnapshot>,
    quality: i32,
) -> Result<Vec<u8>, CaptureError> {
    let out = SharedBuffer::default();
    let mut writer = GifWriter::new(out.clone(), quality)?;
    for frame in frames {
        writer.push(frame)?;
    }
    writer.finish()?;
    Ok(out.take())
}

pub struct GifBackend<Sp: LocalSpawner> {
    spawner: Sp,
    available: bool,
    capacity_hint: Cell<usize>,
}

impl<Sp: LocalSpawner> GifBackend<Sp> {
    pub fn new(spawner: Sp, available: bool) -> Self {
        Self {
            spawner,
            available,
            capacity_hint: Cell::new(0),
        }
    }

    /// Bytes reserved for the output buffer of the next session.
    pub fn set_capacity_hint(&self, bytes: usize) {
        self.capacity_hint.set(bytes);
    }
}

impl<Sp: LocalSpawner> EncoderBackend for GifBackend<Sp> {
    type Worker = GifWorker;
    type Encoder = QueuedGifEncoder<Sp>;

    fn is_available(&self) -> bool {
        self.available
    }

    fn acquire_worker(&self) -> impl Future<Output = Result<GifWorker, CaptureError>> {
        let capacity = self.capacity_hint.get();
        async move {
            Ok(GifWorker {
                out: SharedBuffer::with_reserved(capacity)?,
            })
        }
    }

    fn construct(
        &self,
        worker: &GifWorker,
        quality: i32,
    ) -> Result<QueuedGifEncoder<Sp>, CaptureError> {
        if !(1..=30).contains(&quality) {
            return Err(CaptureError::EncoderInit(format!(
                "quality {} outside 1..=30",
                quality
            )));
        }
        Ok(QueuedGifEncoder {
            spawner: self.spawner.clone(),
            out: worker.out.clone(),
            quality,
            frames: Vec::new(),
        })
    }

    fn release_worker(&self, worker: GifWorker) {
        log::debug!("[capture] releasing encoder buffer ({} bytes)", worker.out.len());
        drop(worker);
    }
}
