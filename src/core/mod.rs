pub mod capture;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod display;
pub mod frame;
pub mod gif;
pub mod motion;
pub mod request;

pub use capture::{CaptureError, CaptureStatus, FrameSnapshot, Recorder, SnapshotRequest};
pub use config::{CaptureConfig, ConfigError, RenderConfig};
pub use display::{BackgroundMode, Command, DisplayState, Facing, Reaction};
pub use frame::{FrameInputs, Scene};
pub use request::{RequestGate, Settled, Ticket};
