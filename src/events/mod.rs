pub mod keyboard;
pub mod pointer;

use crate::camera::VideoFeed;
use crate::core::config::RenderConfig;
use crate::core::display::{Command, DisplayState, Reaction};
use crate::core::request::Settled;
use crate::dom;
use crate::encoder::WebRecorder;
use glam::Vec2;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub use keyboard::wire_global_keydown;
pub use pointer::wire_input_handlers;

/// Shared handles the input handlers write through.
#[derive(Clone)]
pub struct InputWiring {
    pub canvas: web::HtmlCanvasElement,
    pub config: Rc<RenderConfig>,
    pub display: Rc<RefCell<DisplayState>>,
    pub target: Rc<Cell<Vec2>>,
    pub recorder: WebRecorder,
    pub camera: Rc<VideoFeed>,
}

/// Apply a command to the display state and run whatever it asks for.
pub fn dispatch(w: &InputWiring, cmd: Command) {
    let reaction = w.display.borrow_mut().apply(cmd, &w.config);
    match reaction {
        Reaction::None => {}
        Reaction::OpenCamera(facing) => {
            let w = w.clone();
            spawn_local(async move {
                match w.camera.open(facing).await {
                    Settled::Current(Ok(())) => {}
                    Settled::Current(Err(e)) => {
                        log::error!("[camera] {:?}", e);
                        w.camera.close();
                        w.display.borrow_mut().disable_augmented();
                        dom::alert(&format!("Camera unavailable: {}", e));
                    }
                    Settled::Superseded => {
                        log::debug!("[camera] {:?} request superseded", facing);
                    }
                }
            });
        }
        Reaction::CloseCamera => w.camera.close(),
        Reaction::StartCapture => {
            // One indexed frame per captured frame is a lower bound on the output size.
            let pixels = w.canvas.width() as usize * w.canvas.height() as usize;
            w.recorder.backend().set_capacity_hint(pixels);
            let recorder = w.recorder.clone();
            spawn_local(async move {
                if let Err(e) = recorder.start().await {
                    log::debug!("[capture] start rejected: {}", e);
                }
            });
        }
    }
}
