use crate::camera::VideoFeed;
use crate::canvas::CanvasSurface;
use crate::core::display::DisplayState;
use crate::core::constants::ERROR_NOTICE_MS;
use crate::core::frame::{FrameInputs, Scene};
use crate::dom;
use crate::encoder::WebRecorder;
use crate::overlay::{self, ErrorNotice};
use glam::Vec2;
use instant::Instant;
use rand::rngs::ThreadRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct FrameContext {
    pub scene: Scene,
    pub surface: CanvasSurface,
    pub display: Rc<RefCell<DisplayState>>,
    pub target: Rc<Cell<Vec2>>,
    pub camera: Rc<VideoFeed>,
    pub recorder: WebRecorder,
    pub document: web::Document,
    pub started: Instant,
    pub rng: ThreadRng,
    /// Latest capture failure, set by the capture output.
    pub notice: Rc<RefCell<Option<ErrorNotice>>>,
    pub last_hud: String,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        {
            let display = self.display.borrow();
            let live = self.camera.live_frame();
            let inputs = FrameInputs {
                target: self.target.get(),
                display: &display,
                live_frame: live.as_ref(),
                elapsed_ms,
            };
            self.scene
                .frame(&mut self.surface, &inputs, &self.recorder, &mut self.rng);
        }
        self.refresh_hud();
    }

    fn refresh_hud(&mut self) {
        let notice = self.notice.borrow();
        let error = notice
            .as_ref()
            .and_then(|n| n.message_within(Duration::from_millis(ERROR_NOTICE_MS)));
        let html = overlay::hud_html(
            &self.display.borrow(),
            self.recorder.status(),
            self.recorder.remaining(),
            error,
        );
        drop(notice);
        if html != self.last_hud {
            overlay::update_hud(&self.document, &html);
            self.last_hud = html;
        }
    }
}

/// Handle to a running requestAnimationFrame loop.
pub struct RenderLoop {
    running: Rc<Cell<bool>>,
    raf_id: Rc<Cell<Option<i32>>>,
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    resize: Option<Closure<dyn FnMut()>>,
}

impl RenderLoop {
    /// Cancel the pending iteration and drop the resize listener. An iteration
    /// already running finishes but schedules nothing further.
    pub fn stop(&mut self) {
        if !self.running.replace(false) {
            return;
        }
        if let Some(w) = web::window() {
            if let Some(id) = self.raf_id.take() {
                _ = w.cancel_animation_frame(id);
            }
            if let Some(closure) = &self.resize {
                _ = w.remove_event_listener_with_callback(
                    "resize",
                    closure.as_ref().unchecked_ref(),
                );
            }
        }
        self.resize = None;
        self.tick.borrow_mut().take();
        log::info!("[loop] stopped");
    }
}

fn request_frame(tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>, raf_id: &Cell<Option<i32>>) {
    if let (Some(w), Some(cb)) = (web::window(), tick.borrow().as_ref()) {
        raf_id.set(w.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
    }
}

pub fn start_loop(
    frame_ctx: Rc<RefCell<FrameContext>>,
    canvas: &web::HtmlCanvasElement,
) -> RenderLoop {
    let running = Rc::new(Cell::new(true));
    let raf_id: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

    let canvas_resize = canvas.clone();
    let resize = Closure::wrap(Box::new(move || {
        dom::sync_canvas_backing_size(&canvas_resize);
    }) as Box<dyn FnMut()>);
    if let Some(w) = web::window() {
        _ = w.add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref());
    }

    {
        let tick_clone = tick.clone();
        let running = running.clone();
        let raf_id = raf_id.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            raf_id.set(None);
            if !running.get() {
                return;
            }
            frame_ctx.borrow_mut().frame();
            if running.get() {
                request_frame(&tick_clone, &raf_id);
            }
        }) as Box<dyn FnMut()>));
    }
    request_frame(&tick, &raf_id);
    log::info!("[loop] started");

    RenderLoop {
        running,
        raf_id,
        tick,
        resize: Some(resize),
    }
}
