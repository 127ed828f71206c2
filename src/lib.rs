//! Glowing pointer-chasing particle with trail, pulsation, optional camera
//! background and GIF capture.
//!
//! `core` is platform-independent and tested on the host; everything else is
//! the browser front-end and only builds for wasm32.

pub mod core;
pub mod overlay;

#[cfg(target_arch = "wasm32")]
mod camera;
#[cfg(target_arch = "wasm32")]
mod canvas;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod encoder;
#[cfg(target_arch = "wasm32")]
mod events;
#[cfg(target_arch = "wasm32")]
mod frame;

#[cfg(target_arch = "wasm32")]
pub use web_app::{start, stop};

#[cfg(target_arch = "wasm32")]
mod web_app {
    use crate::camera::VideoFeed;
    use crate::canvas::CanvasSurface;
    use crate::core::capture::{EncoderBackend, Recorder};
    use crate::core::config::RenderConfig;
    use crate::core::display::DisplayState;
    use crate::core::frame::Scene;
    use crate::{dom, encoder, events, frame, overlay};
    use instant::Instant;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys as web;

    thread_local! {
        static RENDER_LOOP: RefCell<Option<frame::RenderLoop>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();
        log::info!("glow-trail starting");

        if let Err(e) = init() {
            log::error!("init error: {:?}", e);
        }
        Ok(())
    }

    /// Tear down the render loop. A capture in progress keeps running.
    #[wasm_bindgen]
    pub fn stop() {
        RENDER_LOOP.with(|slot| {
            if let Some(mut l) = slot.borrow_mut().take() {
                l.stop();
            }
        });
    }

    fn load_config() -> RenderConfig {
        let (config, errors) = RenderConfig::from_query(&dom::location_query());
        for e in errors {
            log::warn!("[config] ignoring override: {}", e);
        }
        config
    }

    fn init() -> anyhow::Result<()> {
        let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow::anyhow!("no document"))?;

        let canvas: web::HtmlCanvasElement = document
            .get_element_by_id("app-canvas")
            .ok_or_else(|| anyhow::anyhow!("missing #app-canvas"))?
            .dyn_into::<web::HtmlCanvasElement>()
            .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;

        dom::sync_canvas_backing_size(&canvas);
        // Without a 2D context the loop never starts.
        let ctx = dom::context_2d(&canvas)?;

        let config = Rc::new(load_config());
        let display = Rc::new(RefCell::new(DisplayState::new(&config)));
        let origin = dom::canvas_center(&canvas);
        let target = Rc::new(Cell::new(origin));
        let camera = Rc::new(VideoFeed::new(&document)?);

        let notice = Rc::new(RefCell::new(None));
        let notice_sink = notice.clone();
        let recorder = Recorder::new(
            encoder::gif_backend(),
            encoder::TimeoutScheduler,
            encoder::DownloadOutput::new(move |e| {
                *notice_sink.borrow_mut() = Some(overlay::ErrorNotice::new(e.to_string()));
            }),
            config.capture.clone(),
        );
        if !recorder.backend().is_available() {
            log::warn!("[capture] GIF download unsupported; recording disabled");
        }

        let wiring = events::InputWiring {
            canvas: canvas.clone(),
            config: config.clone(),
            display: display.clone(),
            target: target.clone(),
            recorder: recorder.clone(),
            camera: camera.clone(),
        };
        events::wire_global_keydown(wiring.clone());
        events::wire_input_handlers(wiring);

        let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
            scene: Scene::new((*config).clone(), origin),
            surface: CanvasSurface::new(canvas.clone(), ctx)?,
            display,
            target,
            camera,
            recorder,
            document,
            started: Instant::now(),
            rng: rand::thread_rng(),
            notice,
            last_hud: String::new(),
        }));
        let render_loop = frame::start_loop(frame_ctx, &canvas);
        RENDER_LOOP.with(|slot| *slot.borrow_mut() = Some(render_loop));
        Ok(())
    }
}
