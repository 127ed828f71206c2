//! Live camera feed for augmented mode.
//!
//! The decoded-frame handle is published by the video element's own
//! `playing` / `emptied` callbacks; the render loop only reads the cached
//! handle and never polls the element's readiness.

use crate::core::display::Facing;
use crate::core::request::{RequestGate, Settled, Ticket};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub struct VideoFeed {
    video: web::HtmlVideoElement,
    live: Rc<RefCell<Option<web::HtmlVideoElement>>>,
    stream: RefCell<Option<web::MediaStream>>,
    requests: RequestGate,
    _listeners: Vec<Closure<dyn FnMut()>>,
}

impl VideoFeed {
    pub fn new(document: &web::Document) -> anyhow::Result<Self> {
        let video = document
            .create_element("video")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?
            .dyn_into::<web::HtmlVideoElement>()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        video.set_muted(true);
        video.set_autoplay(true);
        _ = video.set_attribute("playsinline", "");

        let live = Rc::new(RefCell::new(None));
        let mut listeners = Vec::new();
        {
            let live = live.clone();
            let v = video.clone();
            listeners.push(listen(&video, "playing", move || {
                *live.borrow_mut() = Some(v.clone());
            }));
        }
        for event in ["emptied", "ended"] {
            let live = live.clone();
            listeners.push(listen(&video, event, move || {
                live.borrow_mut().take();
            }));
        }

        Ok(Self {
            video,
            live,
            stream: RefCell::new(None),
            requests: RequestGate::default(),
            _listeners: listeners,
        })
    }

    /// Latest decoded frame source, if the camera is playing.
    pub fn live_frame(&self) -> std::cell::Ref<'_, Option<web::HtmlVideoElement>> {
        self.live.borrow()
    }

    /// Request the camera with the given facing and start playback. A newer
    /// `open`/`close` issued while this one awaits permission wins, and the
    /// older request then settles as `Superseded` whatever its outcome.
    pub async fn open(&self, facing: Facing) -> Settled<(), anyhow::Error> {
        let ticket = self.requests.begin();
        self.stop_tracks();
        let result = self.start_stream(ticket, facing).await;
        self.requests.settle(ticket, result)
    }

    async fn start_stream(&self, ticket: Ticket, facing: Facing) -> anyhow::Result<()> {
        let devices = web::window()
            .ok_or_else(|| anyhow::anyhow!("no window"))?
            .navigator()
            .media_devices()
            .map_err(|e| anyhow::anyhow!("media devices unavailable: {:?}", e))?;

        let video_constraints = js_sys::Object::new();
        js_sys::Reflect::set(
            &video_constraints,
            &JsValue::from_str("facingMode"),
            &JsValue::from_str(facing.facing_mode()),
        )
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let constraints = web::MediaStreamConstraints::new();
        constraints.set_video(&video_constraints);
        constraints.set_audio(&JsValue::FALSE);

        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let stream: web::MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| anyhow::anyhow!("camera permission or device error: {:?}", e))?
            .dyn_into()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        if !self.requests.is_current(ticket) {
            stop_stream(&stream);
            return Ok(());
        }
        self.video.set_src_object(Some(&stream));
        *self.stream.borrow_mut() = Some(stream);
        if let Ok(p) = self.video.play() {
            JsFuture::from(p)
                .await
                .map_err(|e| anyhow::anyhow!("video playback failed: {:?}", e))?;
        }
        log::info!("[camera] streaming ({:?})", facing);
        Ok(())
    }

    pub fn close(&self) {
        self.requests.cancel();
        self.stop_tracks();
        self.video.set_src_object(None);
        self.live.borrow_mut().take();
    }

    fn stop_tracks(&self) {
        if let Some(stream) = self.stream.borrow_mut().take() {
            stop_stream(&stream);
        }
    }
}

fn stop_stream(stream: &web::MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<web::MediaStreamTrack>() {
            track.stop();
        }
    }
}

fn listen(
    target: &web::HtmlVideoElement,
    event: &str,
    handler: impl FnMut() + 'static,
) -> Closure<dyn FnMut()> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure
}
