//! Browser collaborators for the capture pipeline: task spawning, timers and
//! file download.

use crate::core::capture::{CancelToken, CaptureError, CaptureOutput, Scheduler};
use crate::core::gif::{GifBackend, LocalSpawner, LocalTask};
use crate::dom;
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub type WebRecorder =
    crate::core::capture::Recorder<GifBackend<WebSpawner>, TimeoutScheduler, DownloadOutput>;

#[derive(Clone, Copy, Default)]
pub struct WebSpawner;

impl LocalSpawner for WebSpawner {
    fn spawn(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn yield_now(&self) -> LocalTask {
        Box::pin(async {
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                let scheduled = web::window().and_then(|w| {
                    w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
                        .ok()
                });
                if scheduled.is_none() {
                    _ = resolve.call0(&JsValue::NULL);
                }
            });
            _ = JsFuture::from(promise).await;
        })
    }
}

/// `true` when the host can build and download blobs.
pub fn gif_capability() -> bool {
    let global = js_sys::global();
    ["Blob", "URL"]
        .iter()
        .all(|name| js_sys::Reflect::has(&global, &JsValue::from_str(name)).unwrap_or(false))
}

pub fn gif_backend() -> GifBackend<WebSpawner> {
    GifBackend::new(WebSpawner, gif_capability())
}

#[derive(Default)]
pub struct TimeoutScheduler;

pub struct TimeoutToken {
    handle: Option<i32>,
}

impl CancelToken for TimeoutToken {
    fn cancel(self) {
        if let (Some(handle), Some(w)) = (self.handle, web::window()) {
            w.clear_timeout_with_handle(handle);
        }
    }
}

impl Scheduler for TimeoutScheduler {
    type Token = TimeoutToken;

    fn schedule_once(&self, after: Duration, task: Box<dyn FnOnce()>) -> TimeoutToken {
        // Freed by wasm-bindgen after the single call; a cancelled timer leaks
        // only this small closure.
        let callback = Closure::once_into_js(move || task());
        let ms = after.as_millis().min(i32::MAX as u128) as i32;
        let handle = web::window().and_then(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                ms,
            )
            .map_err(|e| log::error!("[capture] setTimeout failed: {:?}", e))
            .ok()
        });
        TimeoutToken { handle }
    }
}

/// Delivers finished GIFs as browser downloads and errors as alerts.
pub struct DownloadOutput {
    on_error: Box<dyn Fn(&CaptureError)>,
}

impl DownloadOutput {
    pub fn new(on_error: impl Fn(&CaptureError) + 'static) -> Self {
        Self {
            on_error: Box::new(on_error),
        }
    }
}

impl CaptureOutput for DownloadOutput {
    fn deliver(&self, bytes: Vec<u8>, file_name: &str) {
        if let Err(e) = download(&bytes, file_name) {
            log::error!("[capture] download failed: {:?}", e);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        (self.on_error)(error);
        dom::alert(&error.to_string());
    }
}

fn download(bytes: &[u8], file_name: &str) -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let body = document.body().ok_or_else(|| anyhow::anyhow!("no body"))?;

    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let opts = web::BlobPropertyBag::new();
    opts.set_type("image/gif");
    let blob = web::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let url = web::Url::create_object_url_with_blob(&blob).map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let anchor = document
        .create_element("a")
        .map_err(|e| anyhow::anyhow!("{:?}", e))?
        .dyn_into::<web::HtmlAnchorElement>()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    body.append_child(&anchor)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    anchor.click();
    _ = body.remove_child(&anchor);
    _ = web::Url::revoke_object_url(&url);
    log::info!("[capture] downloaded {}", file_name);
    Ok(())
}
