use crate::core::capture::{FrameSnapshot, SnapshotRequest};
use crate::core::compositor::Surface;
use crate::core::frame::Snapshot;
use crate::dom;
use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// `Surface` over the page's 2D canvas context.
pub struct CanvasSurface {
    canvas: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
    // Off-screen target for downscaled capture frames.
    scratch: web::HtmlCanvasElement,
    scratch_ctx: web::CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(
        canvas: web::HtmlCanvasElement,
        ctx: web::CanvasRenderingContext2d,
    ) -> anyhow::Result<Self> {
        let document = canvas
            .owner_document()
            .ok_or_else(|| anyhow::anyhow!("canvas is not attached to a document"))?;
        let scratch = document
            .create_element("canvas")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?
            .dyn_into::<web::HtmlCanvasElement>()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let scratch_ctx = dom::context_2d(&scratch)?;
        Ok(Self {
            canvas,
            ctx,
            scratch,
            scratch_ctx,
        })
    }

    #[allow(deprecated)]
    fn set_fill(&self, color: &str) {
        self.ctx.set_fill_style(&JsValue::from_str(color));
    }
}

impl Surface for CanvasSurface {
    type Video = web::HtmlVideoElement;

    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn fill_background(&mut self, color: &str) {
        let (w, h) = self.size();
        self.set_fill(color);
        self.ctx.fill_rect(0.0, 0.0, w as f64, h as f64);
    }

    fn draw_video(&mut self, frame: &web::HtmlVideoElement, width: u32, height: u32) -> bool {
        self.ctx
            .draw_image_with_html_video_element_and_dw_and_dh(
                frame,
                0.0,
                0.0,
                width as f64,
                height as f64,
            )
            .map_err(|e| log::debug!("[camera] draw_image failed: {:?}", e))
            .is_ok()
    }

    fn fill_glowing_disc(&mut self, center: Vec2, radius: f32, color: &str, glow_blur: f64) {
        self.ctx.set_shadow_blur(glow_blur);
        self.ctx.set_shadow_color(color);
        self.set_fill(color);
        self.ctx.begin_path();
        _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        self.ctx.fill();
        self.ctx.set_shadow_blur(0.0);
    }
}

impl Snapshot for CanvasSurface {
    fn snapshot(&self, request: SnapshotRequest) -> Option<FrameSnapshot> {
        let (w, h) = self.size();
        let (sw, sh) = request.fit(w, h);
        let data = if (sw, sh) == (w, h) {
            self.ctx.get_image_data(0.0, 0.0, w as f64, h as f64)
        } else {
            if self.scratch.width() != sw || self.scratch.height() != sh {
                self.scratch.set_width(sw);
                self.scratch.set_height(sh);
            }
            self.scratch_ctx
                .draw_image_with_html_canvas_element_and_dw_and_dh(
                    &self.canvas,
                    0.0,
                    0.0,
                    sw as f64,
                    sh as f64,
                )
                .and_then(|_| {
                    self.scratch_ctx
                        .get_image_data(0.0, 0.0, sw as f64, sh as f64)
                })
        };
        let data = data
            .map_err(|e| log::error!("[capture] snapshot failed: {:?}", e))
            .ok()?;
        Some(FrameSnapshot {
            width: data.width(),
            height: data.height(),
            rgba: data.data().0,
            delay_ms: request.delay_ms,
        })
    }
}
