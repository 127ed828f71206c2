use crate::core::capture::CaptureStatus;
use crate::core::display::{DisplayState, Facing};
use instant::Instant;
use std::time::Duration;
use web_sys as web;

const HUD_ID: &str = "hud-overlay";
const STATUS_ID: &str = "hud-status";

/// Text shown for the current capture status; `None` hides the line. While
/// recording, `remaining` drives a whole-second countdown.
pub fn capture_status_text(status: CaptureStatus, remaining: Option<Duration>) -> Option<String> {
    match status {
        CaptureStatus::Acquiring => Some("PREPARING RECORDER...".to_string()),
        CaptureStatus::Recording => {
            let secs = remaining.map_or(0, |r| r.as_millis().div_ceil(1000));
            Some(format!("RECORDING... ({}s)", secs))
        }
        CaptureStatus::Rendering => Some("RENDERING GIF... Please wait.".to_string()),
        CaptureStatus::Error => Some("RECORDING FAILED".to_string()),
        CaptureStatus::Idle => None,
    }
}

/// A capture failure shown in the HUD for a limited time.
#[derive(Clone, Debug)]
pub struct ErrorNotice {
    message: String,
    raised: Instant,
}

impl ErrorNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised: Instant::now(),
        }
    }

    /// The message, unless it has been on screen for `ttl` already.
    pub fn message_within(&self, ttl: Duration) -> Option<&str> {
        (self.raised.elapsed() < ttl).then_some(self.message.as_str())
    }
}

fn status_color(status: CaptureStatus) -> &'static str {
    match status {
        CaptureStatus::Recording | CaptureStatus::Error => "#ff5555",
        _ => "#f0ad4e",
    }
}

pub fn hud_html(
    display: &DisplayState,
    status: CaptureStatus,
    remaining: Option<Duration>,
    error: Option<&str>,
) -> String {
    let ar = if display.augmented {
        let facing = match display.facing {
            Facing::Front => "front",
            Facing::Back => "back",
        };
        format!("On, {} camera", facing)
    } else {
        "Off".to_string()
    };
    let mut html = format!(
        "<div>Radius: {:.0} ([+]/[-])</div>\
         <div>Tail: {} ([0]/[1])</div>\
         <div>Pulse: {} ([p])</div>\
         <div>AR: {} ([a]/[c])</div>\
         <div>Record GIF: [g]</div>",
        display.radius(),
        display.background.label(),
        if display.pulsation { "On" } else { "Off" },
        ar,
    );
    let line = match (capture_status_text(status, remaining), error) {
        (Some(text), _) => Some((status_color(status), text)),
        (None, Some(message)) => Some((status_color(CaptureStatus::Error), message.to_string())),
        (None, None) => None,
    };
    if let Some((color, text)) = line {
        html.push_str(&format!(
            "<div id='{}' style='color: {}; margin-top: 5px'>{}</div>",
            STATUS_ID, color, text
        ));
    }
    html
}

/// Rewrite the HUD contents.
pub fn update_hud(document: &web::Document, html: &str) {
    if let Some(el) = document.get_element_by_id(HUD_ID) {
        el.set_inner_html(html);
    }
}
