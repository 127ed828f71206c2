use super::{dispatch, InputWiring};
use crate::core::display::command_for_key;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub fn handle_global_keydown(ev: &web::KeyboardEvent, w: &InputWiring) {
    let key = ev.key();
    if let Some(cmd) = command_for_key(&key) {
        log::debug!("[keys] {} -> {:?}", key, cmd);
        dispatch(w, cmd);
    }
}

pub fn wire_global_keydown(w: InputWiring) {
    if let Some(window) = web::window() {
        let closure = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
            handle_global_keydown(&ev, &w);
        }) as Box<dyn FnMut(_)>);
        _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}
