use super::{dispatch, InputWiring};
use crate::core::display::{command_for_wheel, pinch_radius};
use glam::Vec2;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[derive(Clone, Copy)]
struct Pinch {
    start_radius: f32,
    start_distance: f32,
}

pub fn wire_input_handlers(w: InputWiring) {
    wire_pointermove(&w);
    wire_wheel(&w);
    wire_touch(&w);
}

fn non_passive() -> web::AddEventListenerOptions {
    let opts = web::AddEventListenerOptions::new();
    opts.set_passive(false);
    opts
}

fn wire_pointermove(w: &InputWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        w.target
            .set(Vec2::new(ev.client_x() as f32, ev.client_y() as f32));
    }) as Box<dyn FnMut(_)>);
    if let Some(wnd) = web::window() {
        _ = wnd.add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
    }
    closure.forget();
}

fn wire_wheel(w: &InputWiring) {
    let w = w.clone();
    let closure = Closure::wrap(Box::new(move |ev: web::WheelEvent| {
        ev.prevent_default();
        dispatch(&w, command_for_wheel(ev.delta_y()));
    }) as Box<dyn FnMut(_)>);
    if let Some(wnd) = web::window() {
        _ = wnd.add_event_listener_with_callback_and_add_event_listener_options(
            "wheel",
            closure.as_ref().unchecked_ref(),
            &non_passive(),
        );
    }
    closure.forget();
}

fn touch_point(t: &web::Touch) -> Vec2 {
    Vec2::new(t.client_x() as f32, t.client_y() as f32)
}

fn two_finger_distance(touches: &web::TouchList) -> Option<f32> {
    match (touches.get(0), touches.get(1)) {
        (Some(a), Some(b)) => Some(touch_point(&a).distance(touch_point(&b))),
        _ => None,
    }
}

fn wire_touch(w: &InputWiring) {
    let pinch: Rc<Cell<Option<Pinch>>> = Rc::new(Cell::new(None));

    let handler = {
        let w = w.clone();
        let pinch = pinch.clone();
        move |ev: web::TouchEvent| {
            ev.prevent_default();
            let touches = ev.touches();
            if touches.length() >= 2 {
                let Some(distance) = two_finger_distance(&touches) else {
                    return;
                };
                match pinch.get() {
                    None => pinch.set(Some(Pinch {
                        start_radius: w.display.borrow().radius(),
                        start_distance: distance,
                    })),
                    Some(p) => {
                        let r = pinch_radius(p.start_radius, p.start_distance, distance, &w.config);
                        w.display.borrow_mut().set_radius(r, &w.config);
                    }
                }
            } else {
                pinch.set(None);
                if let Some(t) = touches.get(0) {
                    w.target.set(touch_point(&t));
                }
            }
        }
    };
    let on_touch = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::TouchEvent)>);
    for event in ["touchstart", "touchmove"] {
        _ = w
            .canvas
            .add_event_listener_with_callback_and_add_event_listener_options(
                event,
                on_touch.as_ref().unchecked_ref(),
                &non_passive(),
            );
    }
    on_touch.forget();

    let on_end = Closure::wrap(Box::new(move |ev: web::TouchEvent| {
        if ev.touches().length() < 2 {
            pinch.set(None);
        }
    }) as Box<dyn FnMut(_)>);
    for event in ["touchend", "touchcancel"] {
        _ = w
            .canvas
            .add_event_listener_with_callback(event, on_end.as_ref().unchecked_ref());
    }
    on_end.forget();
}
