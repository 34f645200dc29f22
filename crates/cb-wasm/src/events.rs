//! Custom DOM events exchanged with the page on the container element.

use wasm_bindgen::JsValue;
use web_sys::{Event, EventTarget};

/// Raised by the bridge when a coalesced resize leaves debouncing.
pub const CANVAS_SIZE_NEED_CHANGE: &str = "canvas_size_need_change";
/// Raised by the page once it resized the canvas buffer (deferred mode).
pub const CANVAS_RESIZE_COMPLETED: &str = "canvas_resize_completed";
/// Page asks the bridge to resume / suspend frame pumping.
pub const CANVAS_ANIMATION_RESUME: &str = "canvas_animation_resume";
pub const CANVAS_ANIMATION_SUSPEND: &str = "canvas_animation_suspend";

/// Dispatch a plain event named `name` on `target`.
pub fn dispatch(target: &EventTarget, name: &str) -> Result<(), JsValue> {
    let event = Event::new(name)?;
    target.dispatch_event(&event)?;
    Ok(())
}
