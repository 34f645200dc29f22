//! Browser implementations of the refresh source and the debounce timer.

use cb_core::{DebounceTimer, RefreshSource, TimerId};
use std::collections::HashMap;
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

// ─── Animation frames ────────────────────────────────────────────────────

/// `requestAnimationFrame` loop. The callback is persistent; each fired
/// frame must call [`AnimationFrameLoop::frame_fired`] and then
/// [`AnimationFrameLoop::request_next`] while the pump keeps running.
pub struct AnimationFrameLoop {
    window: Window,
    callback: Closure<dyn FnMut(f64)>,
    handle: Option<i32>,
}

impl AnimationFrameLoop {
    pub fn new(window: Window, callback: Closure<dyn FnMut(f64)>) -> Self {
        Self {
            window,
            callback,
            handle: None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.handle.is_some()
    }

    pub fn frame_fired(&mut self) {
        self.handle = None;
    }

    pub fn request_next(&mut self) {
        if self.handle.is_some() {
            return;
        }
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => log::error!("requestAnimationFrame failed: {e:?}"),
        }
    }
}

impl RefreshSource for AnimationFrameLoop {
    fn resume(&mut self) {
        self.request_next();
    }

    fn suspend(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.window.cancel_animation_frame(handle) {
                log::warn!("cancelAnimationFrame failed: {e:?}");
            }
        }
    }
}

// ─── Debounce timer ──────────────────────────────────────────────────────

/// `setTimeout`-backed debounce timer. The persistent callback receives the
/// timer id as its only argument.
pub struct WindowTimer {
    window: Window,
    callback: Closure<dyn FnMut(JsValue)>,
    handles: HashMap<TimerId, i32>,
}

impl WindowTimer {
    pub fn new(window: Window, callback: Closure<dyn FnMut(JsValue)>) -> Self {
        Self {
            window,
            callback,
            handles: HashMap::new(),
        }
    }

    /// Forget the browser handle of a timer that just fired.
    pub fn fired(&mut self, id: TimerId) {
        self.handles.remove(&id);
    }

    pub fn pending(&self) -> usize {
        self.handles.len()
    }
}

impl DebounceTimer for WindowTimer {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        let millis = timeout_millis(delay);
        let result = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_1(
                self.callback.as_ref().unchecked_ref(),
                millis,
                &JsValue::from_f64(id as f64),
            );
        match result {
            Ok(handle) => {
                self.handles.insert(id, handle);
            }
            Err(e) => log::error!("setTimeout for resize timer {id} failed: {e:?}"),
        }
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.handles.remove(&id) {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for WindowTimer {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain() {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for AnimationFrameLoop {
    fn drop(&mut self) {
        self.suspend();
    }
}

/// Timer id carried through `setTimeout` back into Rust.
pub fn timer_id(value: &JsValue) -> Option<TimerId> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as TimerId)
}

/// `setTimeout` delay, saturated to the browser's signed 32-bit range.
pub fn timeout_millis(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(i32::MAX)
}
