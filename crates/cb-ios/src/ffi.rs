//! C ABI: `#[repr(C)]` types shared with the app and the exported
//! `cb_*` entry points.
//!
//! Every entry point is a panic boundary: a panic is logged and turned into
//! the entry's neutral return value instead of unwinding into Swift.

use crate::bridge::IosView;
use crate::host::IosCanvas;
use cb_core::{BridgeConfig, BridgeError, SurfaceUpdate, TickOutcome};
use std::any::Any;
use std::ffi::{CStr, c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;

// ─── Shared types ────────────────────────────────────────────────────────

/// The host view handed over by the view controller.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IosViewObj {
    /// `UIView *`, kept alive by the caller until `cb_canvas_destroy`.
    pub view: *mut c_void,
    /// `CAMetalLayer *` backing `view`.
    pub metal_layer: *mut c_void,
    /// `UIScreen.maximumFramesPerSecond`. Values <= 0 keep the configured cap.
    pub maximum_frames: i32,
    /// NUL-terminated scratch directory; null means the process temp dir.
    pub temporary_directory: *const c_char,
}

/// Status callback handed to the renderer. Callable from any thread.
pub type StatusCallback = unsafe extern "C" fn(context: *mut c_void, code: i32);

/// Arguments of `RendererVTable::create_canvas`. Only valid for the call.
#[repr(C)]
#[derive(Debug)]
pub struct RendererCreateInfo {
    pub view: *mut c_void,
    pub metal_layer: *mut c_void,
    pub maximum_frame_rate: u32,
    pub temporary_directory: *const c_char,
    /// `HostCallbacks::context`.
    pub host_context: *mut c_void,
    /// Pass back as the first argument of `status_callback`. An id, not a
    /// pointer: it stays safe to use after the renderer is destroyed.
    pub status_context: *mut c_void,
    pub status_callback: StatusCallback,
}

/// The renderer library's entry points.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RendererVTable {
    /// Returns an opaque renderer handle, or null on failure.
    pub create_canvas: Option<unsafe extern "C" fn(info: *const RendererCreateInfo) -> *mut c_void>,
    pub advance_frame: Option<unsafe extern "C" fn(renderer: *mut c_void)>,
    /// New drawable size in device pixels. Answered with status 2.
    pub resize: Option<unsafe extern "C" fn(renderer: *mut c_void, width: u32, height: u32)>,
    pub destroy: Option<unsafe extern "C" fn(renderer: *mut c_void)>,
}

/// Main-thread services of the view controller.
///
/// All functions are optional; a missing one turns the matching action into
/// a no-op. `wake_main` is the only one called off the main thread.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HostCallbacks {
    pub context: *mut c_void,
    pub set_display_link_paused: Option<unsafe extern "C" fn(context: *mut c_void, paused: bool)>,
    /// Call `cb_canvas_timer_fired(id)` after `delay_ms`.
    pub schedule_timer: Option<unsafe extern "C" fn(context: *mut c_void, id: u64, delay_ms: u64)>,
    pub cancel_timer: Option<unsafe extern "C" fn(context: *mut c_void, id: u64)>,
    /// `UIScreen.main.nativeScale` of the view's screen.
    pub content_scale: Option<unsafe extern "C" fn(context: *mut c_void) -> f64>,
    /// Resize the layer's drawable. Return 0 when done, 1 when the host will
    /// call `cb_canvas_surface_resized(request_id)` later.
    pub apply_drawable_size:
        Option<unsafe extern "C" fn(context: *mut c_void, request_id: u64, width: u32, height: u32) -> i32>,
    /// A status is queued; schedule `cb_canvas_dispatch_statuses` on the main
    /// thread. Must not call into the bridge synchronously.
    pub wake_main: Option<unsafe extern "C" fn(context: *mut c_void)>,
    /// Every status after the bridge handled it.
    pub status_changed: Option<unsafe extern "C" fn(context: *mut c_void, code: i32)>,
}

pub const APPLY_DONE: i32 = 0;
pub const APPLY_DEFERRED: i32 = 1;

// SAFETY (all methods below): the app guarantees `context` and the function
// pointers stay valid until `cb_canvas_destroy` returns.
impl HostCallbacks {
    pub(crate) fn pause_display_link(&self, paused: bool) {
        if let Some(f) = self.set_display_link_paused {
            unsafe { f(self.context, paused) }
        }
    }

    pub(crate) fn schedule(&self, id: u64, delay_ms: u64) {
        match self.schedule_timer {
            Some(f) => unsafe { f(self.context, id, delay_ms) },
            None => log::warn!("no schedule_timer callback, resize {id} will never fire"),
        }
    }

    pub(crate) fn cancel(&self, id: u64) {
        if let Some(f) = self.cancel_timer {
            unsafe { f(self.context, id) }
        }
    }

    pub(crate) fn scale(&self) -> f64 {
        match self.content_scale {
            Some(f) => unsafe { f(self.context) },
            None => 1.0,
        }
    }

    pub(crate) fn apply_size(&self, request_id: u64, width: u32, height: u32) -> SurfaceUpdate {
        let Some(f) = self.apply_drawable_size else {
            return SurfaceUpdate::Applied;
        };
        match unsafe { f(self.context, request_id, width, height) } {
            APPLY_DEFERRED => SurfaceUpdate::Deferred,
            APPLY_DONE => SurfaceUpdate::Applied,
            other => {
                log::warn!("apply_drawable_size returned {other}, treated as applied");
                SurfaceUpdate::Applied
            }
        }
    }

    pub(crate) fn notify_status(&self, code: i32) {
        if let Some(f) = self.status_changed {
            unsafe { f(self.context, code) }
        }
    }
}

// ─── Panic boundary ──────────────────────────────────────────────────────

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn guard<T>(entry: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            log::error!("{entry} panicked: {}", panic_message(payload.as_ref()));
            fallback
        }
    }
}

/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
unsafe fn with_canvas<T: Copy>(
    entry: &'static str,
    canvas: *mut IosCanvas,
    fallback: T,
    f: impl FnOnce(&mut IosCanvas) -> T,
) -> T {
    // SAFETY: upheld by the caller.
    let Some(canvas) = (unsafe { canvas.as_mut() }) else {
        log::warn!("{entry} called with a null canvas");
        return fallback;
    };
    guard(entry, fallback, || f(canvas))
}

/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn optional_str<'a>(ptr: *const c_char) -> Result<Option<&'a str>, BridgeError> {
    if ptr.is_null() {
        return Ok(None);
    }
    // SAFETY: upheld by the caller.
    let s = unsafe { CStr::from_ptr(ptr) };
    s.to_str()
        .map(Some)
        .map_err(|e| BridgeError::InvalidConfig(format!("string is not UTF-8: {e}")))
}

// ─── Entry points ────────────────────────────────────────────────────────

/// Install the `env_logger` backend. Filter with `RUST_LOG`; safe to call
/// more than once.
#[unsafe(no_mangle)]
pub extern "C" fn cb_logging_init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Create the renderer for `object.view` and return the canvas handle.
///
/// Returns null if the view cannot be resolved, the config is invalid or
/// the renderer fails to create. `config_json` may be null for defaults.
/// The pump stays paused until `cb_canvas_view_did_appear` and the
/// renderer reporting status 0.
///
/// # Safety
/// - pointers in `object` must be valid for the canvas lifetime
/// - `config_json` must be null or a valid NUL-terminated string
/// - `renderer` and `callbacks` must stay valid until `cb_canvas_destroy`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_create(
    object: IosViewObj,
    renderer: RendererVTable,
    callbacks: HostCallbacks,
    config_json: *const c_char,
) -> *mut IosCanvas {
    guard("cb_canvas_create", ptr::null_mut(), || {
        // SAFETY: upheld by the caller.
        let created = unsafe { create(object, renderer, callbacks, config_json) };
        match created {
            Ok(canvas) => Box::into_raw(Box::new(canvas)),
            Err(err) => {
                log::error!("canvas creation failed: {err}");
                ptr::null_mut()
            }
        }
    })
}

unsafe fn create(
    object: IosViewObj,
    renderer: RendererVTable,
    callbacks: HostCallbacks,
    config_json: *const c_char,
) -> Result<IosCanvas, BridgeError> {
    // SAFETY: upheld by `cb_canvas_create`'s caller.
    let config = match unsafe { optional_str(config_json)? } {
        Some(json) => BridgeConfig::from_json(json)?,
        None => BridgeConfig::default(),
    };
    let scratch = match unsafe { optional_str(object.temporary_directory)? } {
        Some(dir) => PathBuf::from(dir),
        None => std::env::temp_dir(),
    };
    let view = IosView {
        view: object.view,
        metal_layer: object.metal_layer,
    };
    IosCanvas::create(view, object.maximum_frames, scratch, renderer, callbacks, &config)
}

/// Forward one `CADisplayLink` tick. `timestamp` is `displayLink.timestamp`
/// in seconds. Returns `true` if the renderer advanced a frame.
///
/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_enter_frame(canvas: *mut IosCanvas, timestamp: f64) -> bool {
    unsafe {
        with_canvas("cb_canvas_enter_frame", canvas, false, |c| {
            c.enter_frame(timestamp) == TickOutcome::Advanced
        })
    }
}

/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_view_did_appear(canvas: *mut IosCanvas) {
    unsafe { with_canvas("cb_canvas_view_did_appear", canvas, (), IosCanvas::view_did_appear) }
}

/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_view_will_disappear(canvas: *mut IosCanvas) {
    unsafe {
        with_canvas(
            "cb_canvas_view_will_disappear",
            canvas,
            (),
            IosCanvas::view_will_disappear,
        )
    }
}

/// Record the drawable size the layer already has, in device pixels.
///
/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_set_drawable_size(canvas: *mut IosCanvas, width: u32, height: u32) {
    unsafe {
        with_canvas("cb_canvas_set_drawable_size", canvas, (), |c| {
            c.set_drawable_size(width, height)
        })
    }
}

/// The view's bounds changed, in points.
///
/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_size_changed(canvas: *mut IosCanvas, width: f64, height: f64) {
    unsafe {
        with_canvas("cb_canvas_size_changed", canvas, (), |c| {
            c.size_changed(width, height)
        })
    }
}

/// A timer scheduled through `HostCallbacks::schedule_timer` fired.
///
/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_timer_fired(canvas: *mut IosCanvas, id: u64) {
    unsafe {
        with_canvas("cb_canvas_timer_fired", canvas, (), |c| {
            c.timer_fired(id);
        })
    }
}

/// The host finished a deferred drawable resize. Returns `true` if the
/// renderer was notified.
///
/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_surface_resized(canvas: *mut IosCanvas, request_id: u64) -> bool {
    unsafe {
        with_canvas("cb_canvas_surface_resized", canvas, false, |c| {
            c.surface_resized(request_id)
        })
    }
}

/// Handle queued renderer statuses; each is forwarded to
/// `HostCallbacks::status_changed`. Returns how many were handled.
///
/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_dispatch_statuses(canvas: *mut IosCanvas) -> u32 {
    unsafe {
        with_canvas("cb_canvas_dispatch_statuses", canvas, 0, |c| {
            u32::try_from(c.dispatch_statuses().len()).unwrap_or(u32::MAX)
        })
    }
}

/// Destroy the renderer and free the canvas. Null is ignored.
///
/// # Safety
/// `canvas` must be null or a live pointer from `cb_canvas_create`; it is
/// dangling afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cb_canvas_destroy(canvas: *mut IosCanvas) {
    if canvas.is_null() {
        return;
    }
    // SAFETY: upheld by the caller; ownership returns to Rust here.
    let mut canvas = unsafe { Box::from_raw(canvas) };
    guard("cb_canvas_destroy", (), move || {
        canvas.destroy();
        drop(canvas);
    });
}
