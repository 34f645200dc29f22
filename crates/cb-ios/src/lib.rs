//! iOS host for the canvas bridge.
//!
//! Built as a static library and linked into the app. The view controller
//! creates one canvas per Metal-backed view with [`ffi::cb_canvas_create`]
//! and forwards `CADisplayLink` ticks, view appearance, size changes,
//! timer firings and status wake-ups through the `cb_canvas_*` functions.
//! Everything except the renderer's status callback runs on the main thread.
//!
//! The C declarations live in `include/canvas_bridge.h`.

pub mod bridge;
pub mod ffi;
pub mod host;
pub mod status;
pub mod surface;

pub use bridge::{IosBridge, IosRenderer, IosView};
pub use ffi::{HostCallbacks, IosViewObj, RendererCreateInfo, RendererVTable};
pub use host::{DisplayLink, HostTimer, IosCanvas, IosHost};
pub use status::StatusSlot;
pub use surface::HostSurface;
