//! UIKit surface: view handle resolution and drawable resizes.

use crate::ffi::HostCallbacks;
use cb_core::{BridgeError, ResizeRequest, SurfaceHost, SurfaceUpdate};
use raw_window_handle::{RawWindowHandle, UiKitWindowHandle};
use std::ffi::c_void;
use std::ptr::NonNull;

/// Resolve a `UIView *` into the handle a GPU surface is created from.
pub fn ui_kit_handle(view: *mut c_void) -> Result<RawWindowHandle, BridgeError> {
    let view = NonNull::new(view)
        .ok_or_else(|| BridgeError::InvalidHostSurface("UIView pointer is null".to_string()))?;
    Ok(RawWindowHandle::UiKit(UiKitWindowHandle::new(view)))
}

/// `SurfaceHost` backed by the view controller's callbacks.
pub struct HostSurface {
    callbacks: HostCallbacks,
}

impl HostSurface {
    pub fn new(callbacks: HostCallbacks) -> Self {
        Self { callbacks }
    }
}

impl SurfaceHost for HostSurface {
    fn device_pixel_ratio(&self) -> f64 {
        self.callbacks.scale()
    }

    fn apply_drawable_size(&mut self, request: &ResizeRequest) -> SurfaceUpdate {
        self.callbacks
            .apply_size(request.id, request.device.width, request.device.height)
    }
}
