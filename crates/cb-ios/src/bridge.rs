//! iOS platform bridge over the renderer library's C vtable.

use crate::ffi::{RendererCreateInfo, RendererVTable};
use crate::status::{self, StatusSlot};
use crate::surface;
use cb_core::{BridgeError, DeviceSize, PlatformBridge, Renderer, RendererConfig};
use raw_window_handle::RawWindowHandle;
use std::ffi::{CString, c_void};
use std::ptr::NonNull;

/// Unresolved host view: raw `UIView *` and `CAMetalLayer *`.
#[derive(Debug, Clone, Copy)]
pub struct IosView {
    pub view: *mut c_void,
    pub metal_layer: *mut c_void,
}

pub struct IosRenderer {
    handle: NonNull<c_void>,
    vtable: RendererVTable,
    window: RawWindowHandle,
    /// Unregistered after the vtable's `destroy` returns.
    status: StatusSlot,
}

impl IosRenderer {
    pub fn window_handle(&self) -> RawWindowHandle {
        self.window
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.handle.as_ptr()
    }

    pub fn status_slot(&self) -> &StatusSlot {
        &self.status
    }
}

// SAFETY (renderer calls): `handle` came from `create_canvas` and is
// released only by `IosBridge::destroy_renderer`.
impl Renderer for IosRenderer {
    fn advance_frame(&mut self) {
        if let Some(f) = self.vtable.advance_frame {
            unsafe { f(self.handle.as_ptr()) }
        }
    }

    fn notify_resized(&mut self, size: DeviceSize) {
        match self.vtable.resize {
            Some(f) => unsafe { f(self.handle.as_ptr(), size.width, size.height) },
            None => log::warn!("renderer has no resize entry, {size} dropped"),
        }
    }
}

pub struct IosBridge {
    vtable: RendererVTable,
    host_context: *mut c_void,
}

impl IosBridge {
    pub fn new(vtable: RendererVTable, host_context: *mut c_void) -> Result<Self, BridgeError> {
        if vtable.create_canvas.is_none() || vtable.advance_frame.is_none() {
            return Err(BridgeError::InvalidConfig(
                "renderer vtable needs create_canvas and advance_frame".to_string(),
            ));
        }
        Ok(Self {
            vtable,
            host_context,
        })
    }
}

impl PlatformBridge for IosBridge {
    type View = IosView;
    type Renderer = IosRenderer;

    fn create_renderer(
        &mut self,
        config: RendererConfig<IosView>,
    ) -> Result<IosRenderer, BridgeError> {
        let window = surface::ui_kit_handle(config.view.view)?;
        if config.view.metal_layer.is_null() {
            return Err(BridgeError::InvalidHostSurface(
                "CAMetalLayer pointer is null".to_string(),
            ));
        }
        let scratch = CString::new(config.scratch_directory.to_string_lossy().into_owned())
            .map_err(|_| BridgeError::InvalidConfig("scratch directory contains NUL".to_string()))?;
        let Some(create) = self.vtable.create_canvas else {
            return Err(BridgeError::RendererCreation("no create_canvas entry".to_string()));
        };

        let slot = StatusSlot::register(config.status);
        let info = RendererCreateInfo {
            view: config.view.view,
            metal_layer: config.view.metal_layer,
            maximum_frame_rate: config.maximum_frame_rate.get(),
            temporary_directory: scratch.as_ptr(),
            host_context: self.host_context,
            status_context: slot.context(),
            status_callback: status::post_status,
        };
        // SAFETY: `info` and everything it points to outlive the call.
        let raw = unsafe { create(&info) };
        let handle = NonNull::new(raw).ok_or_else(|| {
            BridgeError::RendererCreation("create_canvas returned null".to_string())
        })?;
        log::debug!("renderer created on {window:?}");
        Ok(IosRenderer {
            handle,
            vtable: self.vtable,
            window,
            status: slot,
        })
    }

    fn destroy_renderer(&mut self, renderer: IosRenderer) {
        if let Some(f) = renderer.vtable.destroy {
            // SAFETY: the handle is live and never used again.
            unsafe { f(renderer.handle.as_ptr()) }
        }
    }
}
