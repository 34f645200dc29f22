//! Container measurement and the canvas side of a resize.

use crate::events::{self, CANVAS_SIZE_NEED_CHANGE};
use cb_core::{CanvasGeometry, DeviceSize, ResizeRequest, ResizeState, SurfaceHost, SurfaceUpdate};
use wasm_bindgen::JsValue;
use web_sys::{Element, HtmlCanvasElement, Window};

/// The container element and the canvas inside it.
#[derive(Clone)]
pub struct SurfaceTarget {
    pub container: Element,
    pub canvas: HtmlCanvasElement,
}

/// Logical size of `container` at the given pixel ratio.
pub fn measure(container: &Element, ratio: f64) -> CanvasGeometry {
    let rect = container.get_bounding_client_rect();
    CanvasGeometry::new(rect.width(), rect.height(), ratio)
}

/// Size the canvas: CSS box to the logical size, backing buffer to `device`.
pub fn apply(
    canvas: &HtmlCanvasElement,
    geometry: &CanvasGeometry,
    device: DeviceSize,
) -> Result<(), JsValue> {
    let style = canvas.style();
    style.set_property("width", &css_px(geometry.css_width))?;
    style.set_property("height", &css_px(geometry.css_height))?;
    canvas.set_width(device.width);
    canvas.set_height(device.height);
    Ok(())
}

pub fn css_px(value: f64) -> String {
    format!("{value}px")
}

pub fn resize_state_name(state: ResizeState) -> &'static str {
    match state {
        ResizeState::Idle => "idle",
        ResizeState::Debouncing => "debouncing",
        ResizeState::AwaitingAck => "awaiting_ack",
    }
}

/// `SurfaceHost` over the live canvas.
///
/// In deferred mode the bridge only announces the new size with
/// `canvas_size_need_change`; the page resizes the canvas itself and answers
/// with `canvas_resize_completed`.
pub struct CanvasSurface {
    window: Window,
    target: Option<SurfaceTarget>,
    defer: bool,
}

impl CanvasSurface {
    pub fn new(window: Window, defer: bool) -> Self {
        Self {
            window,
            target: None,
            defer,
        }
    }

    pub fn attach(&mut self, target: SurfaceTarget) {
        self.target = Some(target);
    }

    pub fn detach(&mut self) {
        self.target = None;
    }

    pub fn target(&self) -> Option<&SurfaceTarget> {
        self.target.as_ref()
    }

    /// Current container geometry, if attached.
    pub fn measure(&self) -> Option<CanvasGeometry> {
        self.target
            .as_ref()
            .map(|t| measure(&t.container, self.window.device_pixel_ratio()))
    }
}

impl SurfaceHost for CanvasSurface {
    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    fn apply_drawable_size(&mut self, request: &ResizeRequest) -> SurfaceUpdate {
        let Some(target) = &self.target else {
            return SurfaceUpdate::Applied;
        };
        if !self.defer {
            if let Err(e) = apply(&target.canvas, &request.geometry, request.device) {
                log::error!("failed to size canvas to {}: {e:?}", request.device);
            }
        }
        if let Err(e) = events::dispatch(&target.container, CANVAS_SIZE_NEED_CHANGE) {
            log::warn!("failed to dispatch {CANVAS_SIZE_NEED_CHANGE}: {e:?}");
        }
        if self.defer {
            SurfaceUpdate::Deferred
        } else {
            SurfaceUpdate::Applied
        }
    }
}
