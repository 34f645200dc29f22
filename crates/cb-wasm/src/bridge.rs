//! Browser platform bridge.
//!
//! Resolves a container element into a `<canvas>` and hands it to the JS
//! renderer factory together with the status callback. The renderer side
//! of the contract is a plain JS object:
//!
//! ```js
//! createCanvas({ canvas, maximumFrameRate, scratchDirectory, statusCallback })
//!   -> { advanceFrame(), resize(width, height), destroy() }
//! ```

use crate::surface::{self, SurfaceTarget};
use cb_core::{BridgeError, DeviceSize, PlatformBridge, Renderer, RendererConfig, StatusSender};
use js_sys::{Function, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlCanvasElement, Window};

#[wasm_bindgen]
extern "C" {
    /// Renderer object returned by the page's `createCanvas` factory.
    pub type JsRenderer;

    #[wasm_bindgen(method, catch, js_name = advanceFrame)]
    fn advance_frame(this: &JsRenderer) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn resize(this: &JsRenderer, width: u32, height: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn destroy(this: &JsRenderer) -> Result<(), JsValue>;
}

/// Host view on the web: the id of the container element.
pub struct WebView {
    pub container_id: String,
}

pub struct WebRenderer {
    js: JsRenderer,
    target: SurfaceTarget,
    initial_size: DeviceSize,
}

impl WebRenderer {
    pub fn target(&self) -> &SurfaceTarget {
        &self.target
    }

    /// Drawable size the canvas was given at creation.
    pub fn initial_size(&self) -> DeviceSize {
        self.initial_size
    }
}

impl Renderer for WebRenderer {
    fn advance_frame(&mut self) {
        if let Err(e) = self.js.advance_frame() {
            log::error!("renderer advanceFrame threw: {e:?}");
        }
    }

    fn notify_resized(&mut self, size: DeviceSize) {
        if let Err(e) = self.js.resize(size.width, size.height) {
            log::error!("renderer resize({size}) threw: {e:?}");
        }
    }
}

pub struct WebBridge {
    window: Window,
    document: Document,
    factory: Function,
    /// Schedules a status drain on the next task.
    drain: Function,
}

impl WebBridge {
    pub fn new(window: Window, document: Document, factory: Function, drain: Function) -> Self {
        Self {
            window,
            document,
            factory,
            drain,
        }
    }

    fn resolve_canvas(&self, container_id: &str) -> Result<SurfaceTarget, BridgeError> {
        let container = self
            .document
            .get_element_by_id(container_id)
            .ok_or_else(|| {
                BridgeError::InvalidHostSurface(format!("no element with id `{container_id}`"))
            })?;
        let existing = container
            .query_selector("canvas")
            .map_err(|e| BridgeError::InvalidHostSurface(format!("{e:?}")))?;
        let canvas = match existing {
            Some(element) => element,
            None => {
                let element = self
                    .document
                    .create_element("canvas")
                    .map_err(|e| BridgeError::InvalidHostSurface(format!("{e:?}")))?;
                container
                    .append_child(&element)
                    .map_err(|e| BridgeError::InvalidHostSurface(format!("{e:?}")))?;
                element
            }
        };
        let canvas = canvas.dyn_into::<HtmlCanvasElement>().map_err(|_| {
            BridgeError::InvalidHostSurface("container child is not a canvas".to_string())
        })?;
        Ok(SurfaceTarget { container, canvas })
    }

    /// The `statusCallback` handed to the renderer. Ownership passes to JS,
    /// so the function stays callable after the canvas is destroyed or
    /// freed; by then the queue is gone and late codes are dropped.
    fn status_callback(&self, sender: StatusSender) -> JsValue {
        let window = self.window.clone();
        let drain = self.drain.clone();
        Closure::<dyn FnMut(i32)>::new(move |code: i32| {
            if !sender.post(code) {
                return;
            }
            if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&drain, 0) {
                log::error!("failed to schedule status drain: {e:?}");
            }
        })
        .into_js_value()
    }
}

impl PlatformBridge for WebBridge {
    type View = WebView;
    type Renderer = WebRenderer;

    fn create_renderer(
        &mut self,
        config: RendererConfig<WebView>,
    ) -> Result<WebRenderer, BridgeError> {
        let target = self.resolve_canvas(&config.view.container_id)?;
        let ratio = self.window.device_pixel_ratio();
        let geometry = surface::measure(&target.container, ratio);
        let initial_size = geometry.device_size();
        surface::apply(&target.canvas, &geometry, initial_size)
            .map_err(|e| BridgeError::InvalidHostSurface(format!("{e:?}")))?;

        let status = self.status_callback(config.status);
        let options = Object::new();
        let set = |key: &str, value: &JsValue| {
            Reflect::set(&options, &JsValue::from_str(key), value)
                .map_err(|e| BridgeError::RendererCreation(format!("{e:?}")))
        };
        set("canvas", target.canvas.as_ref())?;
        set(
            "maximumFrameRate",
            &JsValue::from(config.maximum_frame_rate.get()),
        )?;
        set(
            "scratchDirectory",
            &JsValue::from_str(&config.scratch_directory.to_string_lossy()),
        )?;
        set("statusCallback", &status)?;

        let value = self
            .factory
            .call1(&JsValue::NULL, &options)
            .map_err(|e| BridgeError::RendererCreation(format!("createCanvas threw: {e:?}")))?;
        let has_advance = Reflect::get(&value, &JsValue::from_str("advanceFrame"))
            .map(|f| f.is_function())
            .unwrap_or(false);
        if !value.is_object() || !has_advance {
            return Err(BridgeError::RendererCreation(
                "createCanvas must return an object with advanceFrame()".to_string(),
            ));
        }

        Ok(WebRenderer {
            js: value.unchecked_into(),
            target,
            initial_size,
        })
    }

    fn destroy_renderer(&mut self, renderer: WebRenderer) {
        if let Err(e) = renderer.js.destroy() {
            log::warn!("renderer destroy threw: {e:?}");
        }
    }
}
