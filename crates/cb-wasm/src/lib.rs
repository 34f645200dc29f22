//! WASM host for the canvas bridge: embeds a JS/WebGPU renderer in a page
//! container element.
//!
//! Compiled via `wasm-pack build --target web`. The page constructs a
//! [`WebCanvas`] with a container id and a `createCanvas` factory, then
//! drives visibility with `start()` / `pause()`. Window resizes are
//! debounced and forwarded to the renderer; renderer status codes come back
//! through the status callback and are handled on the next task.

mod bridge;
mod events;
mod scheduler;
mod surface;

pub use bridge::{WebBridge, WebRenderer, WebView};
pub use scheduler::{AnimationFrameLoop, WindowTimer};
pub use surface::{CanvasSurface, SurfaceTarget};

use cb_core::{BridgeConfig, BridgeError, CallbackDispatcher, CanvasHost};
use events::{CANVAS_ANIMATION_RESUME, CANVAS_ANIMATION_SUSPEND, CANVAS_RESIZE_COMPLETED};
use js_sys::Function;
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Event, EventTarget, Window};

type Host = CanvasHost<WebBridge, AnimationFrameLoop, WindowTimer>;

/// Options accepted by the `WebCanvas` constructor, as JSON.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WebOptions {
    #[serde(flatten)]
    bridge: BridgeConfig,
    /// Leave the canvas buffer to the page; wait for `canvas_resize_completed`.
    defer_surface_resize: bool,
    scratch_directory: String,
}

impl WebOptions {
    fn from_json(json: &str) -> Result<Self, BridgeError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let options: Self =
            serde_json::from_str(json).map_err(|e| BridgeError::InvalidConfig(e.to_string()))?;
        options.bridge.validate()?;
        Ok(options)
    }
}

struct Listener {
    target: EventTarget,
    name: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

struct WebHost {
    host: Host,
    surface: CanvasSurface,
    window: Window,
    on_status: Option<Function>,
    /// Owned by JS; a drain queued before the canvas was freed finds no
    /// host and returns.
    drain: Function,
    /// Set by the `canvas_resize_completed` listener, consumed by the drain.
    completion: Rc<Cell<bool>>,
    listeners: Vec<Listener>,
}

impl WebHost {
    fn schedule_drain(window: &Window, drain: &Function) {
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(drain, 0) {
            log::error!("failed to schedule status drain: {e:?}");
        }
    }

    fn listen(&mut self, target: EventTarget, name: &'static str, callback: Closure<dyn FnMut(Event)>) {
        match target.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref()) {
            Ok(()) => self.listeners.push(Listener {
                target,
                name,
                callback,
            }),
            Err(e) => log::warn!("failed to listen for `{name}`: {e:?}"),
        }
    }

    fn teardown(&mut self) {
        for listener in self.listeners.drain(..) {
            if let Err(e) = listener.target.remove_event_listener_with_callback(
                listener.name,
                listener.callback.as_ref().unchecked_ref(),
            ) {
                log::warn!("failed to remove `{}` listener: {e:?}", listener.name);
            }
        }
        self.host.destroy_renderer();
        self.surface.detach();
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ─── Callbacks ───────────────────────────────────────────────────────────

/// Run `f` if the canvas state is still alive. Returns whether it ran.
fn relay<T>(weak: &Weak<T>, f: impl FnOnce(&T)) -> bool {
    match weak.upgrade() {
        Some(inner) => {
            f(&inner);
            true
        }
        None => false,
    }
}

fn now(window: &Window) -> Duration {
    let millis = window.performance().map(|p| p.now()).unwrap_or(0.0);
    Duration::from_secs_f64(millis.max(0.0) / 1000.0)
}

fn on_animation_frame(inner: &RefCell<WebHost>, timestamp: f64) {
    let Ok(mut web) = inner.try_borrow_mut() else {
        log::warn!("animation frame while canvas busy, skipped");
        return;
    };
    let host = &mut web.host;
    host.refresh_source_mut().frame_fired();
    host.on_refresh_tick(Duration::from_secs_f64(timestamp.max(0.0) / 1000.0));
    if host.pump().is_running() {
        host.refresh_source_mut().request_next();
    }
}

fn on_timer(inner: &RefCell<WebHost>, value: JsValue) {
    let Some(id) = scheduler::timer_id(&value) else {
        log::warn!("resize timer fired without an id");
        return;
    };
    let Ok(mut web) = inner.try_borrow_mut() else {
        log::warn!("resize timer {id} fired while canvas busy");
        return;
    };
    let WebHost { host, surface, .. } = &mut *web;
    host.timer_mut().fired(id);
    let outcome = host.on_timer_elapsed(id, surface);
    log::debug!("resize timer {id}: {outcome:?}");
}

fn on_drain(inner: &RefCell<WebHost>) {
    let (statuses, observer) = {
        let Ok(mut web) = inner.try_borrow_mut() else {
            log::warn!("status drain while canvas busy, skipped");
            return;
        };
        let web = &mut *web;
        if web.completion.replace(false) {
            if let Some(request) = web.host.resize().in_flight() {
                web.host.on_surface_resized(request.id);
            }
        }
        (web.host.dispatch_statuses(), web.on_status.clone())
    };
    // Observers run outside the borrow so they may call back into the canvas.
    if let Some(observer) = observer {
        for status in statuses {
            if let Err(e) = observer.call1(&JsValue::NULL, &JsValue::from(status.code())) {
                log::warn!("status observer threw: {e:?}");
            }
        }
    }
}

fn on_window_resize(inner: &RefCell<WebHost>) {
    let Ok(mut web) = inner.try_borrow_mut() else {
        log::warn!("resize event while canvas busy, skipped");
        return;
    };
    let web = &mut *web;
    let Some(geometry) = web.surface.measure() else {
        return;
    };
    let at = now(&web.window);
    web.host.raw_size_changed(geometry, at);
}

fn on_visibility(inner: &RefCell<WebHost>, visible: bool) {
    let Ok(mut web) = inner.try_borrow_mut() else {
        log::warn!("animation toggle while canvas busy, skipped");
        return;
    };
    if visible {
        web.host.view_did_appear();
    } else {
        web.host.view_will_disappear();
    }
}

// ─── JS API ──────────────────────────────────────────────────────────────

/// Canvas controller exposed to the page.
#[wasm_bindgen]
pub struct WebCanvas {
    inner: Rc<RefCell<WebHost>>,
}

#[wasm_bindgen]
impl WebCanvas {
    /// Resolve `container_id`, create the renderer through `create_canvas`
    /// and install the resize and animation listeners.
    ///
    /// Throws if the options are invalid, the container cannot be resolved
    /// or the factory fails. No frames are pumped until `start()` and the
    /// renderer reporting status 0.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container_id: &str,
        create_canvas: Function,
        options_json: &str,
    ) -> Result<WebCanvas, JsValue> {
        init_logging();
        let options = WebOptions::from_json(options_json).map_err(to_js)?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let frame_rate = options.bridge.frame_rate().map_err(to_js)?;
        let debounce = options.bridge.debounce();

        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<WebHost>>| {
            let frame = {
                let weak = weak.clone();
                Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
                    relay(&weak, |inner| on_animation_frame(inner, timestamp));
                })
            };
            let timer = {
                let weak = weak.clone();
                Closure::<dyn FnMut(JsValue)>::new(move |id: JsValue| {
                    relay(&weak, |inner| on_timer(inner, id));
                })
            };
            let drain: Function = {
                let weak = weak.clone();
                Closure::<dyn FnMut()>::new(move || {
                    if !relay(&weak, on_drain) {
                        log::debug!("status drain after the canvas was freed");
                    }
                })
                .into_js_value()
                .unchecked_into()
            };
            let bridge = WebBridge::new(window.clone(), document, create_canvas, drain.clone());
            let host = CanvasHost::assemble(
                bridge,
                AnimationFrameLoop::new(window.clone(), frame),
                WindowTimer::new(window.clone(), timer),
                frame_rate,
                debounce,
                CallbackDispatcher::new(),
            );
            RefCell::new(WebHost {
                host,
                surface: CanvasSurface::new(window.clone(), options.defer_surface_resize),
                window: window.clone(),
                on_status: None,
                drain,
                completion: Rc::new(Cell::new(false)),
                listeners: Vec::new(),
            })
        });

        {
            let mut web = inner.borrow_mut();
            let view = WebView {
                container_id: container_id.to_string(),
            };
            web.host
                .create_renderer(view, PathBuf::from(&options.scratch_directory))
                .map_err(to_js)?;
            let (target, initial) = match web.host.renderer() {
                Some(renderer) => (renderer.target().clone(), renderer.initial_size()),
                None => return Err(JsValue::from_str("renderer missing after creation")),
            };
            web.host.seed_applied_size(initial);
            web.surface.attach(target.clone());
            install_listeners(&mut web, &inner, &target);
        }
        log::info!("canvas bridge attached to #{container_id}");
        Ok(WebCanvas { inner })
    }

    /// The view became visible: resume frame pumping once the renderer is ready.
    pub fn start(&self) -> Result<(), JsValue> {
        self.with_host(|web| web.host.view_did_appear())
    }

    /// The view is hidden: stop pumping frames.
    pub fn pause(&self) -> Result<(), JsValue> {
        self.with_host(|web| web.host.view_will_disappear())
    }

    /// Re-measure the container and feed the size into the debouncer.
    pub fn notify_resize(&self) -> Result<(), JsValue> {
        let inner = self.inner.clone();
        on_window_resize(&inner);
        Ok(())
    }

    /// Observer called with every renderer status code, after the bridge
    /// handled it. Pass `undefined` to clear.
    pub fn set_status_observer(&self, observer: Option<Function>) -> Result<(), JsValue> {
        self.with_host(|web| web.on_status = observer)
    }

    pub fn resize_state(&self) -> String {
        self.inner
            .try_borrow()
            .map(|web| surface::resize_state_name(web.host.resize().state()).to_string())
            .unwrap_or_else(|_| "busy".to_string())
    }

    pub fn frames_delivered(&self) -> f64 {
        self.inner
            .try_borrow()
            .map(|web| web.host.pump().frames_delivered() as f64)
            .unwrap_or(0.0)
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .try_borrow()
            .map(|web| web.host.pump().is_running())
            .unwrap_or(false)
    }

    /// Remove listeners and destroy the renderer. Idempotent.
    pub fn destroy(&self) -> Result<(), JsValue> {
        self.with_host(WebHost::teardown)
    }
}

impl WebCanvas {
    fn with_host(&self, f: impl FnOnce(&mut WebHost)) -> Result<(), JsValue> {
        let mut web = self
            .inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("canvas is busy"))?;
        f(&mut web);
        Ok(())
    }
}

fn install_listeners(web: &mut WebHost, inner: &Rc<RefCell<WebHost>>, target: &SurfaceTarget) {
    let weak = Rc::downgrade(inner);

    let resize = {
        let weak = weak.clone();
        Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            relay(&weak, on_window_resize);
        })
    };
    let window: EventTarget = web.window.clone().into();
    web.listen(window, "resize", resize);

    let completed = {
        let completion = web.completion.clone();
        let window = web.window.clone();
        let drain = web.drain.clone();
        // May fire synchronously inside `apply_drawable_size`; only flag it here.
        Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            completion.set(true);
            WebHost::schedule_drain(&window, &drain);
        })
    };
    let container: EventTarget = target.container.clone().into();
    web.listen(container.clone(), CANVAS_RESIZE_COMPLETED, completed);

    for (name, visible) in [(CANVAS_ANIMATION_RESUME, true), (CANVAS_ANIMATION_SUSPEND, false)] {
        let weak = weak.clone();
        let callback = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            relay(&weak, |inner| on_visibility(inner, visible));
        });
        web.listen(container.clone(), name, callback);
    }
}

fn to_js(err: BridgeError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            if let Err(e) = console_log::init_with_level(log::Level::Debug) {
                web_sys::console::error_1(&format!("canvas bridge logger: {e}").into());
            }
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("canvas bridge panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
