//! Drives the C ABI the way the view controller does, with a fake renderer
//! library and fake host services recording every call.

use cb_core::ResizeState;
use cb_ios::{IosCanvas, status};
use cb_ios::ffi::{
    self, APPLY_DEFERRED, APPLY_DONE, HostCallbacks, IosViewObj, RendererCreateInfo,
    RendererVTable, StatusCallback,
};
use pretty_assertions::assert_eq;
use std::ffi::{CStr, c_void};
use std::ptr;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ev {
    Create { max_fps: u32 },
    Advance,
    Resize(u32, u32),
    Destroy,
    DisplayLinkPaused(bool),
    Schedule { id: u64, delay_ms: u64 },
    Cancel(u64),
    Apply { request: u64, width: u32, height: u32 },
    Wake,
    Status(i32),
}

struct Recorder {
    events: Mutex<Vec<Ev>>,
    scale: f64,
    apply_result: i32,
    status: Mutex<Option<(usize, StatusCallback)>>,
}

impl Recorder {
    fn push(&self, ev: Ev) {
        self.events.lock().unwrap().push(ev);
    }

    fn take(&self) -> Vec<Ev> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Renderer side: report `code` through the status callback.
    fn post(&self, code: i32) {
        let hook = *self.status.lock().unwrap();
        if let Some((context, callback)) = hook {
            unsafe { callback(context as *mut c_void, code) }
        }
    }
}

fn recorder<'a>(context: *mut c_void) -> &'a Recorder {
    unsafe { &*(context as *const Recorder) }
}

// ─── Fake renderer library ───────────────────────────────────────────────

struct FakeRenderer {
    host: *mut c_void,
}

fn fake<'a>(renderer: *mut c_void) -> &'a FakeRenderer {
    unsafe { &*(renderer as *const FakeRenderer) }
}

unsafe extern "C" fn create_canvas(info: *const RendererCreateInfo) -> *mut c_void {
    let info = unsafe { &*info };
    let r = recorder(info.host_context);
    r.push(Ev::Create {
        max_fps: info.maximum_frame_rate,
    });
    *r.status.lock().unwrap() = Some((info.status_context as usize, info.status_callback));
    Box::into_raw(Box::new(FakeRenderer {
        host: info.host_context,
    }))
    .cast()
}

unsafe extern "C" fn advance_frame(renderer: *mut c_void) {
    recorder(fake(renderer).host).push(Ev::Advance);
}

unsafe extern "C" fn resize(renderer: *mut c_void, width: u32, height: u32) {
    recorder(fake(renderer).host).push(Ev::Resize(width, height));
}

unsafe extern "C" fn destroy(renderer: *mut c_void) {
    let renderer = unsafe { Box::from_raw(renderer as *mut FakeRenderer) };
    recorder(renderer.host).push(Ev::Destroy);
}

fn vtable() -> RendererVTable {
    RendererVTable {
        create_canvas: Some(create_canvas),
        advance_frame: Some(advance_frame),
        resize: Some(resize),
        destroy: Some(destroy),
    }
}

// ─── Fake view controller ────────────────────────────────────────────────

unsafe extern "C" fn set_display_link_paused(context: *mut c_void, paused: bool) {
    recorder(context).push(Ev::DisplayLinkPaused(paused));
}

unsafe extern "C" fn schedule_timer(context: *mut c_void, id: u64, delay_ms: u64) {
    recorder(context).push(Ev::Schedule { id, delay_ms });
}

unsafe extern "C" fn cancel_timer(context: *mut c_void, id: u64) {
    recorder(context).push(Ev::Cancel(id));
}

unsafe extern "C" fn content_scale(context: *mut c_void) -> f64 {
    recorder(context).scale
}

unsafe extern "C" fn apply_drawable_size(
    context: *mut c_void,
    request_id: u64,
    width: u32,
    height: u32,
) -> i32 {
    let r = recorder(context);
    r.push(Ev::Apply {
        request: request_id,
        width,
        height,
    });
    r.apply_result
}

unsafe extern "C" fn wake_main(context: *mut c_void) {
    recorder(context).push(Ev::Wake);
}

unsafe extern "C" fn status_changed(context: *mut c_void, code: i32) {
    recorder(context).push(Ev::Status(code));
}

struct Fixture {
    canvas: *mut IosCanvas,
    recorder: Box<Recorder>,
    _view: Box<[u8; 2]>,
}

impl Fixture {
    fn try_new(scale: f64, apply_result: i32, null_view: bool, config: Option<&CStr>) -> Self {
        let recorder = Box::new(Recorder {
            events: Mutex::new(Vec::new()),
            scale,
            apply_result,
            status: Mutex::new(None),
        });
        let mut view = Box::new([0_u8; 2]);
        let object = IosViewObj {
            view: if null_view {
                ptr::null_mut()
            } else {
                (&mut view[0] as *mut u8).cast()
            },
            metal_layer: (&mut view[1] as *mut u8).cast(),
            maximum_frames: 120,
            temporary_directory: c"/tmp/canvas".as_ptr(),
        };
        let callbacks = HostCallbacks {
            context: (&*recorder as *const Recorder).cast_mut().cast(),
            set_display_link_paused: Some(set_display_link_paused),
            schedule_timer: Some(schedule_timer),
            cancel_timer: Some(cancel_timer),
            content_scale: Some(content_scale),
            apply_drawable_size: Some(apply_drawable_size),
            wake_main: Some(wake_main),
            status_changed: Some(status_changed),
        };
        let config = config.map_or(ptr::null(), CStr::as_ptr);
        let canvas = unsafe { ffi::cb_canvas_create(object, vtable(), callbacks, config) };
        Self {
            canvas,
            recorder,
            _view: view,
        }
    }

    fn new(scale: f64, apply_result: i32) -> Self {
        let f = Self::try_new(scale, apply_result, false, None);
        assert!(!f.canvas.is_null());
        f
    }

    /// Renderer reports `Created` and the main thread drains it.
    fn created(&self) {
        self.recorder.post(0);
        assert_eq!(unsafe { ffi::cb_canvas_dispatch_statuses(self.canvas) }, 1);
    }

    fn resize_state(&self) -> ResizeState {
        unsafe { &*self.canvas }.host().resize().state()
    }

    fn destroy(self) -> Vec<Ev> {
        unsafe { ffi::cb_canvas_destroy(self.canvas) };
        self.recorder.take()
    }
}

#[test]
fn null_view_returns_null_without_creating() {
    let f = Fixture::try_new(1.0, APPLY_DONE, true, None);
    assert!(f.canvas.is_null());
    assert!(f.recorder.take().is_empty());
}

#[test]
fn invalid_config_returns_null() {
    let f = Fixture::try_new(1.0, APPLY_DONE, false, Some(c"{\"maximumFrameRate\": 0}"));
    assert!(f.canvas.is_null());
    assert!(f.recorder.take().is_empty());
}

#[test]
fn frames_flow_only_while_visible_and_created() {
    let f = Fixture::new(2.0, APPLY_DONE);
    unsafe {
        ffi::cb_canvas_view_did_appear(f.canvas);
        assert!(!ffi::cb_canvas_enter_frame(f.canvas, 0.0));
    }
    f.created();

    unsafe {
        for i in 1..=3 {
            assert!(ffi::cb_canvas_enter_frame(f.canvas, i as f64 / 60.0));
        }
        ffi::cb_canvas_view_will_disappear(f.canvas);
        assert!(!ffi::cb_canvas_enter_frame(f.canvas, 4.0 / 60.0));
    }

    assert_eq!(
        f.recorder.take(),
        vec![
            Ev::Create { max_fps: 60 },
            Ev::Wake,
            Ev::DisplayLinkPaused(false),
            Ev::Status(0),
            Ev::Advance,
            Ev::Advance,
            Ev::Advance,
            Ev::DisplayLinkPaused(true),
        ]
    );
    assert_eq!(f.destroy(), vec![Ev::Destroy]);
}

#[test]
fn debounced_resize_applies_drawable_then_notifies_renderer() {
    let f = Fixture::new(2.0, APPLY_DONE);
    unsafe { ffi::cb_canvas_set_drawable_size(f.canvas, 200, 100) };
    f.created();
    f.recorder.take();

    unsafe {
        ffi::cb_canvas_size_changed(f.canvas, 120.0, 80.0);
        ffi::cb_canvas_size_changed(f.canvas, 150.0, 100.0);
    }
    assert_eq!(
        f.recorder.take(),
        vec![
            Ev::Schedule { id: 1, delay_ms: 800 },
            Ev::Cancel(1),
            Ev::Schedule { id: 2, delay_ms: 800 },
        ]
    );

    unsafe {
        ffi::cb_canvas_timer_fired(f.canvas, 1);
        ffi::cb_canvas_timer_fired(f.canvas, 2);
    }
    assert_eq!(
        f.recorder.take(),
        vec![
            Ev::Apply {
                request: 1,
                width: 300,
                height: 200
            },
            Ev::Resize(300, 200),
        ]
    );
    assert_eq!(f.resize_state(), ResizeState::AwaitingAck);

    f.recorder.post(2);
    assert_eq!(unsafe { ffi::cb_canvas_dispatch_statuses(f.canvas) }, 1);
    assert_eq!(f.recorder.take(), vec![Ev::Wake, Ev::Status(2)]);
    assert_eq!(f.resize_state(), ResizeState::Idle);
    f.destroy();
}

#[test]
fn deferred_drawable_waits_for_surface_resized() {
    let f = Fixture::new(1.0, APPLY_DEFERRED);
    f.created();
    f.recorder.take();

    unsafe {
        ffi::cb_canvas_size_changed(f.canvas, 640.0, 480.0);
        ffi::cb_canvas_timer_fired(f.canvas, 1);
    }
    assert_eq!(
        f.recorder.take(),
        vec![
            Ev::Schedule { id: 1, delay_ms: 800 },
            Ev::Apply {
                request: 1,
                width: 640,
                height: 480
            },
        ]
    );

    unsafe {
        assert!(!ffi::cb_canvas_surface_resized(f.canvas, 7));
        assert!(ffi::cb_canvas_surface_resized(f.canvas, 1));
        assert!(!ffi::cb_canvas_surface_resized(f.canvas, 1));
    }
    assert_eq!(f.recorder.take(), vec![Ev::Resize(640, 480)]);
    f.destroy();
}

#[test]
fn config_json_sets_the_debounce_window() {
    let f = Fixture::try_new(1.0, APPLY_DONE, false, Some(c"{\"debounceMs\": 250}"));
    assert!(!f.canvas.is_null());
    unsafe { ffi::cb_canvas_size_changed(f.canvas, 10.0, 10.0) };
    assert_eq!(
        f.recorder.take(),
        vec![
            Ev::Create { max_fps: 60 },
            Ev::Schedule { id: 1, delay_ms: 250 },
        ]
    );
    f.destroy();
}

#[test]
fn destroy_cancels_armed_timer_and_releases_renderer() {
    let f = Fixture::new(1.0, APPLY_DONE);
    f.created();
    unsafe {
        ffi::cb_canvas_view_did_appear(f.canvas);
        ffi::cb_canvas_size_changed(f.canvas, 300.0, 300.0);
    }
    f.recorder.take();

    assert_eq!(
        f.destroy(),
        vec![Ev::DisplayLinkPaused(true), Ev::Cancel(1), Ev::Destroy]
    );
}

#[test]
fn unrecognized_status_is_forwarded_but_inert() {
    let f = Fixture::new(1.0, APPLY_DONE);
    f.recorder.post(9);
    f.recorder.post(1);
    unsafe {
        ffi::cb_canvas_view_did_appear(f.canvas);
        assert_eq!(ffi::cb_canvas_dispatch_statuses(f.canvas), 2);
        assert!(!ffi::cb_canvas_enter_frame(f.canvas, 0.0));
    }
    assert_eq!(
        f.recorder.take(),
        vec![
            Ev::Create { max_fps: 60 },
            Ev::Wake,
            Ev::Wake,
            Ev::Status(9),
            Ev::Status(1),
        ]
    );
    f.destroy();
}

#[test]
fn status_after_destroy_is_dropped() {
    let f = Fixture::new(1.0, APPLY_DONE);
    let slot = unsafe { &*f.canvas }
        .host()
        .renderer()
        .map(|r| r.status_slot().id())
        .unwrap();
    assert!(status::is_registered(slot));

    unsafe { ffi::cb_canvas_destroy(f.canvas) };
    assert_eq!(
        f.recorder.take(),
        vec![Ev::Create { max_fps: 60 }, Ev::Destroy]
    );
    assert!(!status::is_registered(slot));

    // The renderer's worker still holds the context and reports late.
    std::thread::scope(|s| {
        s.spawn(|| {
            f.recorder.post(2);
            f.recorder.post(0);
        });
    });
    assert!(f.recorder.take().is_empty());
}
