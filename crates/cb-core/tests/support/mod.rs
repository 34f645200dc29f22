//! Shared fakes for the integration tests: a manual clock driving the
//! debounce timer, a recording renderer, and a fake host surface.

#![allow(dead_code)]

use cb_core::{
    BridgeConfig, BridgeError, CanvasGeometry, CanvasHost, DebounceTimer, DeviceSize,
    PlatformBridge, RefreshSource, Renderer, RendererConfig, ResizeRequest, StatusSender,
    SurfaceHost, SurfaceUpdate, TimerId, TimerOutcome,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Advance,
    Resize(DeviceSize),
    Destroy,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct FakeRenderer {
    calls: CallLog,
    pub status: StatusSender,
}

impl Renderer for FakeRenderer {
    fn advance_frame(&mut self) {
        self.calls.borrow_mut().push(Call::Advance);
    }

    fn notify_resized(&mut self, size: DeviceSize) {
        self.calls.borrow_mut().push(Call::Resize(size));
    }
}

/// View is a container id; `None` cannot be resolved.
pub struct FakeBridge {
    calls: CallLog,
    pub created: usize,
    pub destroyed: usize,
    pub status: Rc<RefCell<Option<StatusSender>>>,
}

impl PlatformBridge for FakeBridge {
    type View = Option<&'static str>;
    type Renderer = FakeRenderer;

    fn create_renderer(
        &mut self,
        config: RendererConfig<Self::View>,
    ) -> Result<FakeRenderer, BridgeError> {
        let Some(_container) = config.view else {
            return Err(BridgeError::InvalidHostSurface(
                "container not found".to_string(),
            ));
        };
        self.created += 1;
        *self.status.borrow_mut() = Some(config.status.clone());
        Ok(FakeRenderer {
            calls: self.calls.clone(),
            status: config.status,
        })
    }

    fn destroy_renderer(&mut self, _renderer: FakeRenderer) {
        self.destroyed += 1;
        self.calls.borrow_mut().push(Call::Destroy);
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub resumed: usize,
    pub suspended: usize,
}

impl RefreshSource for FakeSource {
    fn resume(&mut self) {
        self.resumed += 1;
    }

    fn suspend(&mut self) {
        self.suspended += 1;
    }
}

/// Debounce timer backed by the shared manual clock.
pub struct ManualTimer {
    now: Rc<Cell<Duration>>,
    due: Rc<RefCell<Vec<(TimerId, Duration)>>>,
}

impl DebounceTimer for ManualTimer {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        self.due.borrow_mut().push((id, self.now.get() + delay));
    }

    fn cancel(&mut self, id: TimerId) {
        self.due.borrow_mut().retain(|(t, _)| *t != id);
    }
}

pub struct FakeSurface {
    pub ratio: f64,
    pub applied: Vec<DeviceSize>,
}

impl SurfaceHost for FakeSurface {
    fn device_pixel_ratio(&self) -> f64 {
        self.ratio
    }

    fn apply_drawable_size(&mut self, request: &ResizeRequest) -> SurfaceUpdate {
        self.applied.push(request.device);
        SurfaceUpdate::Applied
    }
}

pub type Host = CanvasHost<FakeBridge, FakeSource, ManualTimer>;

pub struct Harness {
    pub host: Host,
    pub surface: FakeSurface,
    pub calls: CallLog,
    pub status: Rc<RefCell<Option<StatusSender>>>,
    pub timer_outcomes: Vec<TimerOutcome>,
    now: Rc<Cell<Duration>>,
    due: Rc<RefCell<Vec<(TimerId, Duration)>>>,
}

impl Harness {
    pub fn new() -> Self {
        let calls: CallLog = Rc::default();
        let status = Rc::new(RefCell::new(None));
        let now = Rc::new(Cell::new(Duration::ZERO));
        let due = Rc::new(RefCell::new(Vec::new()));
        let bridge = FakeBridge {
            calls: calls.clone(),
            created: 0,
            destroyed: 0,
            status: status.clone(),
        };
        let timer = ManualTimer {
            now: now.clone(),
            due: due.clone(),
        };
        let host = CanvasHost::new(bridge, FakeSource::default(), timer, &BridgeConfig::default())
            .expect("default config is valid");
        Self {
            host,
            surface: FakeSurface {
                ratio: 1.0,
                applied: Vec::new(),
            },
            calls,
            status,
            timer_outcomes: Vec::new(),
            now,
            due,
        }
    }

    /// Create the renderer for a resolvable container and report `Created`.
    pub fn live(initial: Option<DeviceSize>) -> Self {
        let mut h = Self::new();
        h.host
            .create_renderer(Some("canvas_container"), PathBuf::from("/tmp"))
            .expect("renderer created");
        if let Some(size) = initial {
            h.host.seed_applied_size(size);
        }
        h.post_status(0);
        h.host.dispatch_statuses();
        h
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn post_status(&self, code: i32) {
        if let Some(sender) = self.status.borrow().as_ref() {
            sender.post(code);
        }
    }

    /// Post an ack and drain it on the "UI context".
    pub fn ack(&mut self) {
        self.post_status(2);
        self.host.dispatch_statuses();
    }

    pub fn raw(&mut self, at_ms: u64, width: f64, height: f64) {
        self.advance_to(at_ms);
        let now = self.now();
        self.host
            .raw_size_changed(CanvasGeometry::new(width, height, self.surface.ratio), now);
    }

    /// Move the clock forward, firing due timers in deadline order.
    pub fn advance_to(&mut self, at_ms: u64) {
        let target = Duration::from_millis(at_ms);
        loop {
            let next = {
                let due = self.due.borrow();
                due.iter()
                    .filter(|(_, at)| *at <= target)
                    .min_by_key(|(_, at)| *at)
                    .copied()
            };
            let Some((id, at)) = next else { break };
            self.due.borrow_mut().retain(|(t, _)| *t != id);
            self.now.set(at);
            let outcome = self.host.on_timer_elapsed(id, &mut self.surface);
            self.timer_outcomes.push(outcome);
        }
        if target > self.now.get() {
            self.now.set(target);
        }
    }

    pub fn tick(&mut self, at_ms: f64) -> cb_core::TickOutcome {
        self.host.on_refresh_tick(Duration::from_secs_f64(at_ms / 1000.0))
    }

    pub fn resizes(&self) -> Vec<DeviceSize> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Resize(size) => Some(*size),
                _ => None,
            })
            .collect()
    }

    pub fn advances(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Advance))
            .count()
    }

    pub fn pending_timers(&self) -> usize {
        self.due.borrow().len()
    }
}
