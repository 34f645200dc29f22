//! Resize coordinator: serializes and coalesces host size changes.
//!
//! Resizing the backing surface while the renderer is still reconfiguring
//! for a previous size faults some renderers, so size changes go through a
//! small handshake:
//!
//! ```text
//!   Idle ──raw──▶ Debouncing ──timer──▶ AwaitingAck ──ack──▶ Idle
//!                  ▲   │  ▲                  │
//!                  └raw┘  └─timer (busy)─────┘ raw (busy kept)
//! ```
//!
//! - Every raw change overwrites the pending geometry and restarts the
//!   debounce timer; only the last geometry of a burst is used.
//! - At most one request is outstanding. A timer that elapses while a
//!   request is outstanding is rescheduled for a full window instead of
//!   racing it.
//! - A burst that resolves to the currently applied device size (or to an
//!   empty surface) is dropped without notifying the renderer.
//!
//! All coordinator state is per canvas; nothing is shared process-wide.

use crate::bridge::Renderer;
use crate::geometry::{CanvasGeometry, DeviceSize};
use std::time::Duration;

/// Identifies one scheduled debounce callback.
pub type TimerId = u64;

/// Host-scheduled one-shot callbacks. When a scheduled timer elapses the
/// host calls back into the coordinator with the same id.
pub trait DebounceTimer {
    fn schedule(&mut self, id: TimerId, delay: Duration);
    fn cancel(&mut self, id: TimerId);
}

/// A coalesced resize handed to the host and the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRequest {
    pub id: u64,
    /// Logical geometry with the pixel ratio sampled at resolution time.
    pub geometry: CanvasGeometry,
    pub device: DeviceSize,
}

/// Result of asking the host to resize its drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceUpdate {
    /// The drawable already has the requested size.
    Applied,
    /// The host will signal completion later via `on_surface_resized`.
    Deferred,
}

/// The host side of a resize: its drawable element or layer.
pub trait SurfaceHost {
    /// Current device pixel ratio, sampled once per resolution.
    fn device_pixel_ratio(&self) -> f64;

    /// Resize the host drawable before the renderer is told.
    fn apply_drawable_size(&mut self, request: &ResizeRequest) -> SurfaceUpdate;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeState {
    #[default]
    Idle,
    Debouncing,
    AwaitingAck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Resolved to the currently applied device size.
    Unchanged,
    EmptySurface,
    NoRenderer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerOutcome {
    /// A resize request was issued.
    Requested(ResizeRequest),
    /// A request is still outstanding; waiting another full window.
    Rescheduled,
    Dropped(DropReason),
    /// Superseded, cancelled, or after teardown.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AckOutcome {
    Completed(ResizeRequest),
    /// Nothing was awaiting an ack, or the view was torn down.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    request: ResizeRequest,
    renderer_notified: bool,
}

pub struct ResizeCoordinator<T> {
    timer: T,
    debounce: Duration,
    state: ResizeState,
    pending: Option<CanvasGeometry>,
    last_raw_change: Option<Duration>,
    armed: Option<TimerId>,
    next_timer: TimerId,
    in_flight: Option<InFlight>,
    applied: Option<DeviceSize>,
    next_request: u64,
    torn_down: bool,
}

impl<T: DebounceTimer> ResizeCoordinator<T> {
    pub fn new(timer: T, debounce: Duration) -> Self {
        Self {
            timer,
            debounce,
            state: ResizeState::Idle,
            pending: None,
            last_raw_change: None,
            armed: None,
            next_timer: 1,
            in_flight: None,
            applied: None,
            next_request: 1,
            torn_down: false,
        }
    }

    pub fn state(&self) -> ResizeState {
        self.state
    }

    pub fn pending(&self) -> Option<CanvasGeometry> {
        self.pending
    }

    pub fn applied(&self) -> Option<DeviceSize> {
        self.applied
    }

    pub fn last_raw_change(&self) -> Option<Duration> {
        self.last_raw_change
    }

    /// Busy marker: a request has been issued and not yet acknowledged.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<ResizeRequest> {
        self.in_flight.map(|f| f.request)
    }

    pub fn armed_timer(&self) -> Option<TimerId> {
        self.armed
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Record the drawable size the renderer was created with.
    pub fn seed_applied(&mut self, size: DeviceSize) {
        self.applied = Some(size);
    }

    /// A raw size change from the host. Always (re)enters `Debouncing`.
    pub fn raw_size_changed(&mut self, geometry: CanvasGeometry, now: Duration) {
        if self.torn_down {
            return;
        }
        self.pending = Some(geometry);
        self.last_raw_change = Some(now);
        self.state = ResizeState::Debouncing;
        self.arm();
    }

    /// The debounce timer `id` elapsed.
    pub fn on_timer_elapsed<R, H>(
        &mut self,
        id: TimerId,
        renderer: Option<&mut R>,
        host: &mut H,
    ) -> TimerOutcome
    where
        R: Renderer + ?Sized,
        H: SurfaceHost + ?Sized,
    {
        if self.torn_down || self.armed != Some(id) {
            log::debug!("stale resize timer {id} ignored");
            return TimerOutcome::Stale;
        }
        self.armed = None;

        if self.in_flight.is_some() {
            log::debug!("resize still outstanding, rescheduling");
            self.arm();
            return TimerOutcome::Rescheduled;
        }

        let Some(pending) = self.pending.take() else {
            self.state = ResizeState::Idle;
            return TimerOutcome::Stale;
        };
        let geometry = pending.with_ratio(host.device_pixel_ratio());
        let device = geometry.device_size();

        if device.is_empty() {
            return self.drop_burst(DropReason::EmptySurface);
        }
        if self.applied == Some(device) {
            return self.drop_burst(DropReason::Unchanged);
        }
        let Some(renderer) = renderer else {
            return self.drop_burst(DropReason::NoRenderer);
        };

        let request = ResizeRequest {
            id: self.next_request,
            geometry,
            device,
        };
        self.next_request += 1;
        self.applied = Some(device);
        self.state = ResizeState::AwaitingAck;

        let renderer_notified = match host.apply_drawable_size(&request) {
            SurfaceUpdate::Applied => {
                renderer.notify_resized(device);
                true
            }
            SurfaceUpdate::Deferred => false,
        };
        self.in_flight = Some(InFlight {
            request,
            renderer_notified,
        });
        log::debug!("resize #{} to {device} issued", request.id);
        TimerOutcome::Requested(request)
    }

    /// The host finished resizing its drawable for a deferred request.
    /// Returns `true` if the renderer was notified.
    pub fn on_surface_resized<R: Renderer + ?Sized>(
        &mut self,
        request_id: u64,
        renderer: Option<&mut R>,
    ) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(flight) = self.in_flight.as_mut() else {
            return false;
        };
        if flight.request.id != request_id || flight.renderer_notified {
            log::debug!("surface completion for #{request_id} ignored");
            return false;
        }
        let Some(renderer) = renderer else {
            return false;
        };
        flight.renderer_notified = true;
        renderer.notify_resized(flight.request.device);
        true
    }

    /// The renderer acknowledged the outstanding resize.
    pub fn ack_received(&mut self) -> AckOutcome {
        if self.torn_down {
            log::debug!("resize ack after teardown discarded");
            return AckOutcome::Stale;
        }
        match self.in_flight {
            Some(flight) if flight.renderer_notified => {
                self.in_flight = None;
                if self.state == ResizeState::AwaitingAck {
                    self.state = ResizeState::Idle;
                }
                log::debug!("resize #{} acknowledged", flight.request.id);
                AckOutcome::Completed(flight.request)
            }
            _ => {
                log::debug!("unexpected resize ack discarded");
                AckOutcome::Stale
            }
        }
    }

    /// Cancel the debounce timer and forget any outstanding request. Every
    /// later call is a no-op.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        if let Some(id) = self.armed.take() {
            self.timer.cancel(id);
        }
        self.torn_down = true;
        self.pending = None;
        self.in_flight = None;
        self.state = ResizeState::Idle;
    }

    fn arm(&mut self) {
        if let Some(id) = self.armed.take() {
            self.timer.cancel(id);
        }
        let id = self.next_timer;
        self.next_timer += 1;
        self.armed = Some(id);
        self.timer.schedule(id, self.debounce);
    }

    fn drop_burst(&mut self, reason: DropReason) -> TimerOutcome {
        log::debug!("resize burst dropped: {reason:?}");
        self.state = ResizeState::Idle;
        TimerOutcome::Dropped(reason)
    }
}
