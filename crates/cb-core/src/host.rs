//! Canvas host: one view lifetime of bridge, pump, coordinator and dispatcher.
//!
//! The host platform owns a `CanvasHost` and forwards its native
//! notifications into it, all on the UI execution context:
//!
//! - view appear / disappear → [`CanvasHost::view_did_appear`] /
//!   [`CanvasHost::view_will_disappear`]
//! - display refresh → [`CanvasHost::on_refresh_tick`]
//! - size change → [`CanvasHost::raw_size_changed`]
//! - debounce timer → [`CanvasHost::on_timer_elapsed`]
//! - renderer status wake-up → [`CanvasHost::dispatch_statuses`]
//!
//! The renderer handle is the only shared resource. The host owns it; the
//! pump and the coordinator only borrow it for the duration of a call.

use crate::bridge::{PlatformBridge, RendererConfig};
use crate::config::BridgeConfig;
use crate::dispatch::{CallbackDispatcher, WakeFn};
use crate::error::BridgeError;
use crate::geometry::{CanvasGeometry, DeviceSize};
use crate::pump::{FramePump, RefreshSource, TickOutcome};
use crate::resize::{
    AckOutcome, DebounceTimer, ResizeCoordinator, SurfaceHost, TimerId, TimerOutcome,
};
use crate::status::RendererStatus;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// No renderer yet.
    Pending,
    Live,
    /// Creation failed; the pump stays paused forever.
    Failed,
    Destroyed,
}

pub struct CanvasHost<B, S, T>
where
    B: PlatformBridge,
    S: RefreshSource,
    T: DebounceTimer,
{
    bridge: B,
    renderer: Option<B::Renderer>,
    pump: FramePump<S>,
    resize: ResizeCoordinator<T>,
    dispatcher: CallbackDispatcher,
    maximum_frame_rate: NonZeroU32,
    lifecycle: Lifecycle,
    visible: bool,
    /// Renderer reported `Created`.
    ready: bool,
}

impl<B, S, T> CanvasHost<B, S, T>
where
    B: PlatformBridge,
    S: RefreshSource,
    T: DebounceTimer,
{
    pub fn new(bridge: B, source: S, timer: T, config: &BridgeConfig) -> Result<Self, BridgeError> {
        Self::build(bridge, source, timer, config, CallbackDispatcher::new())
    }

    /// Like [`CanvasHost::new`], with a hook the renderer's status thread
    /// uses to ask for a drain on the UI context.
    pub fn with_wake(
        bridge: B,
        source: S,
        timer: T,
        config: &BridgeConfig,
        wake: WakeFn,
    ) -> Result<Self, BridgeError> {
        Self::build(bridge, source, timer, config, CallbackDispatcher::with_wake(wake))
    }

    fn build(
        bridge: B,
        source: S,
        timer: T,
        config: &BridgeConfig,
        dispatcher: CallbackDispatcher,
    ) -> Result<Self, BridgeError> {
        config.validate()?;
        Ok(Self::assemble(
            bridge,
            source,
            timer,
            config.frame_rate()?,
            config.debounce(),
            dispatcher,
        ))
    }

    /// Infallible constructor for already validated limits.
    pub fn assemble(
        bridge: B,
        source: S,
        timer: T,
        maximum_frame_rate: NonZeroU32,
        debounce: Duration,
        dispatcher: CallbackDispatcher,
    ) -> Self {
        Self {
            bridge,
            renderer: None,
            pump: FramePump::new(source, maximum_frame_rate),
            resize: ResizeCoordinator::new(timer, debounce),
            dispatcher,
            maximum_frame_rate,
            lifecycle: Lifecycle::Pending,
            visible: false,
            ready: false,
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Resolve the host view and create the renderer. One attempt per
    /// host: after a failure every later call returns
    /// [`BridgeError::CreationFailed`].
    pub fn create_renderer(
        &mut self,
        view: B::View,
        scratch_directory: PathBuf,
    ) -> Result<(), BridgeError> {
        match self.lifecycle {
            Lifecycle::Live => return Err(BridgeError::AlreadyCreated),
            Lifecycle::Failed => return Err(BridgeError::CreationFailed),
            Lifecycle::Destroyed => return Err(BridgeError::Destroyed),
            Lifecycle::Pending => {}
        }
        let config = RendererConfig {
            view,
            maximum_frame_rate: self.maximum_frame_rate,
            scratch_directory,
            status: self.dispatcher.sender(),
        };
        match self.bridge.create_renderer(config) {
            Ok(renderer) => {
                self.renderer = Some(renderer);
                self.lifecycle = Lifecycle::Live;
                log::info!("renderer created");
                Ok(())
            }
            Err(err) => {
                self.lifecycle = Lifecycle::Failed;
                self.pump.pause();
                log::warn!("renderer creation failed: {err}");
                Err(err)
            }
        }
    }

    /// Tear down: pause the pump, invalidate pending resize work, release
    /// the renderer. Idempotent.
    pub fn destroy_renderer(&mut self) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.lifecycle = Lifecycle::Destroyed;
        self.pump.pause();
        self.resize.teardown();
        if let Some(renderer) = self.renderer.take() {
            self.bridge.destroy_renderer(renderer);
            log::info!("renderer destroyed");
        }
    }

    /// Record the drawable size the view already has; a first resize burst
    /// resolving to it is dropped.
    pub fn seed_applied_size(&mut self, size: DeviceSize) {
        self.resize.seed_applied(size);
    }

    pub fn view_did_appear(&mut self) {
        self.visible = true;
        self.try_start();
    }

    pub fn view_will_disappear(&mut self) {
        self.visible = false;
        self.pump.pause();
    }

    fn try_start(&mut self) {
        if self.visible && self.ready && self.lifecycle == Lifecycle::Live {
            self.pump.start();
        }
    }

    // ─── Host notifications ──────────────────────────────────────────────

    /// Forward one display refresh. Statuses are not drained here; hosts
    /// call [`CanvasHost::dispatch_statuses`] themselves so they can mirror
    /// each status to their own observers.
    pub fn on_refresh_tick(&mut self, now: Duration) -> TickOutcome {
        self.pump.on_host_refresh_tick(now, self.renderer.as_mut())
    }

    pub fn raw_size_changed(&mut self, geometry: CanvasGeometry, now: Duration) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        self.resize.raw_size_changed(geometry, now);
    }

    pub fn on_timer_elapsed<H>(&mut self, id: TimerId, surface: &mut H) -> TimerOutcome
    where
        H: SurfaceHost + ?Sized,
    {
        self.resize
            .on_timer_elapsed(id, self.renderer.as_mut(), surface)
    }

    /// Host completion signal for a deferred drawable resize.
    pub fn on_surface_resized(&mut self, request_id: u64) -> bool {
        self.resize
            .on_surface_resized(request_id, self.renderer.as_mut())
    }

    /// Handle every queued renderer status in arrival order. Returns the
    /// statuses so the host can mirror them to its own observers.
    pub fn dispatch_statuses(&mut self) -> Vec<RendererStatus> {
        let statuses = self.dispatcher.drain();
        for status in &statuses {
            self.handle_status(*status);
        }
        statuses
    }

    fn handle_status(&mut self, status: RendererStatus) {
        match status {
            RendererStatus::Created => {
                if self.lifecycle != Lifecycle::Live {
                    log::debug!("created status without a live renderer, ignored");
                    return;
                }
                log::info!("renderer reported canvas created");
                self.ready = true;
                self.try_start();
            }
            RendererStatus::ResizeAcknowledged => {
                if let AckOutcome::Completed(request) = self.resize.ack_received() {
                    log::debug!("renderer now at {}", request.device);
                }
            }
            RendererStatus::Reserved => {
                log::debug!("renderer status 1 received");
            }
            RendererStatus::Unrecognized(code) => {
                log::warn!("unrecognized renderer status code {code}");
            }
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn is_live(&self) -> bool {
        self.lifecycle == Lifecycle::Live
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == Lifecycle::Destroyed
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn renderer(&self) -> Option<&B::Renderer> {
        self.renderer.as_ref()
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn pump(&self) -> &FramePump<S> {
        &self.pump
    }

    pub fn resize(&self) -> &ResizeCoordinator<T> {
        &self.resize
    }

    pub fn timer_mut(&mut self) -> &mut T {
        self.resize.timer_mut()
    }

    pub fn refresh_source_mut(&mut self) -> &mut S {
        self.pump.source_mut()
    }
}

impl<B, S, T> Drop for CanvasHost<B, S, T>
where
    B: PlatformBridge,
    S: RefreshSource,
    T: DebounceTimer,
{
    fn drop(&mut self) {
        self.destroy_renderer();
    }
}
