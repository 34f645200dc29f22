//! The iOS canvas: a `CanvasHost` wired to display link, host timers and
//! the drawable callbacks.

use crate::bridge::{IosBridge, IosView};
use crate::ffi::{HostCallbacks, RendererVTable};
use crate::surface::HostSurface;
use cb_core::{
    BridgeConfig, BridgeError, CanvasGeometry, CanvasHost, DebounceTimer, DeviceSize,
    RefreshSource, RendererStatus, SurfaceHost, TickOutcome, TimerId, TimerOutcome, WakeFn,
};
use std::ffi::c_void;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// `CADisplayLink` pause switch.
pub struct DisplayLink {
    callbacks: HostCallbacks,
}

impl RefreshSource for DisplayLink {
    fn resume(&mut self) {
        self.callbacks.pause_display_link(false);
    }

    fn suspend(&mut self) {
        self.callbacks.pause_display_link(true);
    }
}

/// Main-thread one-shot timers owned by the view controller.
pub struct HostTimer {
    callbacks: HostCallbacks,
}

impl DebounceTimer for HostTimer {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.callbacks.schedule(id, millis);
    }

    fn cancel(&mut self, id: TimerId) {
        self.callbacks.cancel(id);
    }
}

pub type IosHost = CanvasHost<IosBridge, DisplayLink, HostTimer>;

pub struct IosCanvas {
    host: IosHost,
    surface: HostSurface,
    callbacks: HostCallbacks,
    epoch: Instant,
}

impl IosCanvas {
    /// Build the host and create the renderer. `maximum_frames` is the
    /// screen's refresh limit and lowers the configured frame cap.
    pub fn create(
        view: IosView,
        maximum_frames: i32,
        scratch_directory: PathBuf,
        vtable: RendererVTable,
        callbacks: HostCallbacks,
        config: &BridgeConfig,
    ) -> Result<Self, BridgeError> {
        let mut config = config.clone();
        if let Ok(screen) = u32::try_from(maximum_frames) {
            if screen > 0 {
                config.maximum_frame_rate = config.maximum_frame_rate.min(screen);
            }
        }

        let bridge = IosBridge::new(vtable, callbacks.context)?;
        let mut host = CanvasHost::with_wake(
            bridge,
            DisplayLink { callbacks },
            HostTimer { callbacks },
            &config,
            wake_main(&callbacks),
        )?;
        host.create_renderer(view, scratch_directory)?;
        Ok(Self {
            host,
            surface: HostSurface::new(callbacks),
            callbacks,
            epoch: Instant::now(),
        })
    }

    pub fn enter_frame(&mut self, timestamp: f64) -> TickOutcome {
        let now = Duration::try_from_secs_f64(timestamp).unwrap_or(Duration::ZERO);
        self.host.on_refresh_tick(now)
    }

    pub fn view_did_appear(&mut self) {
        self.host.view_did_appear();
    }

    pub fn view_will_disappear(&mut self) {
        self.host.view_will_disappear();
    }

    pub fn set_drawable_size(&mut self, width: u32, height: u32) {
        self.host.seed_applied_size(DeviceSize::new(width, height));
    }

    /// Bounds changed, in points. The scale is sampled again when the
    /// debounce window closes.
    pub fn size_changed(&mut self, width: f64, height: f64) {
        let geometry = CanvasGeometry::new(width, height, self.surface.device_pixel_ratio());
        self.host.raw_size_changed(geometry, self.epoch.elapsed());
    }

    pub fn timer_fired(&mut self, id: TimerId) -> TimerOutcome {
        let outcome = self.host.on_timer_elapsed(id, &mut self.surface);
        log::debug!("resize timer {id}: {outcome:?}");
        outcome
    }

    pub fn surface_resized(&mut self, request_id: u64) -> bool {
        self.host.on_surface_resized(request_id)
    }

    pub fn dispatch_statuses(&mut self) -> Vec<RendererStatus> {
        let statuses = self.host.dispatch_statuses();
        for status in &statuses {
            self.callbacks.notify_status(status.code());
        }
        statuses
    }

    pub fn destroy(&mut self) {
        self.host.destroy_renderer();
    }

    pub fn host(&self) -> &IosHost {
        &self.host
    }
}

fn wake_main(callbacks: &HostCallbacks) -> WakeFn {
    // Raw pointers are not `Send`; the address is only handed back to the host.
    let context = callbacks.context as usize;
    let wake = callbacks.wake_main;
    Arc::new(move || {
        if let Some(f) = wake {
            // SAFETY: the host keeps `context` valid until `cb_canvas_destroy`.
            unsafe { f(context as *mut c_void) }
        }
    })
}
