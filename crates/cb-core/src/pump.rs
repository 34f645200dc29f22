//! Frame pump: forwards host refresh ticks to the renderer.
//!
//! The pump starts `Paused` and only changes state through host lifecycle
//! transitions (`start` on view appear, `pause` on view disappear). The
//! host's refresh source is abstracted as [`RefreshSource`] so the pump
//! logic is independent of display links or animation-frame loops.

use crate::bridge::Renderer;
use std::num::NonZeroU32;
use std::time::Duration;

/// Jitter tolerated between refresh ticks before a tick counts as early.
const FRAME_SLACK: Duration = Duration::from_millis(1);

/// Host-provided refresh tick capability.
pub trait RefreshSource {
    /// Begin delivering ticks.
    fn resume(&mut self);
    /// Stop delivering ticks.
    fn suspend(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PumpState {
    Running,
    #[default]
    Paused,
}

/// What happened to a single refresh tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Exactly one frame advance reached the renderer.
    Advanced,
    Paused,
    /// No live renderer handle.
    NoRenderer,
    /// Tick arrived sooner than the frame-rate cap allows.
    Throttled,
}

pub struct FramePump<S> {
    source: S,
    state: PumpState,
    frame_interval: Duration,
    last_frame: Option<Duration>,
    frames_delivered: u64,
}

impl<S: RefreshSource> FramePump<S> {
    pub fn new(source: S, maximum_frame_rate: NonZeroU32) -> Self {
        Self {
            source,
            state: PumpState::Paused,
            frame_interval: Duration::from_secs(1) / maximum_frame_rate.get(),
            last_frame: None,
            frames_delivered: 0,
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PumpState::Running
    }

    /// Total frame advances forwarded since creation.
    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// `Paused → Running`. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.state == PumpState::Running {
            return false;
        }
        self.state = PumpState::Running;
        self.last_frame = None;
        self.source.resume();
        log::info!("frame pump running");
        true
    }

    /// `Running → Paused`. Returns `false` if already paused.
    pub fn pause(&mut self) -> bool {
        if self.state == PumpState::Paused {
            return false;
        }
        self.state = PumpState::Paused;
        self.source.suspend();
        log::info!(
            "frame pump paused after {} frames",
            self.frames_delivered
        );
        true
    }

    /// Called by the host once per refresh interval, serialized on the UI
    /// context. `now` is the host's monotonic time.
    pub fn on_host_refresh_tick<R: Renderer + ?Sized>(
        &mut self,
        now: Duration,
        renderer: Option<&mut R>,
    ) -> TickOutcome {
        if self.state == PumpState::Paused {
            return TickOutcome::Paused;
        }
        let Some(renderer) = renderer else {
            return TickOutcome::NoRenderer;
        };
        if let Some(last) = self.last_frame {
            let min_gap = self.frame_interval.saturating_sub(FRAME_SLACK);
            if now.saturating_sub(last) < min_gap {
                log::trace!("tick throttled at {:?}", now);
                return TickOutcome::Throttled;
            }
        }
        self.last_frame = Some(now);
        self.frames_delivered += 1;
        renderer.advance_frame();
        TickOutcome::Advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DeviceSize;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct CountingSource {
        resumed: usize,
        suspended: usize,
    }

    impl RefreshSource for CountingSource {
        fn resume(&mut self) {
            self.resumed += 1;
        }
        fn suspend(&mut self) {
            self.suspended += 1;
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
    }

    impl Renderer for CountingRenderer {
        fn advance_frame(&mut self) {
            self.frames += 1;
        }
        fn notify_resized(&mut self, _size: DeviceSize) {}
    }

    fn pump(fps: u32) -> FramePump<CountingSource> {
        FramePump::new(CountingSource::default(), NonZeroU32::new(fps).unwrap())
    }

    fn tick_at(ms: f64) -> Duration {
        Duration::from_secs_f64(ms / 1000.0)
    }

    #[test]
    fn starts_paused_and_ignores_ticks() {
        let mut pump = pump(60);
        let mut renderer = CountingRenderer::default();
        assert_eq!(pump.state(), PumpState::Paused);
        assert_eq!(
            pump.on_host_refresh_tick(tick_at(0.0), Some(&mut renderer)),
            TickOutcome::Paused
        );
        assert_eq!(renderer.frames, 0);
    }

    #[test]
    fn no_renderer_is_a_no_op() {
        let mut pump = pump(60);
        pump.start();
        assert_eq!(
            pump.on_host_refresh_tick::<CountingRenderer>(tick_at(0.0), None),
            TickOutcome::NoRenderer
        );
        assert_eq!(pump.frames_delivered(), 0);
    }

    #[test]
    fn start_and_pause_drive_the_source() {
        let mut pump = pump(60);
        assert!(pump.start());
        assert!(!pump.start());
        assert!(pump.pause());
        assert!(!pump.pause());
        assert_eq!(pump.source().resumed, 1);
        assert_eq!(pump.source().suspended, 1);
    }

    #[test]
    fn high_refresh_display_is_capped() {
        let mut pump = pump(60);
        let mut renderer = CountingRenderer::default();
        pump.start();
        // 120 Hz display, 60 fps cap: every other tick advances.
        let outcomes: Vec<TickOutcome> = (0..6)
            .map(|i| pump.on_host_refresh_tick(tick_at(i as f64 * 8.333), Some(&mut renderer)))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Advanced,
                TickOutcome::Throttled,
                TickOutcome::Advanced,
                TickOutcome::Throttled,
                TickOutcome::Advanced,
                TickOutcome::Throttled,
            ]
        );
        assert_eq!(renderer.frames, 3);
    }

    #[test]
    fn resume_does_not_throttle_first_tick() {
        let mut pump = pump(60);
        let mut renderer = CountingRenderer::default();
        pump.start();
        pump.on_host_refresh_tick(tick_at(0.0), Some(&mut renderer));
        pump.pause();
        pump.start();
        assert_eq!(
            pump.on_host_refresh_tick(tick_at(2.0), Some(&mut renderer)),
            TickOutcome::Advanced
        );
    }
}
