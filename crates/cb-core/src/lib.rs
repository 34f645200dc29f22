//! Canvas Bridge core: drives an externally owned GPU renderer embedded in a
//! UI host.
//!
//! Platform crates implement [`PlatformBridge`], [`RefreshSource`],
//! [`DebounceTimer`] and [`SurfaceHost`] and feed host notifications into a
//! [`CanvasHost`].

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod host;
pub mod pump;
pub mod resize;
pub mod status;

pub use bridge::{PlatformBridge, Renderer, RendererConfig};
pub use config::BridgeConfig;
pub use dispatch::{CallbackDispatcher, StatusSender, WakeFn};
pub use error::BridgeError;
pub use geometry::{CanvasGeometry, DeviceSize};
pub use host::CanvasHost;
pub use pump::{FramePump, PumpState, RefreshSource, TickOutcome};
pub use resize::{
    AckOutcome, DebounceTimer, DropReason, ResizeCoordinator, ResizeRequest, ResizeState,
    SurfaceHost, SurfaceUpdate, TimerId, TimerOutcome,
};
pub use status::RendererStatus;
