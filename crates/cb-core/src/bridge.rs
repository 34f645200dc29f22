//! Platform bridge: the seam between a UI host and the external renderer.
//!
//! Each host platform provides one [`PlatformBridge`] implementation that
//! resolves its native view objects into something the renderer can draw
//! into, and owns creation and destruction of the renderer instance.

use crate::dispatch::StatusSender;
use crate::error::BridgeError;
use crate::geometry::DeviceSize;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// A live renderer instance, opaque to the bridge.
///
/// Both calls happen on the host's UI execution context.
pub trait Renderer {
    /// One synchronous per-frame update.
    fn advance_frame(&mut self);

    /// The host drawable now has `size` device pixels. The renderer reports
    /// completion through the status callback.
    fn notify_resized(&mut self, size: DeviceSize);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn advance_frame(&mut self) {
        (**self).advance_frame();
    }

    fn notify_resized(&mut self, size: DeviceSize) {
        (**self).notify_resized(size);
    }
}

/// Everything the renderer needs to create its canvas.
pub struct RendererConfig<V> {
    /// Host view/surface objects, platform specific.
    pub view: V,
    pub maximum_frame_rate: NonZeroU32,
    /// Writable directory handed to the renderer, opaque to the bridge.
    pub scratch_directory: PathBuf,
    /// Thread-safe sink for the renderer's status codes.
    pub status: StatusSender,
}

pub trait PlatformBridge {
    /// Unresolved host view objects.
    type View;
    type Renderer: Renderer;

    /// Resolve the host view and create the renderer.
    ///
    /// Fails with [`BridgeError::InvalidHostSurface`] when the view cannot be
    /// resolved to a drawable surface; no renderer is allocated in that case.
    fn create_renderer(
        &mut self,
        config: RendererConfig<Self::View>,
    ) -> Result<Self::Renderer, BridgeError>;

    /// Release the renderer. Called before the host releases its view.
    fn destroy_renderer(&mut self, renderer: Self::Renderer);
}
