//! Callback dispatcher: the only cross-thread boundary in the bridge.
//!
//! The renderer may report status from any thread. Codes are queued in
//! arrival order through a channel and drained later on the host's UI
//! execution context, so no host-visible state is ever touched off that
//! context. The optional wake hook lets the host schedule a drain (e.g.
//! `DispatchQueue.main.async` or a zero-delay timeout).

use crate::status::RendererStatus;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;

/// Asks the host to schedule a drain on its UI context. Must be thread-safe.
pub type WakeFn = Arc<dyn Fn() + Send + Sync>;

/// Renderer-side handle. Cheap to clone, safe to call from any thread.
#[derive(Clone)]
pub struct StatusSender {
    tx: Sender<RendererStatus>,
    wake: Option<WakeFn>,
}

impl StatusSender {
    /// Queue a raw status code. Never blocks; after teardown the code is
    /// dropped and `false` is returned.
    pub fn post(&self, code: i32) -> bool {
        let status = RendererStatus::from_code(code);
        if self.tx.send(status).is_err() {
            log::debug!("renderer status {code} after teardown, dropped");
            return false;
        }
        if let Some(wake) = &self.wake {
            wake();
        }
        true
    }
}

impl std::fmt::Debug for StatusSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSender")
            .field("wake", &self.wake.is_some())
            .finish()
    }
}

/// UI-side end of the status queue.
pub struct CallbackDispatcher {
    tx: Sender<RendererStatus>,
    rx: Receiver<RendererStatus>,
    wake: Option<WakeFn>,
}

impl CallbackDispatcher {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx, wake: None }
    }

    pub fn with_wake(wake: WakeFn) -> Self {
        Self {
            wake: Some(wake),
            ..Self::new()
        }
    }

    pub fn sender(&self) -> StatusSender {
        StatusSender {
            tx: self.tx.clone(),
            wake: self.wake.clone(),
        }
    }

    /// Take every queued status in arrival order. Call on the UI context only.
    pub fn drain(&self) -> Vec<RendererStatus> {
        self.rx.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for CallbackDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
