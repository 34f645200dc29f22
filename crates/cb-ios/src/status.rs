//! Status callback routing for the renderer library.
//!
//! The renderer receives a registry id as `status_context`, never a pointer
//! into the canvas. The id is unregistered when the renderer is released, so
//! a callback arriving afterwards, on any thread, finds nothing and is
//! dropped.

use cb_core::StatusSender;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};

static SENDERS: Mutex<BTreeMap<usize, StatusSender>> = Mutex::new(BTreeMap::new());

/// Zero is never handed out, so a null context is always unknown.
static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Registration of one renderer's status sender. Unregisters on drop.
#[derive(Debug)]
pub struct StatusSlot {
    id: usize,
}

impl StatusSlot {
    pub fn register(sender: StatusSender) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        SENDERS.lock().insert(id, sender);
        Self { id }
    }

    /// Opaque `status_context` for the renderer.
    pub fn context(&self) -> *mut c_void {
        self.id as *mut c_void
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for StatusSlot {
    fn drop(&mut self) {
        // Waits for a post in flight on another thread; none start afterwards.
        SENDERS.lock().remove(&self.id);
    }
}

pub fn is_registered(id: usize) -> bool {
    SENDERS.lock().contains_key(&id)
}

/// `status_callback` handed to the renderer.
pub unsafe extern "C" fn post_status(context: *mut c_void, code: i32) {
    let id = context as usize;
    let senders = SENDERS.lock();
    match senders.get(&id) {
        Some(sender) => {
            sender.post(code);
        }
        None => log::debug!("status {code} for released renderer {id}, dropped"),
    }
}
