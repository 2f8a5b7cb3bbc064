//! Nullable capture device: counts start/release without a camera.

use facegate_types::{CaptureDevice, CaptureError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Counters {
    starts: AtomicUsize,
    releases: AtomicUsize,
    active: AtomicBool,
    deny: AtomicBool,
}

/// A capture device that records calls.
///
/// Clones share counters, so a test can keep one clone while the session
/// owns another.
#[derive(Clone, Default)]
pub struct NullCaptureDevice {
    counters: Arc<Counters>,
}

impl NullCaptureDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `start` fail with a permission error.
    pub fn deny_access(&self) {
        self.counters.deny.store(true, Ordering::SeqCst);
    }

    pub fn starts(&self) -> usize {
        self.counters.starts.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    /// Whether the device is currently started.
    pub fn is_active(&self) -> bool {
        self.counters.active.load(Ordering::SeqCst)
    }
}

impl CaptureDevice for NullCaptureDevice {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.counters.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::PermissionDenied);
        }
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        self.counters.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) {
        if self.counters.active.swap(false, Ordering::SeqCst) {
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}
