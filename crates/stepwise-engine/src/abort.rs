//! Cooperative abort flag for the in-flight track.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag requesting that the current track be aborted.
///
/// The driver checks the flag only at the end of each completed step,
/// never mid-apply. A set flag turns the track into
/// `KillTrackAndSecondaries` at that checkpoint. The flag is cleared
/// when the track finishes, so a request never leaks into the next track.
///
/// Clones share the same flag and may be moved to other threads.
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    /// A fresh, unset handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an abort of the current (or next) track.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether an abort is pending.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Clear the flag.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}
