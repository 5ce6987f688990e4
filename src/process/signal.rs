//! One-Shot Signal
//!
//! Single-writer, single-waiter notification used for a child's load
//! outcome and exit status. The value is recorded under the lock before any
//! waiter can observe the slot, so a waiter arriving after the signal sees
//! the satisfied condition immediately; there is no missed-wakeup window.
//!
//! Waiting spins between polls. The external scheduler preempts the
//! spinner, so this is a blocking wait from the process's point of view.

use spin::Mutex;

/// A value that is set exactly once and then readable forever.
pub struct OneShot<T: Copy> {
    slot: Mutex<Option<T>>,
}

impl<T: Copy> OneShot<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Record the value and wake any waiter.
    ///
    /// Signaling twice is a protocol violation; the second value is
    /// dropped so the waiter's observation stays stable.
    pub fn signal(&self, value: T) {
        let mut slot = self.slot.lock();
        debug_assert!(slot.is_none(), "one-shot signaled twice");
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// The value, if already signaled. Never blocks.
    pub fn poll(&self) -> Option<T> {
        *self.slot.lock()
    }

    /// Block until the value is available.
    pub fn wait(&self) -> T {
        loop {
            if let Some(v) = self.poll() {
                return v;
            }
            core::hint::spin_loop();
        }
    }
}

impl<T: Copy> Default for OneShot<T> {
    fn default() -> Self {
        Self::new()
    }
}
