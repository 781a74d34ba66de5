//! Binary semaphore.
//!
//! Unlike a mutex, a semaphore may be released from a different task than
//! the one that will acquire it. This is the primitive every blocking
//! channel operation parks on: the parked task acquires, the peer that
//! completed the operation releases.

use std::sync::{Condvar, Mutex};

/// A binary semaphore, initially unacquired.
///
/// `acquire` blocks until some task calls `release`; `release` may come
/// from any task. The semaphore holds at most one permit.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weft_rt_sched::Sema;
///
/// let sema = Arc::new(Sema::new());
/// let s = sema.clone();
/// std::thread::spawn(move || {
///     s.release();
/// });
/// sema.acquire(); // returns once the spawned thread releases
/// ```
pub struct Sema {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl Sema {
    /// Creates a new semaphore with no permit.
    pub fn new() -> Self {
        Self {
            signaled: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Blocks until a permit is available, then takes it.
    pub fn acquire(&self) {
        let mut signaled = self.signaled.lock().unwrap();
        while !*signaled {
            signaled = self.cond.wait(signaled).unwrap();
        }
        *signaled = false;
    }

    /// Makes a permit available, waking one blocked acquirer.
    ///
    /// # Panics
    ///
    /// Panics if a permit is already available: a double release indicates
    /// a bug in the waiter protocol.
    pub fn release(&self) {
        let mut signaled = self.signaled.lock().unwrap();
        if *signaled {
            panic!("sema: release of released semaphore");
        }
        *signaled = true;
        self.cond.notify_one();
    }
}

impl Default for Sema {
    fn default() -> Self {
        Self::new()
    }
}
