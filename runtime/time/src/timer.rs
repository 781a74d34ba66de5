//! One-shot timer.

use std::sync::{Arc, Mutex};

use weft_rt_sched::spawn;
use weft_rt_sync::Chan;

use crate::clock::{now, sleep};

type TimerFunc = Box<dyn Fn() + Send + Sync + 'static>;

/// A one-shot timer.
///
/// An armed timer either delivers `now()` on its channel `c` when it
/// fires, or, when constructed via [`after_func`], runs a callback in a
/// fresh task instead (in that case `c` is the nil channel).
///
/// Each arming spawns a fire task bound to the current version; stop and
/// reset bump the version so stale fire tasks exit without effect.
pub struct Timer {
    /// Delivery channel: capacity 1 for value timers, nil for callback
    /// timers.
    pub c: Chan<f64>,
    inner: Arc<TimerInner>,
}

struct TimerInner {
    c: Chan<f64>,
    f: Option<TimerFunc>,
    st: Mutex<TimerState>,
}

struct TimerState {
    /// Seconds until the pending firing; INFINITY when disarmed.
    dt: f64,
    ver: u64,
}

/// Creates a timer that will deliver `now()` on its channel `dt` seconds
/// from now.
pub fn new_timer(dt: f64) -> Timer {
    make_timer(dt, None)
}

/// Returns a channel that receives the timestamp once, `dt` seconds from
/// now.
///
/// # Examples
///
/// ```no_run
/// use weft_rt_time::{after, SECOND};
///
/// let c = after(1.0 * SECOND);
/// let t = c.recv(); // blocks ~1s
/// ```
pub fn after(dt: f64) -> Chan<f64> {
    new_timer(dt).c
}

/// Creates a timer that will run `f` in a new task `dt` seconds from now.
///
/// The returned handle supports [`stop`](Timer::stop) and
/// [`reset`](Timer::reset); its channel is the nil channel. Stop does not
/// wait for a running `f` to finish; callers needing that must
/// synchronize externally.
pub fn after_func<F>(dt: f64, f: F) -> Timer
where
    F: Fn() + Send + Sync + 'static,
{
    make_timer(dt, Some(Box::new(f)))
}

fn make_timer(dt: f64, f: Option<TimerFunc>) -> Timer {
    let c = if f.is_none() { Chan::new(1) } else { Chan::nil() };
    let t = Timer {
        c: c.clone(),
        inner: Arc::new(TimerInner {
            c,
            f,
            st: Mutex::new(TimerState {
                dt: f64::INFINITY,
                ver: 0,
            }),
        }),
    };
    t.reset(dt);
    t
}

impl Timer {
    /// Disarms the timer. Returns true if it was armed.
    ///
    /// On return the channel is guaranteed empty: a queued firing is
    /// drained, and no in-flight send can exist because firings send
    /// while holding the timer mutex.
    pub fn stop(&self) -> bool {
        let mut st = self.inner.st.lock().unwrap();
        let canceled = if st.dt == f64::INFINITY {
            false
        } else {
            st.dt = f64::INFINITY;
            st.ver += 1;
            true
        };
        // drain what a firing could have queued already
        while self.c.len() > 0 {
            self.c.recv_ok();
        }
        drop(st);
        canceled
    }

    /// Re-arms the timer to fire `dt` seconds from now.
    ///
    /// # Panics
    ///
    /// Panics if the timer is currently armed; it must be stopped or have
    /// expired first.
    pub fn reset(&self, dt: f64) {
        let mut st = self.inner.st.lock().unwrap();
        if st.dt != f64::INFINITY {
            drop(st);
            panic!("Timer.reset: the timer is armed; must be stopped or expired");
        }
        st.dt = dt;
        st.ver += 1;
        let ver = st.ver;
        let inner = Arc::clone(&self.inner);
        spawn(move || inner.fire(dt, ver));
    }
}

impl TimerInner {
    fn fire(&self, dt: f64, ver: u64) {
        sleep(dt);
        let mut st = self.st.lock().unwrap();
        if st.ver != ver {
            return; // stopped or re-armed while sleeping
        }
        st.dt = f64::INFINITY;
        match &self.f {
            None => {
                // Capacity-1 channel, empty by the stop/reset contract:
                // this cannot block. Sending under the timer mutex lets
                // stop() know that once it observes the disarmed state,
                // no send is in flight.
                self.c.send(now());
            }
            Some(f) => {
                // Run the callback outside the mutex so it may reset the
                // timer without deadlock.
                drop(st);
                f();
            }
        }
    }
}
