//! Periodic ticker.

use std::sync::{Arc, Mutex};

use weft_rt_sched::spawn;
use weft_rt_sync::{Chan, Select};

use crate::clock::{now, sleep};

/// A periodic timestamp source.
///
/// Delivers `now()` on channel `c` every `dt` seconds. Delivery is
/// non-blocking: when the receiver lags, ticks are dropped rather than
/// queued (the channel holds at most one pending tick).
pub struct Ticker {
    /// Delivery channel, capacity 1.
    pub c: Chan<f64>,
    inner: Arc<TickerInner>,
}

struct TickerInner {
    c: Chan<f64>,
    dt: f64,
    stopped: Mutex<bool>,
}

/// Creates a ticker firing every `dt` seconds.
///
/// # Panics
///
/// Panics if `dt <= 0`.
pub fn new_ticker(dt: f64) -> Ticker {
    if dt <= 0.0 {
        panic!("ticker: dt <= 0");
    }
    let c = Chan::new(1);
    let inner = Arc::new(TickerInner {
        c: c.clone(),
        dt,
        stopped: Mutex::new(false),
    });
    let t = Arc::clone(&inner);
    spawn(move || t.tick_loop());
    Ticker { c, inner }
}

/// Returns a channel delivering timestamps every `dt` seconds.
///
/// For `dt <= 0` the nil channel is returned, so receiving from it
/// blocks forever. There is no way to stop the underlying ticker; use
/// [`new_ticker`] when the ticker must be stoppable.
pub fn tick(dt: f64) -> Chan<f64> {
    if dt <= 0.0 {
        return Chan::nil();
    }
    new_ticker(dt).c
}

impl Ticker {
    /// Stops the ticker and drains its channel.
    ///
    /// On return the channel is empty and no further tick will ever be
    /// delivered: ticks are sent under the same mutex, so a send cannot
    /// be in flight once the stop flag is observed.
    pub fn stop(&self) {
        let mut stopped = self.inner.stopped.lock().unwrap();
        *stopped = true;
        while self.c.len() > 0 {
            self.c.recv_ok();
        }
    }
}

impl TickerInner {
    fn tick_loop(&self) {
        loop {
            sleep(self.dt);
            let stopped = self.stopped.lock().unwrap();
            if *stopped {
                return;
            }
            // Non-blocking send: a slow receiver drops ticks instead of
            // accumulating them.
            Select::new().send(&self.c, now()).default().wait();
            drop(stopped);
        }
    }
}
