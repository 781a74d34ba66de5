//! Weft Runtime - Go-style concurrency for Rust hosts.
//!
//! Weft reproduces the "communicating sequential processes" toolkit:
//! lightweight tasks, typed channels with synchronous or buffered
//! semantics, multi-way select, and channel-backed timers. It is meant to
//! be embedded in a host process so application code can express
//! concurrent control flow Go-style.
//!
//! # Architecture
//!
//! The runtime is split into three crates, re-exported here:
//!
//! - **sched**: host-scheduler adapter: task spawning and the binary
//!   semaphore every blocking operation parks on
//! - **sync**: channels, the waiter coordination protocol, select
//! - **time**: monotonic clock, one-shot timer, periodic ticker
//!
//! # Usage
//!
//! ```
//! use weft_rt::{chan, spawn};
//!
//! let requests = chan::<i32>();
//! let replies = chan::<i32>();
//!
//! let (rx, tx) = (requests.clone(), replies.clone());
//! spawn(move || {
//!     let n = rx.recv();
//!     tx.send(n * 10);
//! });
//!
//! requests.send(4);
//! assert_eq!(replies.recv(), 40);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Re-export runtime components
pub use weft_rt_sched as sched;
pub use weft_rt_sync as sync;
pub use weft_rt_time as time;

mod panic;

pub use panic::{catch_panic, panic, PanicInfo, PanicResult};
pub use weft_rt_sched::{configure, spawn, yield_now, SchedConfig, TaskId};
pub use weft_rt_sync::{buffered_chan, chan, Chan, Select, SelectResult, TryRecvError, TrySendError};
pub use weft_rt_time::{
    after, after_func, new_ticker, new_timer, now, sleep, tick, Ticker, Timer, HOUR, MICROSECOND,
    MILLISECOND, MINUTE, NANOSECOND, SECOND,
};
