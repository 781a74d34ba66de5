//! Weft channels - typed communication between tasks.
//!
//! This crate is the concurrency engine of the Weft runtime: channel
//! objects with synchronous or buffered semantics, the waiter
//! coordination protocol behind every blocking operation, and select for
//! multi-way rendezvous.
//!
//! # Quick Start
//!
//! ```
//! use std::thread;
//! use weft_rt_sync::chan;
//!
//! let ch = chan::<i32>();
//! let tx = ch.clone();
//! thread::spawn(move || tx.send(42));
//! assert_eq!(ch.recv(), 42);
//! ```
//!
//! # Channel flavors
//!
//! - **Synchronous** (capacity 0): send and receive complete only in
//!   matched pairs.
//! - **Buffered** (capacity N): up to N values are held FIFO; senders
//!   block only when the buffer is full.
//! - **Nil**: a distinguished handle on which send and receive block
//!   forever and close panics. Useful for disabling select cases.
//!
//! # Select
//!
//! ```
//! use weft_rt_sync::{Chan, Select};
//!
//! let a: Chan<i32> = Chan::new(1);
//! let b: Chan<i32> = Chan::new(1);
//! a.send(7);
//!
//! let result = Select::new().recv(&a).recv(&b).wait();
//! assert_eq!(result.index, 0);
//! ```

#![warn(missing_docs)]

pub mod channel;
pub mod error;
pub mod select;
mod waiter;

pub use channel::Chan;
pub use error::{TryRecvError, TrySendError};
pub use select::{Select, SelectResult};

/// Creates a synchronous channel (capacity 0).
///
/// # Examples
///
/// ```
/// use weft_rt_sync::chan;
///
/// let ch = chan::<i32>();
/// assert_eq!(ch.cap(), 0);
/// ```
pub fn chan<T>() -> Chan<T> {
    Chan::new(0)
}

/// Creates a buffered channel with the given capacity.
///
/// # Examples
///
/// ```
/// use weft_rt_sync::buffered_chan;
///
/// let ch = buffered_chan::<i32>(10);
/// ch.send(1);
/// assert_eq!(ch.len(), 1);
/// ```
pub fn buffered_chan<T>(capacity: usize) -> Chan<T> {
    Chan::new(capacity)
}
