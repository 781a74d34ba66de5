//! Weft host-scheduler adapter.
//!
//! The Weft runtime does not schedule anything itself: it relies on a host
//! that can run a function concurrently and provide a binary semaphore whose
//! release may come from a different task than the one blocked in acquire.
//! This crate is that host adapter for ordinary Rust processes, mapping
//! tasks onto detached OS threads.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! let counter = Arc::new(AtomicU32::new(0));
//! let c = counter.clone();
//! weft_rt_sched::spawn(move || {
//!     c.fetch_add(1, Ordering::SeqCst);
//! });
//! while counter.load(Ordering::SeqCst) == 0 {
//!     std::thread::yield_now();
//! }
//! ```

mod config;
mod sema;
mod task;

pub use config::{configure, SchedConfig};
pub use sema::Sema;
pub use task::{next_task_id, spawn, yield_now, TaskId};
