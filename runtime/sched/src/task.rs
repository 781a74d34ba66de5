//! Task launching.
//!
//! A task is a detached OS thread: there is no join handle and no result.
//! A panic inside a task unwinds that thread and is reported through the
//! process's normal panic hook.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crate::config;

/// Unique identifier for tasks.
pub type TaskId = u64;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Generates a new unique task ID.
pub fn next_task_id() -> TaskId {
    NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
}

/// Launches `f` as an independent task.
///
/// The task runs concurrently with its spawner and with all other tasks.
/// There is no handle and no join: tasks that need to report completion do
/// so over a channel.
///
/// # Panics
///
/// Panics if the host refuses to create a thread (resource exhaustion).
///
/// # Example
///
/// ```
/// weft_rt_sched::spawn(|| {
///     // runs concurrently with the spawner
/// });
/// ```
pub fn spawn<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    let cfg = config::current();
    let mut builder = thread::Builder::new().name(format!("{}-{}", cfg.name_prefix, next_task_id()));
    if let Some(size) = cfg.stack_size {
        builder = builder.stack_size(size);
    }
    if let Err(err) = builder.spawn(f) {
        panic!("spawn: failed to launch task: {err}");
    }
}

/// Yields execution to other tasks.
pub fn yield_now() {
    thread::yield_now();
}
