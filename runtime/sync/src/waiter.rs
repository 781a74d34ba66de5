//! Waiter coordination protocol.
//!
//! Every blocking act (a lone send, a lone receive, or a whole select) is
//! arbitrated by one [`WaitGroup`]. Each potential operation registers a
//! [`Waiter`] in the channel's queue; the first peer to claim a waiter via
//! `try_win` becomes responsible for filling its result slot and releasing
//! the group's semaphore.
//!
//! The claim is decoupled from the wakeup on purpose: claiming happens
//! while the peer holds the channel mutex (so the choice commits
//! atomically with the dequeue), while the value transfer and the
//! semaphore release happen after the channel mutex is dropped. That
//! preserves the lock order channel.mu > group.mu everywhere.

use std::sync::{Arc, Mutex, MutexGuard};

use weft_rt_sched::Sema;

/// Token stored in a group's winner slot when a select case completed on
/// the retry path, so that already-queued sibling cases can no longer win.
pub(crate) const WINNER_SENTINEL: usize = usize::MAX;

/// Arbitration object for a single blocking act.
pub(crate) struct WaitGroup {
    sema: Sema,
    winner: Mutex<Option<usize>>,
}

impl WaitGroup {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            sema: Sema::new(),
            winner: Mutex::new(None),
        })
    }

    /// Atomically claims victory for the waiter with `token`.
    ///
    /// Monotonic: once a winner is set it never changes. Returns whether
    /// the claim succeeded.
    pub(crate) fn try_win(&self, token: usize) -> bool {
        let mut winner = self.winner.lock().unwrap();
        if winner.is_none() {
            *winner = Some(token);
            true
        } else {
            false
        }
    }

    /// Locks the winner slot. Select holds this guard across its
    /// subscribe-time retry so that a retry success and the sentinel write
    /// commit as one step.
    pub(crate) fn winner(&self) -> MutexGuard<'_, Option<usize>> {
        self.winner.lock().unwrap()
    }

    /// Parks the owning task until some peer calls `wakeup`.
    pub(crate) fn wait(&self) {
        self.sema.acquire();
    }

    /// Releases the owning task. Precondition: the winner is set; called
    /// exactly once per group.
    pub(crate) fn wakeup(&self) {
        self.sema.release();
    }
}

/// Result slot of a parked operation.
enum Slot<T> {
    /// A parked sender: holds the value until a receiver takes it; `ok`
    /// records whether the value was accepted (false when the channel was
    /// closed under the sender).
    Send { value: Option<T>, ok: bool },
    /// A parked receiver: filled by the matching sender or by close.
    Recv { value: Option<T>, ok: bool },
}

/// One task parked on one potential channel operation.
pub(crate) struct Waiter<T> {
    pub(crate) group: Arc<WaitGroup>,
    /// Identifies this waiter within its group; select uses the case
    /// position, single operations use 0.
    pub(crate) token: usize,
    slot: Mutex<Slot<T>>,
}

impl<T> Waiter<T> {
    pub(crate) fn new_send(group: Arc<WaitGroup>, token: usize, value: T) -> Arc<Self> {
        Arc::new(Self {
            group,
            token,
            slot: Mutex::new(Slot::Send {
                value: Some(value),
                ok: false,
            }),
        })
    }

    pub(crate) fn new_recv(group: Arc<WaitGroup>, token: usize) -> Arc<Self> {
        Arc::new(Self {
            group,
            token,
            slot: Mutex::new(Slot::Recv {
                value: None,
                ok: false,
            }),
        })
    }

    /// Takes the pending value out of a claimed sender.
    pub(crate) fn take_send_value(&self) -> T {
        match &mut *self.slot.lock().unwrap() {
            Slot::Send { value, .. } => match value.take() {
                Some(v) => v,
                None => unreachable!("send waiter claimed twice"),
            },
            Slot::Recv { .. } => unreachable!("send waiter expected"),
        }
    }

    /// Records whether a claimed sender's value was accepted.
    pub(crate) fn set_send_ok(&self, accepted: bool) {
        match &mut *self.slot.lock().unwrap() {
            Slot::Send { ok, .. } => *ok = accepted,
            Slot::Recv { .. } => unreachable!("send waiter expected"),
        }
    }

    /// Reads a woken sender's outcome.
    pub(crate) fn send_ok(&self) -> bool {
        match &*self.slot.lock().unwrap() {
            Slot::Send { ok, .. } => *ok,
            Slot::Recv { .. } => unreachable!("send waiter expected"),
        }
    }

    /// Fills a claimed receiver's slot. `value` is `None` and `ok` false
    /// when the channel was closed under the receiver.
    pub(crate) fn fill_recv(&self, v: Option<T>, accepted: bool) {
        match &mut *self.slot.lock().unwrap() {
            Slot::Recv { value, ok } => {
                *value = v;
                *ok = accepted;
            }
            Slot::Send { .. } => unreachable!("recv waiter expected"),
        }
    }

    /// Takes a woken receiver's result.
    pub(crate) fn take_recv(&self) -> (Option<T>, bool) {
        match &mut *self.slot.lock().unwrap() {
            Slot::Recv { value, ok } => (value.take(), *ok),
            Slot::Send { .. } => unreachable!("recv waiter expected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_win_monotonic() {
        let g = WaitGroup::new();
        assert!(g.try_win(0));
        assert!(!g.try_win(1));
        assert_eq!(*g.winner(), Some(0));
    }

    #[test]
    fn test_send_slot_roundtrip() {
        let g = WaitGroup::new();
        let w = Waiter::new_send(g, 0, 7);
        assert_eq!(w.take_send_value(), 7);
        w.set_send_ok(true);
        assert!(w.send_ok());
    }

    #[test]
    fn test_recv_slot_roundtrip() {
        let g = WaitGroup::new();
        let w: Arc<Waiter<i32>> = Waiter::new_recv(g, 0);
        w.fill_recv(Some(9), true);
        assert_eq!(w.take_recv(), (Some(9), true));
    }

    #[test]
    fn test_wait_wakeup() {
        let g = WaitGroup::new();
        assert!(g.try_win(0));
        g.wakeup();
        g.wait();
    }
}
