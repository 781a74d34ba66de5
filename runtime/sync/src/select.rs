//! Select over multiple channel operations.
//!
//! [`Select`] waits on several send/receive cases at once and commits
//! exactly one of them. When several cases are ready simultaneously the
//! choice is uniformly random; an optional default case makes the whole
//! operation non-blocking.
//!
//! Cases carry channels of different element types, so results come back
//! type-erased as `Box<dyn Any>` and are recovered with
//! [`SelectResult::downcast_ref`].
//!
//! # Examples
//!
//! ```
//! use weft_rt_sync::{Chan, Select};
//!
//! let a: Chan<i32> = Chan::new(1);
//! let b: Chan<&str> = Chan::new(1);
//! a.send(1);
//!
//! let result = Select::new().recv(&a).recv(&b).wait();
//! assert_eq!(result.index, 0);
//! assert_eq!(result.downcast_ref::<i32>(), Some(&1));
//! ```

use std::any::Any;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::channel::{block_forever, complete_recv, complete_send, Chan, ChanInner, TryRecv, TrySend};
use crate::waiter::{WaitGroup, Waiter, WINNER_SENTINEL};

/// Result of a completed channel case.
enum CaseOutcome {
    Recv { value: Box<dyn Any>, ok: bool },
    Sent,
    SendClosed,
}

/// Outcome of subscribing one case during the second pass.
enum Subscribed {
    /// The retry under both locks succeeded; the winner sentinel is set.
    Ready(CaseOutcome),
    /// An already-queued case won while this one was being subscribed.
    AlreadyDecided,
    /// The case was parked on its channel.
    Queued(Box<dyn QueuedCase>),
}

/// One send/recv case, typed at construction and erased for the engine.
trait ChanCase {
    fn is_nil(&self) -> bool;
    /// First pass: one non-blocking attempt under the channel mutex.
    fn poll(&mut self) -> Option<CaseOutcome>;
    /// Second pass: retry under channel.mu + group.mu, parking a waiter
    /// if the case is still not ready.
    fn subscribe(&mut self, g: &Arc<WaitGroup>, token: usize) -> Subscribed;
}

/// A waiter parked by `subscribe`, kept for winner lookup and cleanup.
trait QueuedCase {
    fn token(&self) -> usize;
    /// Removes the waiter from its channel queue; tolerates waiters
    /// already dequeued by a peer.
    fn unregister(&self);
    /// Assembles the case result after this waiter won and was woken.
    fn finish(&self) -> CaseOutcome;
}

struct RecvCase<T> {
    ch: Chan<T>,
}

impl<T: Default + Send + 'static> ChanCase for RecvCase<T> {
    fn is_nil(&self) -> bool {
        self.ch.is_nil()
    }

    fn poll(&mut self) -> Option<CaseOutcome> {
        let inner = self.ch.inner().expect("nil cases are never polled");
        let mut st = inner.st.lock().unwrap();
        match inner.try_recv_locked(&mut st, None) {
            TryRecv::Got {
                value,
                ok,
                wake_sender,
            } => {
                drop(st);
                if let Some(w) = wake_sender {
                    complete_send(w);
                }
                Some(CaseOutcome::Recv {
                    value: Box::new(value.unwrap_or_default()),
                    ok,
                })
            }
            TryRecv::NotReady => None,
        }
    }

    fn subscribe(&mut self, g: &Arc<WaitGroup>, token: usize) -> Subscribed {
        let inner = self.ch.inner().expect("nil cases are never subscribed");
        let mut st = inner.st.lock().unwrap();
        let mut winner = g.winner();
        if winner.is_some() {
            return Subscribed::AlreadyDecided;
        }
        match inner.try_recv_locked(&mut st, Some(g)) {
            TryRecv::Got {
                value,
                ok,
                wake_sender,
            } => {
                // Commit before the queued siblings can be claimed.
                *winner = Some(WINNER_SENTINEL);
                drop(winner);
                drop(st);
                if let Some(w) = wake_sender {
                    complete_send(w);
                }
                Subscribed::Ready(CaseOutcome::Recv {
                    value: Box::new(value.unwrap_or_default()),
                    ok,
                })
            }
            TryRecv::NotReady => {
                let w = Waiter::new_recv(g.clone(), token);
                st.recvq.push_back(w.clone());
                Subscribed::Queued(Box::new(QueuedRecv {
                    inner: inner.clone(),
                    w,
                }))
            }
        }
    }
}

struct QueuedRecv<T> {
    inner: Arc<ChanInner<T>>,
    w: Arc<Waiter<T>>,
}

impl<T: Default + Send + 'static> QueuedCase for QueuedRecv<T> {
    fn token(&self) -> usize {
        self.w.token
    }

    fn unregister(&self) {
        let mut st = self.inner.st.lock().unwrap();
        st.recvq.retain(|x| !Arc::ptr_eq(x, &self.w));
    }

    fn finish(&self) -> CaseOutcome {
        let (value, ok) = self.w.take_recv();
        CaseOutcome::Recv {
            value: Box::new(value.unwrap_or_default()),
            ok,
        }
    }
}

struct SendCase<T> {
    ch: Chan<T>,
    value: Option<T>,
}

impl<T: Send + 'static> ChanCase for SendCase<T> {
    fn is_nil(&self) -> bool {
        self.ch.is_nil()
    }

    fn poll(&mut self) -> Option<CaseOutcome> {
        let inner = self.ch.inner().expect("nil cases are never polled");
        let v = self.value.take().expect("send case value consumed");
        let mut st = inner.st.lock().unwrap();
        match inner.try_send_locked(&mut st, v, None) {
            TrySend::Sent(done) => {
                drop(st);
                if let Some((w, v)) = done {
                    complete_recv(w, v);
                }
                Some(CaseOutcome::Sent)
            }
            TrySend::Closed(_) => {
                drop(st);
                panic!("send on closed channel");
            }
            TrySend::Full(v) => {
                self.value = Some(v);
                None
            }
        }
    }

    fn subscribe(&mut self, g: &Arc<WaitGroup>, token: usize) -> Subscribed {
        let inner = self.ch.inner().expect("nil cases are never subscribed");
        let v = self.value.take().expect("send case value consumed");
        let mut st = inner.st.lock().unwrap();
        let mut winner = g.winner();
        if winner.is_some() {
            return Subscribed::AlreadyDecided;
        }
        match inner.try_send_locked(&mut st, v, Some(g)) {
            TrySend::Sent(done) => {
                *winner = Some(WINNER_SENTINEL);
                drop(winner);
                drop(st);
                if let Some((w, v)) = done {
                    complete_recv(w, v);
                }
                Subscribed::Ready(CaseOutcome::Sent)
            }
            TrySend::Closed(_) => {
                drop(winner);
                drop(st);
                panic!("send on closed channel");
            }
            TrySend::Full(v) => {
                let w = Waiter::new_send(g.clone(), token, v);
                st.sendq.push_back(w.clone());
                Subscribed::Queued(Box::new(QueuedSend {
                    inner: inner.clone(),
                    w,
                }))
            }
        }
    }
}

struct QueuedSend<T> {
    inner: Arc<ChanInner<T>>,
    w: Arc<Waiter<T>>,
}

impl<T: Send + 'static> QueuedCase for QueuedSend<T> {
    fn token(&self) -> usize {
        self.w.token
    }

    fn unregister(&self) {
        let mut st = self.inner.st.lock().unwrap();
        st.sendq.retain(|x| !Arc::ptr_eq(x, &self.w));
    }

    fn finish(&self) -> CaseOutcome {
        if self.w.send_ok() {
            CaseOutcome::Sent
        } else {
            CaseOutcome::SendClosed
        }
    }
}

enum SelectCase {
    Chan(Box<dyn ChanCase>),
    Default,
}

/// Still-queued waiters of one select; unregisters them all when dropped,
/// so cleanup runs on every exit path, panics included.
struct QueuedSet {
    items: Vec<(usize, Box<dyn QueuedCase>)>,
}

impl QueuedSet {
    fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn push(&mut self, index: usize, q: Box<dyn QueuedCase>) {
        self.items.push((index, q));
    }

    fn finish(&self, token: usize) -> (usize, CaseOutcome) {
        for (index, q) in &self.items {
            if q.token() == token {
                return (*index, q.finish());
            }
        }
        unreachable!("select: winner token not among queued cases");
    }
}

impl Drop for QueuedSet {
    fn drop(&mut self) {
        for (_, q) in &self.items {
            q.unregister();
        }
    }
}

/// Builder for a select operation.
///
/// Cases are numbered in the order they are added; [`wait`](Select::wait)
/// returns the index of the case that committed. Nil channel cases are
/// legal and never become ready.
///
/// # Examples
///
/// ```
/// use weft_rt_sync::{Chan, Select};
///
/// let ch: Chan<i32> = Chan::new(0);
/// // Nothing is ready, so the default case fires.
/// let result = Select::new().recv(&ch).default().wait();
/// assert_eq!(result.index, 1);
/// ```
pub struct Select {
    cases: Vec<SelectCase>,
}

impl Select {
    /// Creates an empty select.
    pub fn new() -> Self {
        Self { cases: Vec::new() }
    }

    /// Adds a receive case.
    pub fn recv<T: Default + Send + 'static>(mut self, ch: &Chan<T>) -> Self {
        self.cases
            .push(SelectCase::Chan(Box::new(RecvCase { ch: ch.clone() })));
        self
    }

    /// Adds a receive case whose `ok` flag the caller intends to inspect.
    ///
    /// Runtime behavior is identical to [`recv`](Select::recv), since the
    /// result always carries both value and `ok`; this variant exists for
    /// call-site clarity.
    pub fn recv_ok<T: Default + Send + 'static>(self, ch: &Chan<T>) -> Self {
        self.recv(ch)
    }

    /// Adds a send case.
    pub fn send<T: Send + 'static>(mut self, ch: &Chan<T>, v: T) -> Self {
        self.cases.push(SelectCase::Chan(Box::new(SendCase {
            ch: ch.clone(),
            value: Some(v),
        })));
        self
    }

    /// Adds a default case, making the select non-blocking.
    pub fn default(mut self) -> Self {
        self.cases.push(SelectCase::Default);
        self
    }

    /// Commits exactly one case and returns its result.
    ///
    /// Blocks until some case is ready unless a default case is present.
    /// With no live cases and no default (all channels nil) this blocks
    /// forever.
    ///
    /// # Panics
    ///
    /// Panics with "select: multiple default cases" on a duplicate
    /// default, and with "send on closed channel" if a send case's
    /// channel is (or becomes) closed.
    pub fn wait(self) -> SelectResult {
        let mut default_index: Option<usize> = None;
        let mut live: Vec<(usize, Box<dyn ChanCase>)> = Vec::new();
        for (index, case) in self.cases.into_iter().enumerate() {
            match case {
                SelectCase::Default => {
                    if default_index.is_some() {
                        panic!("select: multiple default cases");
                    }
                    default_index = Some(index);
                }
                SelectCase::Chan(c) => {
                    if !c.is_nil() {
                        live.push((index, c));
                    }
                }
            }
        }

        // Fair choice among simultaneously-ready cases: poll (and later
        // subscribe) in a random order, returning the original index.
        live.shuffle(&mut thread_rng());

        // First pass: non-blocking poll of every live case.
        let mut pending: Vec<(usize, Box<dyn ChanCase>)> = Vec::new();
        for (index, mut c) in live {
            if let Some(outcome) = c.poll() {
                return Self::commit(index, outcome);
            }
            pending.push((index, c));
        }

        if let Some(index) = default_index {
            return SelectResult {
                index,
                value: None,
                ok: true,
            };
        }

        if pending.is_empty() {
            // Only nil channels: nothing can ever become ready.
            block_forever();
        }

        // Second pass: subscribe the pending cases under one wait-group.
        let g = WaitGroup::new();
        let mut queued = QueuedSet::new();
        let mut ready: Option<(usize, CaseOutcome)> = None;
        for (token, (index, mut c)) in pending.into_iter().enumerate() {
            match c.subscribe(&g, token) {
                Subscribed::Ready(outcome) => {
                    ready = Some((index, outcome));
                    break;
                }
                Subscribed::AlreadyDecided => break,
                Subscribed::Queued(q) => queued.push(index, q),
            }
        }

        if let Some((index, outcome)) = ready {
            drop(queued);
            return Self::commit(index, outcome);
        }

        g.wait();
        let token = (*g.winner()).expect("select: woken without a winner");
        let (index, outcome) = queued.finish(token);
        drop(queued);
        Self::commit(index, outcome)
    }

    fn commit(index: usize, outcome: CaseOutcome) -> SelectResult {
        match outcome {
            CaseOutcome::Recv { value, ok } => SelectResult {
                index,
                value: Some(value),
                ok,
            },
            CaseOutcome::Sent => SelectResult {
                index,
                value: None,
                ok: true,
            },
            CaseOutcome::SendClosed => panic!("send on closed channel"),
        }
    }
}

impl Default for Select {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of a select operation.
pub struct SelectResult {
    /// Index of the committed case, in the order cases were added.
    pub index: usize,
    /// The received value for receive cases; `None` for send and default
    /// cases. A receive on a closed channel yields the zero value.
    pub value: Option<Box<dyn Any>>,
    /// For receive cases, whether the value was sent by a peer (false
    /// when the channel was closed). Always true for send and default.
    pub ok: bool,
}

impl SelectResult {
    /// Borrows the received value as a concrete type, or `None` if there
    /// is no value or the type does not match.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_ref()?.downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_select_ready_recv() {
        let ch = Chan::new(1);
        ch.send(42);

        let result = Select::new().recv(&ch).wait();
        assert_eq!(result.index, 0);
        assert_eq!(result.downcast_ref::<i32>(), Some(&42));
        assert!(result.ok);
    }

    #[test]
    fn test_select_default_when_nothing_ready() {
        let ch: Chan<i32> = Chan::new(0);
        let result = Select::new().recv(&ch).default().wait();
        assert_eq!(result.index, 1);
        assert!(result.value.is_none());
    }

    #[test]
    fn test_select_send_into_buffer() {
        let ch: Chan<i32> = Chan::new(1);
        let result = Select::new().send(&ch, 9).default().wait();
        assert_eq!(result.index, 0);
        assert_eq!(ch.recv(), 9);
    }

    #[test]
    fn test_select_recv_on_closed() {
        let ch: Chan<i32> = Chan::new(0);
        ch.close();
        let result = Select::new().recv_ok(&ch).wait();
        assert_eq!(result.index, 0);
        assert_eq!(result.downcast_ref::<i32>(), Some(&0));
        assert!(!result.ok);
    }

    #[test]
    #[should_panic(expected = "send on closed channel")]
    fn test_select_send_on_closed_panics() {
        let ch = Chan::new(1);
        ch.close();
        Select::new().send(&ch, 1).wait();
    }

    #[test]
    #[should_panic(expected = "select: multiple default cases")]
    fn test_select_duplicate_default_panics() {
        let ch: Chan<i32> = Chan::new(0);
        Select::new().recv(&ch).default().default().wait();
    }

    #[test]
    fn test_select_nil_case_never_ready() {
        let nil: Chan<i32> = Chan::nil();
        let ch = Chan::new(1);
        ch.send(7);
        for _ in 0..50 {
            let result = Select::new().recv(&nil).recv(&ch).default().wait();
            assert_eq!(result.index, 1);
            ch.send(7);
        }
    }

    #[test]
    fn test_select_blocks_then_woken_by_send() {
        let a: Chan<i32> = Chan::new(0);
        let b: Chan<i32> = Chan::new(0);
        let (a2, b2) = (a.clone(), b.clone());
        let handle = thread::spawn(move || {
            let result = Select::new().recv(&a2).recv(&b2).wait();
            (result.index, *result.downcast_ref::<i32>().unwrap())
        });
        thread::sleep(Duration::from_millis(50));
        b.send(33);
        assert_eq!(handle.join().unwrap(), (1, 33));

        // The losing case must have been unregistered: a send on `a`
        // finds no receiver left behind.
        let a3 = a.clone();
        let handle = thread::spawn(move || a3.recv());
        thread::sleep(Duration::from_millis(50));
        a.send(1);
        assert_eq!(handle.join().unwrap(), 1);
    }

    #[test]
    fn test_select_send_case_woken_by_recv() {
        let ch: Chan<i32> = Chan::new(0);
        let tx = ch.clone();
        let handle = thread::spawn(move || {
            let result = Select::new().send(&tx, 5).wait();
            result.index
        });
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ch.recv(), 5);
        assert_eq!(handle.join().unwrap(), 0);
    }

    #[test]
    fn test_select_same_channel_send_and_recv_no_self_match() {
        // A select must not rendezvous with itself on a synchronous
        // channel; a peer receive resolves it through the send case.
        let ch: Chan<i32> = Chan::new(0);
        let c2 = ch.clone();
        let handle = thread::spawn(move || {
            let result = Select::new().send(&c2, 8).recv(&c2).wait();
            result.index
        });
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ch.recv(), 8);
        assert_eq!(handle.join().unwrap(), 0);
    }
}
