//! Channel implementation for inter-task communication.
//!
//! Channels carry values of a fixed element type between tasks. A channel
//! created with capacity 0 is synchronous: send and receive complete only
//! in matched pairs. A positive capacity buffers that many values, FIFO.
//! There is also a distinguished nil channel on which send and receive
//! block forever and close panics.
//!
//! Blocking operations follow the Go contract rather than returning
//! errors: send on a closed channel panics, receive on a closed and
//! drained channel returns the zero value with `ok == false`.
//!
//! # Examples
//!
//! ```
//! use weft_rt_sync::Chan;
//!
//! let ch = Chan::new(2);
//! ch.send(1);
//! ch.send(2);
//! assert_eq!(ch.recv(), 1);
//! assert_eq!(ch.recv(), 2);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use weft_rt_sched::Sema;

use crate::error::{TryRecvError, TrySendError};
use crate::waiter::{WaitGroup, Waiter};

/// A channel handle.
///
/// Handles are cheap to clone; all clones refer to the same channel. The
/// nil channel is a tagged variant of the handle, not a null reference,
/// so every operation stays callable and follows the nil-channel rules.
///
/// Element types are unconstrained at construction. Receiving requires
/// `T: Default` (the value returned for a closed, drained channel), and
/// using a channel in a [`Select`](crate::Select) additionally requires
/// `T: Send + 'static`.
///
/// # Examples
///
/// ```
/// use weft_rt_sync::{chan, Chan};
/// use std::thread;
///
/// // Synchronous channel: send and recv rendezvous.
/// let ch: Chan<i32> = chan();
/// let tx = ch.clone();
/// thread::spawn(move || tx.send(42));
/// assert_eq!(ch.recv(), 42);
/// ```
pub struct Chan<T> {
    inner: Option<Arc<ChanInner<T>>>,
}

impl<T> Clone for Chan<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub(crate) struct ChanInner<T> {
    cap: usize,
    pub(crate) st: Mutex<ChanState<T>>,
}

pub(crate) struct ChanState<T> {
    buf: VecDeque<T>,
    pub(crate) sendq: VecDeque<Arc<Waiter<T>>>,
    pub(crate) recvq: VecDeque<Arc<Waiter<T>>>,
    closed: bool,
}

/// Outcome of a locked send attempt. `Sent` optionally carries a claimed
/// receiver to complete once the channel mutex is dropped.
pub(crate) enum TrySend<T> {
    Sent(Option<(Arc<Waiter<T>>, T)>),
    Closed(T),
    Full(T),
}

/// Outcome of a locked receive attempt. A closed, drained channel reports
/// `Got { value: None, ok: false }`: the attempt succeeded even though no
/// value was ever sent; the two flags are deliberately distinct.
pub(crate) enum TryRecv<T> {
    Got {
        value: Option<T>,
        ok: bool,
        wake_sender: Option<Arc<Waiter<T>>>,
    },
    NotReady,
}

/// Pops the first queued waiter whose group can still be won.
///
/// Waiters whose group already has a winner (select cases decided on
/// another channel) are discarded. Waiters belonging to `own` are skipped
/// in place: a select must not rendezvous with itself, and its group
/// mutex is already held by the caller.
fn dequeue<T>(
    q: &mut VecDeque<Arc<Waiter<T>>>,
    own: Option<&Arc<WaitGroup>>,
) -> Option<Arc<Waiter<T>>> {
    let mut i = 0;
    while i < q.len() {
        if let Some(own) = own {
            if Arc::ptr_eq(&q[i].group, own) {
                i += 1;
                continue;
            }
        }
        let w = q.remove(i).expect("index in bounds");
        if w.group.try_win(w.token) {
            return Some(w);
        }
    }
    None
}

impl<T> ChanInner<T> {
    /// Non-blocking send attempt; called with the state lock held.
    ///
    /// `own` is the caller's wait-group during a select subscribe retry;
    /// `None` everywhere else.
    pub(crate) fn try_send_locked(
        &self,
        st: &mut ChanState<T>,
        v: T,
        own: Option<&Arc<WaitGroup>>,
    ) -> TrySend<T> {
        if st.closed {
            return TrySend::Closed(v);
        }
        if self.cap == 0 {
            // Synchronous: ready only if a receiver is parked.
            match dequeue(&mut st.recvq, own) {
                Some(w) => TrySend::Sent(Some((w, v))),
                None => TrySend::Full(v),
            }
        } else if st.buf.len() < self.cap {
            st.buf.push_back(v);
            // A parked receiver implies the buffer was empty; hand the
            // head over to keep delivery FIFO.
            match dequeue(&mut st.recvq, own) {
                Some(w) => {
                    let head = st.buf.pop_front().expect("buffer non-empty");
                    TrySend::Sent(Some((w, head)))
                }
                None => TrySend::Sent(None),
            }
        } else {
            TrySend::Full(v)
        }
    }

    /// Non-blocking receive attempt; called with the state lock held.
    pub(crate) fn try_recv_locked(
        &self,
        st: &mut ChanState<T>,
        own: Option<&Arc<WaitGroup>>,
    ) -> TryRecv<T> {
        if let Some(v) = st.buf.pop_front() {
            // Refill the freed slot from the sender queue in FIFO order.
            let mut wake_sender = None;
            if let Some(w) = dequeue(&mut st.sendq, own) {
                st.buf.push_back(w.take_send_value());
                wake_sender = Some(w);
            }
            return TryRecv::Got {
                value: Some(v),
                ok: true,
                wake_sender,
            };
        }
        if st.closed {
            return TryRecv::Got {
                value: None,
                ok: false,
                wake_sender: None,
            };
        }
        match dequeue(&mut st.sendq, own) {
            Some(w) => {
                let v = w.take_send_value();
                TryRecv::Got {
                    value: Some(v),
                    ok: true,
                    wake_sender: Some(w),
                }
            }
            None => TryRecv::NotReady,
        }
    }
}

/// Completes a claimed receiver: delivers the value and wakes its task.
/// Must be called after the channel mutex is dropped.
pub(crate) fn complete_recv<T>(w: Arc<Waiter<T>>, v: T) {
    w.fill_recv(Some(v), true);
    w.group.wakeup();
}

/// Completes a claimed sender whose value was consumed.
/// Must be called after the channel mutex is dropped.
pub(crate) fn complete_send<T>(w: Arc<Waiter<T>>) {
    w.set_send_ok(true);
    w.group.wakeup();
}

/// Parks the calling task forever, as send and receive on the nil channel
/// require. Implemented as acquiring a semaphore nobody will release, so
/// cooperative hosts see a genuine blocking wait.
pub(crate) fn block_forever() -> ! {
    let sema = Sema::new();
    loop {
        sema.acquire();
    }
}

impl<T> Chan<T> {
    /// Creates a channel. Capacity 0 makes it synchronous (every send
    /// rendezvouses with a receive); capacity N buffers up to N values.
    pub fn new(cap: usize) -> Self {
        Self {
            inner: Some(Arc::new(ChanInner {
                cap,
                st: Mutex::new(ChanState {
                    buf: VecDeque::with_capacity(cap),
                    sendq: VecDeque::new(),
                    recvq: VecDeque::new(),
                    closed: false,
                }),
            })),
        }
    }

    /// The nil channel: send and receive block forever, close panics.
    pub fn nil() -> Self {
        Self { inner: None }
    }

    /// Whether this handle is the nil channel.
    pub fn is_nil(&self) -> bool {
        self.inner.is_none()
    }

    /// Whether two handles refer to the same channel. Nil handles all
    /// compare equal.
    pub fn same_channel(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub(crate) fn inner(&self) -> Option<&Arc<ChanInner<T>>> {
        self.inner.as_ref()
    }

    /// The channel capacity; 0 for synchronous and nil channels.
    pub fn cap(&self) -> usize {
        match &self.inner {
            Some(inner) => inner.cap,
            None => 0,
        }
    }

    /// Number of buffered values. Advisory only: not synchronized with
    /// concurrent operations. The nil channel reports 0.
    pub fn len(&self) -> usize {
        match &self.inner {
            Some(inner) => inner.st.lock().unwrap().buf.len(),
            None => 0,
        }
    }

    /// Whether `len()` is 0.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sends `v`, blocking until a receiver or buffer slot accepts it.
    ///
    /// On the nil channel this blocks forever.
    ///
    /// # Panics
    ///
    /// Panics with "send on closed channel" if the channel is closed, or
    /// becomes closed while the send is parked.
    pub fn send(&self, v: T) {
        let inner = match &self.inner {
            Some(inner) => inner,
            None => block_forever(),
        };
        let mut st = inner.st.lock().unwrap();
        match inner.try_send_locked(&mut st, v, None) {
            TrySend::Sent(done) => {
                drop(st);
                if let Some((w, v)) = done {
                    complete_recv(w, v);
                }
            }
            TrySend::Closed(_) => {
                drop(st);
                panic!("send on closed channel");
            }
            TrySend::Full(v) => {
                let g = WaitGroup::new();
                let w = Waiter::new_send(g.clone(), 0, v);
                st.sendq.push_back(w.clone());
                drop(st);
                g.wait();
                if !w.send_ok() {
                    panic!("send on closed channel");
                }
            }
        }
    }

    /// Receives a value together with an `ok` flag.
    ///
    /// `ok` is true when the value was sent by a peer, false when the
    /// channel is closed and drained, in which case the value is
    /// `T::default()`, the zero value. On the nil channel this blocks
    /// forever.
    pub fn recv_ok(&self) -> (T, bool)
    where
        T: Default,
    {
        let inner = match &self.inner {
            Some(inner) => inner,
            None => block_forever(),
        };
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
                (value.unwrap_or_default(), ok)
            }
            TryRecv::NotReady => {
                let g = WaitGroup::new();
                let w = Waiter::new_recv(g.clone(), 0);
                st.recvq.push_back(w.clone());
                drop(st);
                g.wait();
                let (value, ok) = w.take_recv();
                (value.unwrap_or_default(), ok)
            }
        }
    }

    /// Receives a value, discarding the `ok` flag.
    pub fn recv(&self) -> T
    where
        T: Default,
    {
        self.recv_ok().0
    }

    /// Closes the channel, waking every parked sender and receiver:
    /// parked receivers observe `(zero, false)`, parked senders panic
    /// with "send on closed channel". Closing is one-way and broadcasts
    /// to all current and future blockers.
    ///
    /// # Panics
    ///
    /// Panics on a closed channel ("close of closed channel") and on the
    /// nil channel ("close of nil channel").
    pub fn close(&self) {
        let inner = match &self.inner {
            Some(inner) => inner,
            None => panic!("close of nil channel"),
        };
        let mut st = inner.st.lock().unwrap();
        if st.closed {
            drop(st);
            panic!("close of closed channel");
        }
        st.closed = true;
        let mut receivers = Vec::new();
        while let Some(w) = dequeue(&mut st.recvq, None) {
            receivers.push(w);
        }
        let mut senders = Vec::new();
        while let Some(w) = dequeue(&mut st.sendq, None) {
            senders.push(w);
        }
        // Wakeups happen outside the channel mutex so that close never
        // holds channel.mu while touching group state.
        drop(st);
        for w in receivers {
            w.fill_recv(None, false);
            w.group.wakeup();
        }
        for w in senders {
            w.set_send_ok(false);
            w.group.wakeup();
        }
    }

    /// Non-blocking send probe.
    ///
    /// Unlike [`send`](Chan::send), a closed channel is reported as an
    /// error rather than a panic: the caller opted into an error-shaped
    /// API. The nil channel is never ready and reports `Full`.
    pub fn try_send(&self, v: T) -> Result<(), TrySendError<T>> {
        let inner = match &self.inner {
            Some(inner) => inner,
            None => return Err(TrySendError::Full(v)),
        };
        let mut st = inner.st.lock().unwrap();
        match inner.try_send_locked(&mut st, v, None) {
            TrySend::Sent(done) => {
                drop(st);
                if let Some((w, v)) = done {
                    complete_recv(w, v);
                }
                Ok(())
            }
            TrySend::Closed(v) => Err(TrySendError::Closed(v)),
            TrySend::Full(v) => Err(TrySendError::Full(v)),
        }
    }

    /// Non-blocking receive probe.
    ///
    /// Returns `(value, true)` when a value was taken. A closed, drained
    /// channel is reported as [`TryRecvError::Closed`]; the nil channel
    /// as [`TryRecvError::Empty`].
    pub fn try_recv(&self) -> Result<(T, bool), TryRecvError>
    where
        T: Default,
    {
        let inner = match &self.inner {
            Some(inner) => inner,
            None => return Err(TryRecvError::Empty),
        };
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
                if !ok {
                    return Err(TryRecvError::Closed);
                }
                Ok((value.unwrap_or_default(), ok))
            }
            TryRecv::NotReady => Err(TryRecvError::Empty),
        }
    }
}
