//! Error types for the non-blocking channel probes.
//!
//! Only `try_send` and `try_recv` return errors; the blocking operations
//! follow the runtime-panic contract instead (send on a closed channel
//! panics, receive on a closed channel yields the zero value).

use thiserror::Error;

/// Error returned when a non-blocking send cannot complete.
///
/// The value being sent is returned so it can be recovered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrySendError<T> {
    /// The channel has no room: the buffer is full, or the channel is
    /// synchronous (or nil) with no receiver ready.
    #[error("channel is full")]
    Full(T),
    /// The channel is closed.
    #[error("send on closed channel")]
    Closed(T),
}

impl<T> TrySendError<T> {
    /// Returns the value that was being sent.
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::Full(v) | TrySendError::Closed(v) => v,
        }
    }
}

/// Error returned when a non-blocking receive finds no value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// The channel is empty (or nil) but not closed.
    #[error("channel is empty")]
    Empty,
    /// The channel is closed and drained. The blocking `recv_ok` reports
    /// the same state as `(zero, false)` rather than an error.
    #[error("channel is empty and closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_send_error_display() {
        assert_eq!(TrySendError::Full(1).to_string(), "channel is full");
        assert_eq!(
            TrySendError::Closed(1).to_string(),
            "send on closed channel"
        );
    }

    #[test]
    fn test_try_recv_error_display() {
        assert_eq!(TryRecvError::Empty.to_string(), "channel is empty");
        assert_eq!(
            TryRecvError::Closed.to_string(),
            "channel is empty and closed"
        );
    }

    #[test]
    fn test_try_send_error_into_inner() {
        assert_eq!(TrySendError::Full(42).into_inner(), 42);
        assert_eq!(TrySendError::Closed(100).into_inner(), 100);
    }
}
