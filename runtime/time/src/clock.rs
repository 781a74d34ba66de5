//! Monotonic clock service.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

static EPOCH: OnceLock<Instant> = OnceLock::new();

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

/// Current monotonic time, in seconds since an arbitrary epoch.
pub fn now() -> f64 {
    epoch().elapsed().as_secs_f64()
}

/// Blocks the calling task for `dt` seconds. Non-positive durations
/// return immediately.
///
/// # Panics
///
/// Panics if `dt` is NaN or too large to represent ("sleep: dt overflow").
pub fn sleep(dt: f64) {
    let dt = if dt <= 0.0 { 0.0 } else { dt };
    match Duration::try_from_secs_f64(dt) {
        Ok(d) => std::thread::sleep(d),
        Err(_) => panic!("sleep: dt overflow"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_monotonic() {
        let a = now();
        let b = now();
        assert!(b >= a);
    }

    #[test]
    fn test_sleep_duration() {
        let start = now();
        sleep(0.05);
        assert!(now() - start >= 0.05);
    }

    #[test]
    fn test_sleep_negative_returns() {
        sleep(-1.0);
    }

    #[test]
    #[should_panic(expected = "sleep: dt overflow")]
    fn test_sleep_nan_panics() {
        sleep(f64::NAN);
    }
}
