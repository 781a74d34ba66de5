//! End-to-end timer and ticker scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use weft_rt_sync::{chan, Select};
use weft_rt_time::{after, after_func, new_ticker, new_timer, now, tick, MILLISECOND};

#[test]
fn test_after_delivers_timestamp() {
    let before = now();
    let c = after(50.0 * MILLISECOND);
    let fired_at = c.recv();
    assert!(fired_at >= before + 50.0 * MILLISECOND * 0.9);
    assert_eq!(c.len(), 0);
}

#[test]
fn test_timer_stop_scenario() {
    // stop before fire: returns true, the channel stays empty, the timer
    // never fires afterward
    let t = new_timer(1.0);
    thread::sleep(Duration::from_millis(100));
    assert!(t.stop());
    thread::sleep(Duration::from_millis(1200));
    assert_eq!(t.c.len(), 0);
}

#[test]
fn test_timer_as_select_timeout() {
    let work = chan::<i32>();
    let timeout = after(50.0 * MILLISECOND);

    let result = Select::new().recv(&work).recv(&timeout).wait();
    assert_eq!(result.index, 1, "timeout case should fire");
}

#[test]
fn test_after_func_reset_chain() {
    // The callback may re-arm its own timer: each firing disarms the
    // timer first, so reset from inside the callback is legal.
    let fired = Arc::new(AtomicUsize::new(0));

    let f = fired.clone();
    let t = after_func(20.0 * MILLISECOND, move || {
        f.fetch_add(1, Ordering::SeqCst);
    });

    while fired.load(Ordering::SeqCst) == 0 {
        thread::yield_now();
    }
    t.reset(20.0 * MILLISECOND);
    while fired.load(Ordering::SeqCst) < 2 {
        thread::yield_now();
    }
    assert!(!t.stop());
}

#[test]
fn test_ticker_drop_scenario() {
    // A receiver sleeping 10x the period finds exactly one buffered tick.
    let tk = new_ticker(10.0 * MILLISECOND);
    thread::sleep(Duration::from_millis(200));

    let mut available = 0;
    while tk.c.try_recv().is_ok() {
        available += 1;
    }
    assert_eq!(available, 1);

    tk.stop();
    assert_eq!(tk.c.len(), 0);
}

#[test]
fn test_ticker_rate_with_fast_receiver() {
    let tk = new_ticker(30.0 * MILLISECOND);
    let mut last = tk.c.recv();
    for _ in 0..3 {
        let t = tk.c.recv();
        assert!(t - last >= 30.0 * MILLISECOND * 0.9, "ticks arrived too fast");
        last = t;
    }
    tk.stop();
}

#[test]
fn test_tick_shorthand() {
    let c = tick(20.0 * MILLISECOND);
    let t1 = c.recv();
    let t2 = c.recv();
    assert!(t2 > t1);
}
