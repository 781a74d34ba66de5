//! Stress tests for channels and select.
//!
//! High-throughput and high-contention scenarios: many producers, long
//! FIFO streams through a small buffer, and select hammered from both
//! sides.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use weft_rt_sync::{buffered_chan, chan, Select};

#[test]
fn test_many_messages_through_small_buffer() {
    let ch = buffered_chan::<usize>(16);
    let num_messages = 100_000;

    let tx = ch.clone();
    let producer = thread::spawn(move || {
        for i in 0..num_messages {
            tx.send(i);
        }
    });

    for i in 0..num_messages {
        assert_eq!(ch.recv(), i);
    }
    producer.join().unwrap();
}

#[test]
fn test_many_producers_sync_channel() {
    const PRODUCERS: usize = 32;
    const PER_PRODUCER: usize = 500;

    let ch = chan::<usize>();
    let barrier = Arc::new(Barrier::new(PRODUCERS));
    let mut handles = Vec::new();

    for p in 0..PRODUCERS {
        let tx = ch.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..PER_PRODUCER {
                tx.send(p * PER_PRODUCER + i);
            }
        }));
    }

    let mut seen = vec![false; PRODUCERS * PER_PRODUCER];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let v = ch.recv();
        assert!(!seen[v], "value {v} delivered twice");
        seen[v] = true;
    }
    for h in handles {
        h.join().unwrap();
    }
    assert!(seen.iter().all(|&s| s), "values lost");
}

#[test]
fn test_per_sender_order_preserved() {
    // FIFO holds per sender even under contention: each producer's own
    // sequence arrives in order.
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 2_000;

    let ch = buffered_chan::<(usize, usize)>(4);
    let mut handles = Vec::new();
    for p in 0..PRODUCERS {
        let tx = ch.clone();
        handles.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                tx.send((p, i));
            }
        }));
    }

    let mut next = vec![0usize; PRODUCERS];
    for _ in 0..PRODUCERS * PER_PRODUCER {
        let (p, i) = ch.recv();
        assert_eq!(i, next[p], "producer {p} out of order");
        next[p] += 1;
    }
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_select_under_contention() {
    // Two producers feed two channels while one consumer selects over
    // both; every message must arrive exactly once.
    const PER_CHANNEL: usize = 5_000;

    let a = buffered_chan::<usize>(8);
    let b = buffered_chan::<usize>(8);

    let ta = a.clone();
    let pa = thread::spawn(move || {
        for i in 0..PER_CHANNEL {
            ta.send(i);
        }
    });
    let tb = b.clone();
    let pb = thread::spawn(move || {
        for i in 0..PER_CHANNEL {
            tb.send(PER_CHANNEL + i);
        }
    });

    let mut seen = vec![false; 2 * PER_CHANNEL];
    let mut from_a = 0;
    let mut from_b = 0;
    while from_a < PER_CHANNEL || from_b < PER_CHANNEL {
        let result = Select::new().recv(&a).recv(&b).wait();
        let v = *result.downcast_ref::<usize>().unwrap();
        assert!(!seen[v], "value {v} delivered twice");
        seen[v] = true;
        match result.index {
            0 => from_a += 1,
            1 => from_b += 1,
            i => unreachable!("select returned case {i}"),
        }
    }

    pa.join().unwrap();
    pb.join().unwrap();
    assert_eq!(from_a, PER_CHANNEL);
    assert_eq!(from_b, PER_CHANNEL);
}

#[test]
fn test_parked_selects_all_resolved() {
    // Many selects park on the same pair of channels; feeding exactly one
    // value per select resolves every one of them.
    const SELECTS: usize = 64;

    let a = chan::<usize>();
    let b = chan::<usize>();
    let resolved = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..SELECTS {
        let (a2, b2) = (a.clone(), b.clone());
        let resolved = resolved.clone();
        handles.push(thread::spawn(move || {
            let result = Select::new().recv(&a2).recv(&b2).wait();
            resolved.fetch_add(1, Ordering::SeqCst);
            *result.downcast_ref::<usize>().unwrap()
        }));
    }

    for i in 0..SELECTS {
        if i % 2 == 0 {
            a.send(i);
        } else {
            b.send(i);
        }
    }

    let mut got: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    got.sort_unstable();
    let expected: Vec<usize> = (0..SELECTS).collect();
    assert_eq!(got, expected);
    assert_eq!(resolved.load(Ordering::SeqCst), SELECTS);
}

#[test]
fn test_close_storm() {
    // Parked receivers across many channels all observe the broadcast.
    const CHANNELS: usize = 50;

    let mut handles = Vec::new();
    let mut channels = Vec::new();
    for _ in 0..CHANNELS {
        let ch = chan::<i32>();
        let rx = ch.clone();
        handles.push(thread::spawn(move || rx.recv_ok()));
        channels.push(ch);
    }

    thread::sleep(std::time::Duration::from_millis(100));
    for ch in &channels {
        ch.close();
    }
    for h in handles {
        assert_eq!(h.join().unwrap(), (0, false));
    }
}
