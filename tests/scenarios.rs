//! Integration tests exercising the public API the way an application would:
//! a handful of threads passing messages through channels, observed only
//! from the outside. Unit tests in `src/*.rs` cover the individual pieces;
//! these cover the pieces working together.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use csp_chan::{select, try_select, Channel, RecvArm, SelectOutcome, SendArm};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn buffered_echo() {
    init_tracing();
    let c = Channel::<u32>::new(1);
    let producer = c.clone();
    let t = thread::spawn(move || producer.send(0xDEAD_BEEF));

    let v = c.receive();
    t.join().unwrap();
    assert_eq!(v, 0xDEAD_BEEF);
}

#[test]
fn rendezvous_blocks_receiver_until_sender_arrives() {
    let c = Channel::<u32>::new(0);
    let producer = c.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        producer.send(42);
    });

    let start = Instant::now();
    let v = c.receive();
    let elapsed = start.elapsed();
    t.join().unwrap();

    assert_eq!(v, 42);
    assert!(
        elapsed >= Duration::from_millis(80),
        "receive should have blocked for roughly as long as the sender slept, took {elapsed:?}"
    );
}

#[test]
fn close_wakes_a_blocked_receiver() {
    let c = Channel::<u32>::new(4);
    let receiver = c.clone();
    let t = thread::spawn(move || receiver.receive());

    thread::sleep(Duration::from_millis(50));
    let close_start = Instant::now();
    c.close();
    let v = t.join().unwrap();

    assert_eq!(v, 0);
    assert!(close_start.elapsed() < Duration::from_millis(200));
}

#[test]
fn close_wakes_a_receiver_parked_at_the_rendezvous_with_no_sender() {
    let c = Channel::<u32>::new(0);
    let receiver = c.clone();
    let t = thread::spawn(move || receiver.receive());

    // Give the receiver time to become the rendezvous's first party and
    // park on cond_a before anyone ever sends.
    thread::sleep(Duration::from_millis(50));
    let close_start = Instant::now();
    c.close();
    let v = t.join().unwrap();

    assert_eq!(v, 0);
    assert!(close_start.elapsed() < Duration::from_millis(200));
}

#[test]
fn select_is_not_starved_between_two_equally_active_senders() {
    let a = Channel::<i32>::new(0);
    let b = Channel::<i32>::new(0);

    let a_sender = a.clone();
    let t1 = thread::spawn(move || {
        for i in 1..=300 {
            a_sender.send(i);
        }
    });
    let b_sender = b.clone();
    let t2 = thread::spawn(move || {
        for i in 1..=300 {
            b_sender.send(-i);
        }
    });

    let mut chosen_a = 0usize;
    let mut chosen_b = 0usize;
    for _ in 0..600 {
        let mut da = 0i32;
        let mut db = 0i32;
        let mut recvs = [RecvArm::new(&a, &mut da), RecvArm::new(&b, &mut db)];
        match select(&mut recvs, &mut []) {
            SelectOutcome::Ready(0) => {
                drop(recvs);
                chosen_a += 1;
            }
            SelectOutcome::Ready(1) => {
                drop(recvs);
                chosen_b += 1;
            }
            other => panic!("unexpected select outcome: {other:?}"),
        }
    }

    t1.join().unwrap();
    t2.join().unwrap();
    assert!(chosen_a > 0, "a's arm was starved across 600 selects");
    assert!(chosen_b > 0, "b's arm was starved across 600 selects");
}

#[test]
fn select_reports_all_closed_without_blocking() {
    let a = Channel::<u32>::new(1);
    let b = Channel::<u32>::new(1);
    a.close();
    b.close();

    let mut da = 0u32;
    let mut db = 0u32;
    let mut recvs = [RecvArm::new(&a, &mut da), RecvArm::new(&b, &mut db)];
    assert_eq!(select(&mut recvs, &mut []), SelectOutcome::AllClosed);
}

#[test]
fn try_select_never_blocks_and_can_pair_a_send_with_a_recv() {
    let a = Channel::<u32>::new(0);
    let b = Channel::<u32>::new(1);

    let mut dest = 0u32;
    let mut recvs = [RecvArm::new(&a, &mut dest)];
    let mut sends = [SendArm::new(&b, 11u32)];
    assert_eq!(try_select(&mut recvs, &mut sends), SelectOutcome::Ready(1));
    drop(recvs);
    drop(sends);
    assert_eq!(b.receive(), 11);
}

#[test]
fn sieve_of_eratosthenes_finds_every_prime_below_two_hundred() {
    const LIMIT: u32 = 199;

    let head = Channel::<u32>::new(1);
    let source = head.clone();
    let source_thread = thread::spawn(move || {
        let mut n = 3;
        while n <= LIMIT {
            source.send(n);
            n += 2;
        }
        source.close();
    });

    let mut stage_handles = Vec::new();
    let primes = AtomicUsize::new(0);
    let found = std::sync::Arc::new(std::sync::Mutex::new(Vec::<u32>::new()));

    // Grow the filter chain lazily: each stage discovers the next prime from
    // its input and spawns the next filter behind it, exactly like the
    // reference sieve's recursive `newFilter` growth.
    let mut current = head;
    loop {
        let prime = current.receive();
        if prime == 0 && current.is_closed() {
            break;
        }
        found.lock().unwrap().push(prime);
        primes.fetch_add(1, Ordering::Relaxed);

        let next = Channel::<u32>::new(1);
        let stage_input = current.clone();
        let stage_output = next.clone();
        stage_handles.push(thread::spawn(move || loop {
            let candidate = stage_input.receive();
            if candidate == 0 && stage_input.is_closed() {
                stage_output.close();
                return;
            }
            if candidate % prime != 0 {
                stage_output.send(candidate);
            }
        }));
        current = next;
    }

    source_thread.join().unwrap();
    for h in stage_handles {
        h.join().unwrap();
    }

    let expected: Vec<u32> = (3..=LIMIT).filter(|n| is_prime(*n)).collect();
    let got = found.lock().unwrap().clone();
    let got_set: HashSet<u32> = got.iter().copied().collect();
    let expected_set: HashSet<u32> = expected.iter().copied().collect();
    assert_eq!(got_set, expected_set);
    assert_eq!(primes.into_inner(), expected.len());
}

fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

/// A binary tree of agents, each computing one Fibonacci number by asking
/// its two children for `fib(n-1)` and `fib(n-2)` over rendezvous channels
/// and summing the results, mirroring `test.c`'s `testFibonacci`.
fn fib_agent(n: u32, reply: std::sync::Arc<Channel<u64>>) {
    if n < 2 {
        reply.send(n as u64);
        return;
    }
    let left = Channel::<u64>::new(0);
    let right = Channel::<u64>::new(0);

    let left_reply = left.clone();
    let lh = thread::spawn(move || fib_agent(n - 1, left_reply));
    let right_reply = right.clone();
    let rh = thread::spawn(move || fib_agent(n - 2, right_reply));

    let a = left.receive();
    let b = right.receive();
    lh.join().unwrap();
    rh.join().unwrap();
    reply.send(a + b);
}

#[test]
fn fibonacci_tree_computes_known_values() {
    for (n, expected) in [(0u32, 0u64), (1, 1), (5, 5), (10, 55), (15, 610)] {
        let reply = Channel::<u64>::new(0);
        let reply_handle = reply.clone();
        let t = thread::spawn(move || fib_agent(n, reply_handle));
        let v = reply.receive();
        t.join().unwrap();
        assert_eq!(v, expected, "fib({n}) should be {expected}");
    }
}
