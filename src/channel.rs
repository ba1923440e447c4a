//! The channel itself: a buffered ring or a rendezvous barrier behind one
//! lock, plus the signal registry that lets [`crate::select`] watch it.
//!
//! This generalizes the teacher's MPSC `Shared<T> { mu: Mutex<Inner<T>>, avail:
//! Condvar }` (see `examples/hmunye-crust-of-rust/src/channels.rs` in the
//! retrieval pack) two ways: one channel type serves both the buffered and
//! the rendezvous flavor the teacher's own doc comment lists separately, and
//! two condvars replace one so that senders and receivers don't wake each
//! other spuriously (`cond_a` wakes senders, `cond_b` wakes receivers — see
//! `SPEC_FULL.md` §4.2/§4.3 for exactly which role waits on which).
//!
//! There is no `dispose`: channels are reference-counted through `Arc`, so
//! the last dropped handle frees everything. This sidesteps the
//! dispose-while-in-use race documented against the Fibonacci example in the
//! reference source (see `SPEC_FULL.md` §9) by construction.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, TryLockResult};

use crate::rendezvous::{Phase, RecvStep, Rendezvous, SendStep};
use crate::ring::RingBuffer;
use crate::signal::SignalRegistry;

enum Body<T> {
    Buffered(RingBuffer<T>),
    Unbuffered(Rendezvous<T>),
}

/// Named so [`crate::select`] can hold a `MutexGuard<ChannelState<T>>` across
/// its poll-then-commit window; its fields stay private to this module.
pub(crate) struct ChannelState<T> {
    closed: bool,
    body: Body<T>,
}

/// A bounded, typed, thread-safe channel.
///
/// `capacity == 0` gives a rendezvous (unbuffered) channel: `send` and
/// `receive` each block until the other side is present. Any other capacity
/// gives a FIFO buffer of that many slots: `send` blocks only while the
/// buffer is full, `receive` only while it is empty.
pub struct Channel<T> {
    state: Mutex<ChannelState<T>>,
    /// Wakes senders: notified whenever the channel stops being full (a
    /// receive drained a slot) or the barrier completes a handoff.
    pub(crate) cond_a: Condvar,
    /// Wakes receivers: notified whenever the channel stops being empty (a
    /// send filled a slot) or a queued third party may retry the barrier.
    pub(crate) cond_b: Condvar,
    pub(crate) registry: SignalRegistry,
}

impl<T> Channel<T> {
    /// Create a new channel. `capacity == 0` selects the rendezvous variant.
    pub fn new(capacity: usize) -> Arc<Self> {
        let body = if capacity == 0 {
            Body::Unbuffered(Rendezvous::new())
        } else {
            Body::Buffered(RingBuffer::new(capacity))
        };
        Arc::new(Self {
            state: Mutex::new(ChannelState {
                closed: false,
                body,
            }),
            cond_a: Condvar::new(),
            cond_b: Condvar::new(),
            registry: SignalRegistry::new(),
        })
    }

    /// Whether this channel is unbuffered (rendezvous) rather than FIFO.
    pub fn is_unbuffered(&self) -> bool {
        matches!(self.state.lock().unwrap().body, Body::Unbuffered(_))
    }

    /// The configured buffer capacity; always 0 for a rendezvous channel.
    pub fn capacity(&self) -> usize {
        match &self.state.lock().unwrap().body {
            Body::Buffered(ring) => ring.capacity(),
            Body::Unbuffered(_) => 0,
        }
    }

    /// Number of messages currently buffered; always 0 for a rendezvous
    /// channel (a rendezvous never holds a message outside of a handoff in
    /// progress).
    pub fn len(&self) -> usize {
        match &self.state.lock().unwrap().body {
            Body::Buffered(ring) => ring.len(),
            Body::Unbuffered(_) => 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Close the channel. Idempotent. Wakes every parked sender, receiver,
    /// and attached `select` call; subsequent sends become no-ops and
    /// subsequent receives drain whatever remains, then return the default
    /// value (see the module docs on [`crate::select`] for how `select`
    /// observes this).
    pub fn close(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.registry.broadcast();
        self.cond_a.notify_all();
        self.cond_b.notify_all();
    }
}

impl<T: Send> Channel<T> {
    /// Try to acquire the primary lock without blocking. Used only by
    /// [`crate::select`]'s poll pass — a contended lock means some other
    /// thread is already touching this channel, so the arm is treated as
    /// not-yet-ready rather than waited on.
    pub(crate) fn try_lock_state(&self) -> TryLockResult<MutexGuard<'_, ChannelState<T>>> {
        self.state.try_lock()
    }

    /// Whether a receive arm on this channel would succeed right now.
    /// Precondition: the channel is not closed (closed channels are never
    /// offered to [`crate::select`]'s readiness test).
    pub(crate) fn is_recv_ready(guard: &ChannelState<T>) -> bool {
        match &guard.body {
            Body::Buffered(ring) => !ring.is_empty(),
            Body::Unbuffered(bar) => bar.ready_for(false),
        }
    }

    /// Whether a send arm on this channel would succeed right now. See
    /// [`Channel::is_recv_ready`] for the closed-channel precondition.
    pub(crate) fn is_send_ready(guard: &ChannelState<T>) -> bool {
        match &guard.body {
            Body::Buffered(ring) => !ring.is_full(),
            Body::Unbuffered(bar) => bar.ready_for(true),
        }
    }

    /// Commit a `select` receive arm already proven ready under `guard`.
    pub(crate) fn commit_recv(&self, mut guard: MutexGuard<'_, ChannelState<T>>) -> T {
        let value = match &mut guard.body {
            Body::Buffered(ring) => ring.dequeue(),
            Body::Unbuffered(bar) => bar
                .commit_select(false, None)
                .expect("is_recv_ready guarantees a waiting sender's value"),
        };
        drop(guard);
        self.registry.broadcast();
        self.cond_a.notify_one();
        value
    }

    /// Commit a `select` send arm already proven ready under `guard`.
    pub(crate) fn commit_send(&self, mut guard: MutexGuard<'_, ChannelState<T>>, value: T) {
        match &mut guard.body {
            Body::Buffered(ring) => ring.enqueue(value),
            Body::Unbuffered(bar) => {
                bar.commit_select(true, Some(value));
            }
        }
        drop(guard);
        self.registry.broadcast();
        self.cond_b.notify_one();
    }

    /// Send `value`. Blocks while the buffer is full (buffered) or until a
    /// receiver arrives (unbuffered). A silent no-op if the channel is
    /// already closed.
    pub fn send(&self, value: T) {
        let guard = self.state.lock().unwrap();
        let is_buffered = matches!(guard.body, Body::Buffered(_));
        if is_buffered {
            self.send_buffered(guard, value);
        } else {
            self.send_unbuffered(guard, value);
        }
    }

    fn send_buffered(&self, mut guard: MutexGuard<'_, ChannelState<T>>, value: T) {
        loop {
            if guard.closed {
                tracing::debug!("send on closed buffered channel ignored");
                return;
            }
            let full = match &guard.body {
                Body::Buffered(ring) => ring.is_full(),
                Body::Unbuffered(_) => unreachable!(),
            };
            if !full {
                break;
            }
            guard = self.cond_a.wait(guard).unwrap();
        }
        match &mut guard.body {
            Body::Buffered(ring) => ring.enqueue(value),
            Body::Unbuffered(_) => unreachable!(),
        }
        drop(guard);
        self.registry.broadcast();
        self.cond_b.notify_one();
    }

    fn send_unbuffered(&self, mut guard: MutexGuard<'_, ChannelState<T>>, mut value: T) {
        loop {
            if guard.closed {
                return;
            }
            let step = match &mut guard.body {
                Body::Unbuffered(bar) => bar.try_send(value),
                Body::Buffered(_) => unreachable!(),
            };
            match step {
                SendStep::Completed => {
                    drop(guard);
                    self.registry.broadcast();
                    self.cond_a.notify_one();
                    return;
                }
                SendStep::BecameFirst => {
                    self.registry.broadcast();
                    loop {
                        if guard.closed {
                            break;
                        }
                        let handed_off = match &guard.body {
                            Body::Unbuffered(bar) => bar.phase() == Phase::Handoff,
                            Body::Buffered(_) => unreachable!(),
                        };
                        if handed_off {
                            break;
                        }
                        guard = self.cond_a.wait(guard).unwrap();
                    }
                    match &mut guard.body {
                        Body::Unbuffered(bar) => {
                            bar.complete_first(true);
                        }
                        Body::Buffered(_) => unreachable!(),
                    }
                    drop(guard);
                    self.cond_b.notify_one();
                    return;
                }
                SendStep::Retry(v) => {
                    value = v;
                    guard = self.cond_b.wait(guard).unwrap();
                }
            }
        }
    }
}

impl<T: Send + Default> Channel<T> {
    /// Receive a value. Blocks while the buffer is empty (buffered) or
    /// until a sender arrives (unbuffered). A closed, non-empty buffered
    /// channel drains its remaining messages before a later call returns
    /// `T::default()`; a closed, empty channel returns `T::default()`
    /// immediately (see `SPEC_FULL.md` §9 for why this, rather than an
    /// immediate zero-fill, is the semantics chosen here).
    pub fn receive(&self) -> T {
        let guard = self.state.lock().unwrap();
        let is_buffered = matches!(guard.body, Body::Buffered(_));
        if is_buffered {
            self.receive_buffered(guard)
        } else {
            self.receive_unbuffered(guard)
        }
    }

    fn receive_buffered(&self, mut guard: MutexGuard<'_, ChannelState<T>>) -> T {
        loop {
            let empty = match &guard.body {
                Body::Buffered(ring) => ring.is_empty(),
                Body::Unbuffered(_) => unreachable!(),
            };
            if !empty {
                break;
            }
            if guard.closed {
                tracing::debug!("receive on closed, empty channel returns default value");
                return T::default();
            }
            guard = self.cond_b.wait(guard).unwrap();
        }
        let value = match &mut guard.body {
            Body::Buffered(ring) => ring.dequeue(),
            Body::Unbuffered(_) => unreachable!(),
        };
        drop(guard);
        self.registry.broadcast();
        self.cond_a.notify_one();
        value
    }

    fn receive_unbuffered(&self, mut guard: MutexGuard<'_, ChannelState<T>>) -> T {
        loop {
            if guard.closed {
                return T::default();
            }
            let step = match &mut guard.body {
                Body::Unbuffered(bar) => bar.try_receive(),
                Body::Buffered(_) => unreachable!(),
            };
            match step {
                RecvStep::Completed(value) => {
                    drop(guard);
                    self.registry.broadcast();
                    self.cond_a.notify_one();
                    return value;
                }
                RecvStep::BecameFirst => {
                    self.registry.broadcast();
                    loop {
                        if guard.closed {
                            break;
                        }
                        let handed_off = match &guard.body {
                            Body::Unbuffered(bar) => bar.phase() == Phase::Handoff,
                            Body::Buffered(_) => unreachable!(),
                        };
                        if handed_off {
                            break;
                        }
                        guard = self.cond_a.wait(guard).unwrap();
                    }
                    let value = match &mut guard.body {
                        Body::Unbuffered(bar) => bar.complete_first(false),
                        Body::Buffered(_) => unreachable!(),
                    };
                    drop(guard);
                    self.cond_b.notify_one();
                    return value.unwrap_or_default();
                }
                RecvStep::Retry => {
                    guard = self.cond_b.wait(guard).unwrap();
                }
            }
        }
    }
}
