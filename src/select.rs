//! Fair multi-way select over a mix of receive and send arms, each possibly
//! naming a channel of a different payload type.
//!
//! This mirrors the `_Selectable` shape an old `comm`-crate mpmc channel used
//! for the same problem (`ready`/`register`/`unregister`, see the
//! `other_examples` retrieval pack) more than it mirrors the teacher, whose
//! MPSC channel never needed a multi-channel wait — there's simply no
//! multi-way select in `examples/hmunye-crust-of-rust`. The type erasure
//! needed to put channels of different `T` in one call is done with a small
//! boxed-closure trick instead of a named "claim" trait object: a ready
//! arm's `try_claim` hands back a `Box<dyn FnOnce() + '_>` that, if actually
//! invoked, performs the commit (dequeue/enqueue/handoff) under the lock it
//! is still holding; if simply dropped, it releases that lock having done
//! nothing. That is exactly the "keep the lock, maybe commit, otherwise
//! release without touching state" shape the two-phase algorithm needs.

use std::sync::{Arc, Condvar, Mutex};

use rand::Rng;

use crate::channel::Channel;
use crate::signal::{Notify, SignalRegistry};

/// Result of a [`select`] or [`try_select`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The arm at this combined index fired. Receive arms occupy
    /// `[0, recvs.len())`; send arms occupy
    /// `[recvs.len(), recvs.len() + sends.len())`.
    Ready(usize),
    /// Every candidate channel was closed at the moment of the decision.
    AllClosed,
    /// Nothing was ready and not every channel was closed. Only returned by
    /// [`try_select`]; [`select`] parks instead.
    NoneReady,
}

trait PollableArm {
    fn registry(&self) -> &SignalRegistry;
    fn is_closed(&self) -> bool;
    /// Try to claim this arm under its channel's lock. `Some` holds that
    /// lock until the returned closure is either run (commits) or dropped
    /// (releases without committing).
    fn try_claim(&mut self) -> Option<Box<dyn FnOnce() + '_>>;
}

struct RecvHandle<'a, T: Send> {
    channel: &'a Arc<Channel<T>>,
    dest: Option<&'a mut T>,
}

impl<'a, T: Send> PollableArm for RecvHandle<'a, T> {
    fn registry(&self) -> &SignalRegistry {
        &self.channel.registry
    }

    fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    fn try_claim(&mut self) -> Option<Box<dyn FnOnce() + '_>> {
        let guard = self.channel.try_lock_state().ok()?;
        if !Channel::is_recv_ready(&guard) {
            return None;
        }
        let dest = self
            .dest
            .take()
            .expect("recv arm polled again after being claimed");
        let channel = self.channel;
        Some(Box::new(move || {
            *dest = channel.commit_recv(guard);
        }))
    }
}

struct SendHandle<'a, T: Send> {
    channel: &'a Arc<Channel<T>>,
    value: Option<T>,
}

impl<'a, T: Send> PollableArm for SendHandle<'a, T> {
    fn registry(&self) -> &SignalRegistry {
        &self.channel.registry
    }

    fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    fn try_claim(&mut self) -> Option<Box<dyn FnOnce() + '_>> {
        let guard = self.channel.try_lock_state().ok()?;
        if !Channel::is_send_ready(&guard) {
            return None;
        }
        let value = self
            .value
            .take()
            .expect("send arm polled again after being claimed");
        let channel = self.channel;
        Some(Box::new(move || {
            channel.commit_send(guard, value);
        }))
    }
}

/// One receive case in a [`select`]/[`try_select`] call: read from `channel`
/// into `dest` if and when this arm fires.
pub struct RecvArm<'a> {
    inner: Box<dyn PollableArm + 'a>,
}

impl<'a> RecvArm<'a> {
    pub fn new<T: Send + 'a>(channel: &'a Arc<Channel<T>>, dest: &'a mut T) -> Self {
        RecvArm {
            inner: Box::new(RecvHandle {
                channel,
                dest: Some(dest),
            }),
        }
    }
}

/// One send case in a [`select`]/[`try_select`] call: write `value` into
/// `channel` if and when this arm fires.
pub struct SendArm<'a> {
    inner: Box<dyn PollableArm + 'a>,
}

impl<'a> SendArm<'a> {
    pub fn new<T: Send + 'a>(channel: &'a Arc<Channel<T>>, value: T) -> Self {
        SendArm {
            inner: Box::new(SendHandle {
                channel,
                value: Some(value),
            }),
        }
    }
}

enum PollOutcome<'p> {
    Ready(Vec<(usize, Box<dyn FnOnce() + 'p>)>),
    AllClosed,
    NoneReady,
}

fn poll_ready<'p>(recvs: &'p mut [RecvArm<'_>], sends: &'p mut [SendArm<'_>]) -> PollOutcome<'p> {
    let total = recvs.len() + sends.len();
    if total == 0 {
        return PollOutcome::NoneReady;
    }

    let mut claims: Vec<(usize, Box<dyn FnOnce() + 'p>)> = Vec::new();
    let mut closed_count = 0usize;

    for (i, arm) in recvs.iter_mut().enumerate() {
        if arm.inner.is_closed() {
            closed_count += 1;
        } else if let Some(commit) = arm.inner.try_claim() {
            claims.push((i, commit));
        }
    }

    let recv_count = recvs.len();
    for (i, arm) in sends.iter_mut().enumerate() {
        if arm.inner.is_closed() {
            closed_count += 1;
        } else if let Some(commit) = arm.inner.try_claim() {
            claims.push((recv_count + i, commit));
        }
    }

    if !claims.is_empty() {
        PollOutcome::Ready(claims)
    } else if closed_count == total {
        PollOutcome::AllClosed
    } else {
        PollOutcome::NoneReady
    }
}

/// Pick one ready claim uniformly at random, drop the rest (releasing their
/// locks without touching channel state), then run the winner.
fn commit(mut claims: Vec<(usize, Box<dyn FnOnce() + '_>)>) -> usize {
    let winner = rand::rng().random_range(0..claims.len());
    let (index, run) = claims.swap_remove(winner);
    claims.clear(); // drop losers' held locks before committing the winner
    run();
    index
}

/// The private wake primitive a blocking [`select`] attaches to every
/// candidate channel's signal registry.
struct SelectSignal {
    dirty: Mutex<bool>,
    condvar: Condvar,
}

impl SelectSignal {
    fn new() -> Self {
        Self {
            dirty: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut dirty = self.dirty.lock().unwrap();
        while !*dirty {
            dirty = self.condvar.wait(dirty).unwrap();
        }
        *dirty = false;
    }
}

impl Notify for SelectSignal {
    fn notify(&self) {
        let mut dirty = self.dirty.lock().unwrap();
        *dirty = true;
        self.condvar.notify_one();
    }
}

fn attach_all(recvs: &[RecvArm<'_>], sends: &[SendArm<'_>], signal: &Arc<dyn Notify>) {
    for arm in recvs {
        arm.inner.registry().attach(signal);
    }
    for arm in sends {
        arm.inner.registry().attach(signal);
    }
}

fn detach_all(recvs: &[RecvArm<'_>], sends: &[SendArm<'_>], signal: &Arc<dyn Notify>) {
    for arm in recvs {
        arm.inner.registry().detach(signal);
    }
    for arm in sends {
        arm.inner.registry().detach(signal);
    }
}

/// Block until exactly one arm fires, or until every candidate channel is
/// closed. Arms not chosen are left completely untouched.
pub fn select(recvs: &mut [RecvArm<'_>], sends: &mut [SendArm<'_>]) -> SelectOutcome {
    let signal = Arc::new(SelectSignal::new());
    let as_notify: Arc<dyn Notify> = signal.clone();

    attach_all(recvs, sends, &as_notify);

    let outcome = loop {
        match poll_ready(recvs, sends) {
            PollOutcome::Ready(claims) => break SelectOutcome::Ready(commit(claims)),
            PollOutcome::AllClosed => break SelectOutcome::AllClosed,
            PollOutcome::NoneReady => signal.wait(),
        }
    };

    detach_all(recvs, sends, &as_notify);
    outcome
}

/// Like [`select`], but never blocks: returns
/// [`SelectOutcome::NoneReady`] immediately if nothing can fire right now.
pub fn try_select(recvs: &mut [RecvArm<'_>], sends: &mut [SendArm<'_>]) -> SelectOutcome {
    match poll_ready(recvs, sends) {
        PollOutcome::Ready(claims) => SelectOutcome::Ready(commit(claims)),
        PollOutcome::AllClosed => SelectOutcome::AllClosed,
        PollOutcome::NoneReady => SelectOutcome::NoneReady,
    }
}
