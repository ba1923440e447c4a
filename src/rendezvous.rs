//! The two-party handshake backing unbuffered (`capacity == 0`) channels.
//!
//! This is a direct translation of the reference implementation's
//! `synctwo` state machine (`CspChan.c`), with one change: where the C code
//! hands the first party's stack address (`dataPtr`) to the second party and
//! has it `memcpy` directly into/out of that address, this implementation
//! carries the value itself through a one-slot `Option<T>` bus owned by the
//! barrier. Same handshake, no raw pointers into another thread's stack.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Phase {
    /// No party is waiting at the barrier.
    Idle,
    /// One party (`first_is_sender`) is waiting for its counterpart.
    Waiting,
    /// The handoff has been written; the first party is about to wake up
    /// and reset the barrier to `Idle`.
    Handoff,
}

pub(crate) struct Rendezvous<T> {
    phase: Phase,
    first_is_sender: bool,
    /// Holds the in-flight value between the moment a sender deposits it
    /// and the moment a receiver takes it. Only ever `Some` while
    /// `phase != Idle`.
    bus: Option<T>,
}

/// Outcome of one attempt to make progress as a sender.
pub(crate) enum SendStep<T> {
    /// The caller became the first party and must block until `Handoff`,
    /// then call [`Rendezvous::complete_first`].
    BecameFirst,
    /// A waiting receiver took the value; the handoff is done.
    Completed,
    /// Wrong role or barrier occupied; wait and retry, value handed back.
    Retry(T),
}

/// Outcome of one attempt to make progress as a receiver.
pub(crate) enum RecvStep<T> {
    /// The caller became the first party and must block until `Handoff`,
    /// then call [`Rendezvous::complete_first`].
    BecameFirst,
    /// A waiting sender's value was taken; the handoff is done.
    Completed(T),
    /// Wrong role or barrier occupied; wait and retry.
    Retry,
}

impl<T> Rendezvous<T> {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Idle,
            first_is_sender: false,
            bus: None,
        }
    }

    /// Attempt one step of `send`. `value` is handed back in
    /// [`SendStep::Retry`] so the caller can try again without losing it.
    pub(crate) fn try_send(&mut self, value: T) -> SendStep<T> {
        match self.phase {
            Phase::Idle => {
                self.first_is_sender = true;
                self.bus = Some(value);
                self.phase = Phase::Waiting;
                SendStep::BecameFirst
            }
            Phase::Waiting if !self.first_is_sender => {
                // A receiver is waiting; we complete the handoff.
                self.bus = Some(value);
                self.phase = Phase::Handoff;
                SendStep::Completed
            }
            Phase::Waiting | Phase::Handoff => SendStep::Retry(value),
        }
    }

    /// Attempt one step of `receive`.
    pub(crate) fn try_receive(&mut self) -> RecvStep<T> {
        match self.phase {
            Phase::Idle => {
                self.first_is_sender = false;
                self.phase = Phase::Waiting;
                RecvStep::BecameFirst
            }
            Phase::Waiting if self.first_is_sender => {
                // A sender is waiting and already deposited its value.
                let value = self.bus.take().expect("sender must have deposited a value");
                self.phase = Phase::Handoff;
                RecvStep::Completed(value)
            }
            Phase::Waiting | Phase::Handoff => RecvStep::Retry,
        }
    }

    /// Called by the first party once woken, either because a second party
    /// completed the handoff (`phase == Handoff`) or because the channel was
    /// closed while this party was still the sole occupant of `Waiting` (no
    /// second party ever arrived). Resets the barrier to `Idle` and, for a
    /// receiver, returns the value the second party deposited — or `None` if
    /// the wake was a close with no handoff, since `bus` was never filled.
    pub(crate) fn complete_first(&mut self, first_is_sender: bool) -> Option<T> {
        debug_assert_eq!(self.first_is_sender, first_is_sender);
        let handed_off = self.phase == Phase::Handoff;
        self.phase = Phase::Idle;
        if first_is_sender || !handed_off {
            self.bus.take();
            None
        } else {
            Some(
                self.bus
                    .take()
                    .expect("second party must have deposited a value"),
            )
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn first_is_sender(&self) -> bool {
        self.first_is_sender
    }

    /// Ready for a `select` arm of the given role: there is a first party
    /// waiting whose role is the opposite of the arm attempting to pair
    /// with it.
    pub(crate) fn ready_for(&self, arm_is_send: bool) -> bool {
        self.phase == Phase::Waiting && self.first_is_sender != arm_is_send
    }

    /// Commit a `select` transaction directly: pairs with the waiting first
    /// party without going through `try_send`/`try_receive`'s own state
    /// transition (the select engine already verified readiness under the
    /// same lock). Precondition: `ready_for(arm_is_send)`.
    pub(crate) fn commit_select(&mut self, arm_is_send: bool, outgoing: Option<T>) -> Option<T> {
        debug_assert!(self.ready_for(arm_is_send));
        let incoming = if arm_is_send {
            self.bus = outgoing;
            None
        } else {
            self.bus.take()
        };
        self.phase = Phase::Handoff;
        incoming
    }
}
