//! The observer mesh: a per-channel set of external wake signals.
//!
//! A channel cannot name its waiters directly (a blocking `send`/`receive`
//! parks on the channel's own condvars, but a parked [`crate::select::select`]
//! call parks on a *private* condvar it owns, shared across every channel in
//! the call). The registry bridges the two: a select call attaches its own
//! [`Notify`] handle to every candidate channel, and every state-changing
//! operation on a channel (`send`, `receive`, `close`) broadcasts the
//! registry so any attached select wakes up and re-polls.
//!
//! Entries are held as [`Weak`] references. The registry never keeps a
//! waiter alive; if a select call's signal has already been dropped (it
//! detaches before returning, but a `Weak` degrades gracefully even if it
//! didn't), `broadcast` simply skips it. This is a strictly safer analogue of
//! the reference implementation's `Signals` linked list of raw, unvalidated
//! condition-variable pointers.

use std::sync::{Arc, Mutex, Weak};

/// Something that can be woken when a channel it is watching changes state.
pub trait Notify: Send + Sync {
    /// Wake whatever is parked behind this signal. Called with no channel
    /// lock held, so implementations must not block on one.
    fn notify(&self);
}

/// Per-channel set of attached [`Notify`] handles.
#[derive(Default)]
pub(crate) struct SignalRegistry {
    signals: Mutex<Vec<Weak<dyn Notify>>>,
}

impl SignalRegistry {
    pub(crate) fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
        }
    }

    /// Attach a signal. Tolerates the same signal being attached to many
    /// channels at once, which is exactly what a multi-arm `select` does.
    pub(crate) fn attach(&self, signal: &Arc<dyn Notify>) {
        let mut signals = self.signals.lock().unwrap();
        signals.push(Arc::downgrade(signal));
    }

    /// Detach a previously attached signal. Silent if it was never attached
    /// or has already expired.
    pub(crate) fn detach(&self, signal: &Arc<dyn Notify>) {
        let mut signals = self.signals.lock().unwrap();
        if let Some(pos) = signals
            .iter()
            .position(|w| w.upgrade().is_some_and(|s| Arc::ptr_eq(&s, signal)))
        {
            signals.swap_remove(pos);
        }
    }

    /// Notify every still-live attached signal, pruning dead entries along
    /// the way. One wake per entry: each registered signal belongs to
    /// exactly one waiter at a time, so there is no need for a "wake
    /// everyone at once" primitive here — the registry-wide fan-out is the
    /// broadcast.
    pub(crate) fn broadcast(&self) {
        let mut signals = self.signals.lock().unwrap();
        signals.retain(|w| {
            if let Some(s) = w.upgrade() {
                s.notify();
                true
            } else {
                false
            }
        });
    }
}
