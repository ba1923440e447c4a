//! Thin wrappers over `std::thread` for applications that would rather not
//! touch the thread API directly, mirroring the reference implementation's
//! `CspChan_fork`/`CspChan_join`/`CspChan_sleep` helper trio.
//!
//! There is no scheduler here: an "agent" is an ordinary OS thread. These
//! helpers exist only to give spawn failure a typed error instead of a
//! panic, and to give the three C calls a direct Rust counterpart so a
//! reader moving from one to the other recognizes the shape immediately.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::SpawnError;

/// Spawn `body` on a new OS thread. Analogous to `CspChan_fork`, except
/// failure is reported as `Err(SpawnError)` instead of a null thread id.
pub fn spawn_agent<F>(body: F) -> Result<JoinHandle<()>, SpawnError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .spawn(body)
        .inspect_err(|err| tracing::warn!(%err, "failed to spawn agent thread"))
        .map_err(SpawnError::from)
}

/// Block until `handle`'s thread terminates. Analogous to `CspChan_join`;
/// included for symmetry even though `JoinHandle::join` is already one call.
pub fn join(handle: JoinHandle<()>) -> thread::Result<()> {
    handle.join()
}

/// Suspend the calling thread for approximately `duration`. Analogous to
/// `CspChan_sleep`.
pub fn sleep(duration: Duration) {
    thread::sleep(duration);
}
