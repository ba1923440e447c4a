//! Error types for the fallible corners of the library.
//!
//! Almost everything in this crate is deliberately infallible at the API
//! level (send/receive/close/is_closed never return a `Result` — see the
//! module docs on [`crate::channel`] for why). The only genuinely fallible
//! operation is spawning an OS thread, which can fail for reasons outside
//! this crate's control.

use std::io;

/// Thread creation failed.
///
/// Mirrors the reference implementation's `CspChan_fork`, which returns 0 on
/// failure and leaves the decision to abort or degrade to the caller.
#[derive(Debug, thiserror::Error)]
#[error("failed to spawn agent thread: {source}")]
pub struct SpawnError {
    #[from]
    source: io::Error,
}

impl SpawnError {
    /// The underlying OS error, if callers need to inspect it (e.g. to
    /// distinguish resource exhaustion from a process-wide thread limit).
    pub fn source(&self) -> &io::Error {
        &self.source
    }
}
