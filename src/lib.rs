//! CSP-style channels for ordinary OS threads: bounded buffers and
//! rendezvous handoffs behind one `Channel<T>` type, plus a fair multi-way
//! `select` over a mix of both.
//!
//! A channel is either buffered (`capacity >= 1`, a fixed-size FIFO) or
//! unbuffered (`capacity == 0`, a two-party rendezvous where `send` and
//! `receive` each block until the other side is physically present).
//! [`Channel::new`] picks the variant from the capacity you pass it; nothing
//! else about the API differs between the two.
//!
//! ```
//! use std::thread;
//! use csp_chan::Channel;
//!
//! let ch = Channel::<u32>::new(1);
//! let producer = ch.clone();
//! let t = thread::spawn(move || producer.send(42));
//! assert_eq!(ch.receive(), 42);
//! t.join().unwrap();
//! ```
//!
//! [`select`] and [`try_select`] wait on several channels of possibly
//! different payload types at once, the way Go's `select` statement does:
//!
//! ```
//! use csp_chan::{select, Channel, RecvArm, SelectOutcome};
//!
//! let a = Channel::<u32>::new(1);
//! let b = Channel::<u32>::new(1);
//! b.send(7);
//!
//! let mut da = 0;
//! let mut db = 0;
//! let mut recvs = [RecvArm::new(&a, &mut da), RecvArm::new(&b, &mut db)];
//! assert_eq!(select(&mut recvs, &mut []), SelectOutcome::Ready(1));
//! ```

mod channel;
mod error;
mod rendezvous;
mod ring;
mod select;
mod signal;
mod thread_helpers;

pub use channel::Channel;
pub use error::SpawnError;
pub use select::{select, try_select, RecvArm, SelectOutcome, SendArm};
pub use signal::Notify;
pub use thread_helpers::{join, sleep, spawn_agent};
