//! Runtime primitives for the rendition crates.
//!
//! # Synchronization
//!
//! Re-exports the [`parking_lot`] [`Mutex`]. All ABR session state sits behind a
//! single [`Mutex`] so a tick evaluation and an event callback never
//! interleave mid-update.
//!
//! # Scheduling
//!
//! [`Ticker`] runs a callback on a fixed period on the tokio runtime and can
//! be stopped synchronously. [`time::sleep`] re-exports the runtime sleep.

#![forbid(unsafe_code)]

pub mod time;
mod ticker;

pub use parking_lot::Mutex;
pub use ticker::Ticker;
