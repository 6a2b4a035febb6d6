//! ABR session management.
//!
//! [`AbrManager`] owns one playback session: it polls the engine buffer
//! through [`BufferMonitor`], reads the throughput estimate fed through
//! [`NetworkHandle`], runs [`rendition_abr::decide`] every tick and drives
//! the [`PlaybackEngine`]. When the session ends the summary goes to the
//! [`AnalyticsSink`].
//!
//! Every observable change is published on a [`rendition_events::EventBus`].

#![forbid(unsafe_code)]

mod analytics;
mod buffer;
mod constraints;
mod engine;
mod error;
mod manager;
mod network;
mod options;
mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

#[cfg(any(test, feature = "test-utils"))]
pub use analytics::AnalyticsSinkMock;
pub use analytics::{AnalyticsSink, NoopAnalytics};
pub use buffer::BufferMonitor;
pub use constraints::UserConstraints;
pub use engine::PlaybackEngine;
pub use error::{AbrError, AbrResult, InvalidQualityReason, PlaybackError};
pub use manager::AbrManager;
pub use network::NetworkHandle;
pub use options::ManagerOptions;
