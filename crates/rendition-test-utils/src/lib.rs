#![forbid(unsafe_code)]
#![expect(
    clippy::missing_panics_doc,
    reason = "test utility crate — panic documentation not needed"
)]

//! Shared test utilities for the rendition workspace.

pub mod events;
pub mod fixtures;
pub mod ladders;

pub use events::EventLog;
pub use fixtures::*;
pub use ladders::*;
pub use rendition_session::testing::{FakePlaybackEngine, RecordingAnalytics};
