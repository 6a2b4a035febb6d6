#![forbid(unsafe_code)]

//! # Rendition
//!
//! Facade crate for adaptive bitrate (ABR) control of video playback.
//!
//! ## Quick start
//!
//! ```ignore
//! use rendition::prelude::*;
//!
//! let manager = AbrManager::new(engine, NoopAnalytics, ManagerOptions::default());
//! manager.initialize("video-42", levels, UserConstraints::default()).await?;
//!
//! // From the segment loader:
//! manager.network().on_segment_downloaded(bytes, elapsed);
//!
//! // From the UI:
//! manager.set_strategy(Strategy::Conservative)?;
//! let metrics = manager.metrics()?;
//!
//! manager.destroy().await;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod abr {
    pub use rendition_abr::*;
}

pub mod events {
    pub use rendition_events::*;
}

pub mod platform {
    pub use rendition_platform::*;
}

pub mod session {
    pub use rendition_session::*;
}

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use rendition_abr::{
        BufferState, QualityId, QualityLadder, QualityLevel, SessionMetrics, SessionSummary,
        Strategy, StrategyConfig,
    };
    pub use rendition_events::{AbrEvent, Event, EventBus, PlaybackEvent, SwitchCause};
    pub use rendition_session::{
        AbrError, AbrManager, AbrResult, AnalyticsSink, ManagerOptions, NetworkHandle,
        NoopAnalytics, PlaybackEngine, PlaybackError, UserConstraints,
    };
}
