use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{QualityId, Strategy};

/// Snapshot of the playback buffer taken once per evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferState {
    /// Seconds of media downloaded ahead of the playhead.
    pub buffered_secs: f64,
    pub playhead_secs: f64,
    pub is_stalled: bool,
}

/// Live view of an ABR session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub current_quality: QualityId,
    pub estimated_bandwidth_kbps: Option<f64>,
    /// Buffering events observed over the whole session.
    pub buffering_event_count: u32,
    /// Buffering events counted toward the next forced downgrade.
    pub pending_buffering_events: u32,
    pub quality_switch_count: u32,
    pub session_duration: Duration,
    pub strategy: Strategy,
    pub auto_quality_enabled: bool,
}

/// Final record handed to analytics when a session is destroyed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub video_id: String,
    pub strategy: Strategy,
    pub quality_switch_count: u32,
    pub buffering_event_count: u32,
    /// Time-weighted average of the active level's video bitrate.
    pub average_quality_bitrate_kbps: f64,
    pub session_duration: Duration,
}
