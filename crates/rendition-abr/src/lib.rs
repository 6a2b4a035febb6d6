//! Adaptive bitrate (ABR) core.
//!
//! This crate holds the runtime-free part of the ABR control loop:
//!
//! - **Quality ladder**: validated, bitrate-ordered set of renditions
//! - **Network monitor**: windowed throughput estimate from segment telemetry
//! - **Strategies**: `aggressive`, `balanced` and `conservative` presets
//! - **Decision engine**: pure [`decide`] function with hysteresis, switch
//!   damping and buffer-starvation overrides
//!
//! Orchestration (timers, playback engine, analytics) lives in
//! `rendition-session`.
//!
//! ## Example
//!
//! ```rust
//! use rendition_abr::{
//!     BufferState, CandidateTimers, Decision, DecisionInput, QualityLadder, QualityLevel,
//!     Strategy, decide,
//! };
//! use web_time::Instant;
//!
//! let ladder = QualityLadder::new(vec![
//!     QualityLevel::new("360p", 1000),
//!     QualityLevel::new("720p", 5000),
//! ])
//! .unwrap();
//! let strategy = Strategy::Balanced.config();
//! let candidates = CandidateTimers::new();
//!
//! let eval = decide(&DecisionInput {
//!     bandwidth_kbps: Some(800.0),
//!     buffer: BufferState { buffered_secs: 1.0, playhead_secs: 12.0, is_stalled: false },
//!     ladder: &ladder,
//!     current: &"720p".into(),
//!     strategy: &strategy,
//!     since_last_switch: None,
//!     buffering_events: 0,
//!     candidates: &candidates,
//!     now: Instant::now(),
//! });
//! assert_eq!(eval.decision, Decision::EmergencyDowngrade("360p".into()));
//! ```

#![forbid(unsafe_code)]

mod decision;
mod ladder;
mod monitor;
mod strategy;
mod types;

pub use decision::{
    AbrReason, CandidateTimers, Candidacy, Decision, DecisionInput, Evaluation, decide,
};
pub use ladder::{LadderError, LadderResult, QualityId, QualityLadder, QualityLevel};
pub use monitor::{NetworkMonitor, NetworkMonitorOptions, NetworkSample};
pub use strategy::{Strategy, StrategyConfig, StrategyParseError};
pub use types::{BufferState, SessionMetrics, SessionSummary};
