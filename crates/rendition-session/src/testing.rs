//! In-memory collaborators for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use rendition_abr::{QualityId, SessionSummary};
use rendition_events::PlaybackEvent;
use rendition_platform::{Mutex, time};
use tokio::sync::broadcast;

use crate::{AnalyticsSink, PlaybackEngine, PlaybackError};

#[derive(Debug)]
struct EngineState {
    buffered_secs: f64,
    position_secs: f64,
    stalled: bool,
    fail_reads: bool,
    unavailable: HashSet<QualityId>,
    delays: HashMap<QualityId, Duration>,
    attempts: Vec<QualityId>,
    switches: Vec<QualityId>,
    buffer_reads: usize,
}

/// Scriptable [`PlaybackEngine`].
///
/// Buffer level, read failures, per-quality switch latency and switch
/// failures are all set from the test. Switch latency uses the runtime
/// clock, so paused-time tests control it.
#[derive(Debug)]
pub struct FakePlaybackEngine {
    state: Mutex<EngineState>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl FakePlaybackEngine {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(EngineState {
                buffered_secs: 30.0,
                position_secs: 0.0,
                stalled: false,
                fail_reads: false,
                unavailable: HashSet::new(),
                delays: HashMap::new(),
                attempts: Vec::new(),
                switches: Vec::new(),
                buffer_reads: 0,
            }),
            events,
        }
    }

    pub fn set_buffered(&self, secs: f64) {
        self.state.lock().buffered_secs = secs;
    }

    pub fn set_position(&self, secs: f64) {
        self.state.lock().position_secs = secs;
    }

    pub fn set_stalled(&self, stalled: bool) {
        self.state.lock().stalled = stalled;
    }

    /// Make every buffer read fail with [`PlaybackError::NotReady`].
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Reject switches to `quality`.
    pub fn make_unavailable(&self, quality: impl Into<QualityId>) {
        self.state.lock().unavailable.insert(quality.into());
    }

    pub fn make_available(&self, quality: impl Into<QualityId>) {
        self.state.lock().unavailable.remove(&quality.into());
    }

    /// Delay switches to `quality` by `delay`.
    pub fn set_switch_delay(&self, quality: impl Into<QualityId>, delay: Duration) {
        self.state.lock().delays.insert(quality.into(), delay);
    }

    /// Deliver a playback notification to subscribers.
    pub fn emit(&self, event: PlaybackEvent) {
        let _ = self.events.send(event);
    }

    /// Every `switch_to` call, in call order.
    pub fn attempts(&self) -> Vec<QualityId> {
        self.state.lock().attempts.clone()
    }

    /// Switches that completed successfully, in completion order.
    pub fn switches(&self) -> Vec<QualityId> {
        self.state.lock().switches.clone()
    }

    pub fn last_switch(&self) -> Option<QualityId> {
        self.state.lock().switches.last().cloned()
    }

    /// Number of `buffered_seconds` calls so far.
    pub fn buffer_reads(&self) -> usize {
        self.state.lock().buffer_reads
    }
}

impl Default for FakePlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackEngine for FakePlaybackEngine {
    fn buffered_seconds(&self) -> Result<f64, PlaybackError> {
        let mut state = self.state.lock();
        state.buffer_reads += 1;
        if state.fail_reads {
            return Err(PlaybackError::NotReady);
        }
        Ok(state.buffered_secs)
    }

    fn current_time(&self) -> Result<f64, PlaybackError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(PlaybackError::NotReady);
        }
        Ok(state.position_secs)
    }

    fn is_stalled(&self) -> Result<bool, PlaybackError> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(PlaybackError::NotReady);
        }
        Ok(state.stalled)
    }

    async fn switch_to(&self, quality: QualityId) -> Result<(), PlaybackError> {
        let delay = {
            let mut state = self.state.lock();
            state.attempts.push(quality.clone());
            state.delays.get(&quality).copied()
        };
        if let Some(delay) = delay {
            time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.unavailable.contains(&quality) {
            return Err(PlaybackError::QualityUnavailable(quality));
        }
        state.switches.push(quality);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

/// [`AnalyticsSink`] that keeps every summary it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingAnalytics {
    sessions: Arc<Mutex<Vec<SessionSummary>>>,
}

impl RecordingAnalytics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.sessions.lock().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn record_session(&self, summary: SessionSummary) {
        self.sessions.lock().push(summary);
    }
}
