// Common harness for integration tests

use std::{sync::Arc, time::Duration};

use rendition_abr::QualityLevel;
use rendition_platform::time;
use rendition_session::{AbrManager, ManagerOptions, UserConstraints};
use rendition_test_utils::{EventLog, FakePlaybackEngine, RecordingAnalytics};

/// A manager wired to a fake engine, a recording sink and an event log.
pub struct Harness {
    pub manager: AbrManager<FakePlaybackEngine, RecordingAnalytics>,
    pub engine: Arc<FakePlaybackEngine>,
    pub analytics: RecordingAnalytics,
    pub log: EventLog,
}

impl Harness {
    pub fn new(options: ManagerOptions) -> Self {
        let engine = Arc::new(FakePlaybackEngine::new());
        let analytics = RecordingAnalytics::new();
        let manager = AbrManager::new(Arc::clone(&engine), analytics.clone(), options);
        let log = EventLog::new(manager.events());
        Self {
            manager,
            engine,
            analytics,
            log,
        }
    }

    /// Build and initialize with default options.
    pub async fn start(levels: Vec<QualityLevel>, constraints: UserConstraints) -> Self {
        Self::start_with(ManagerOptions::default(), levels, constraints).await
    }

    pub async fn start_with(
        options: ManagerOptions,
        levels: Vec<QualityLevel>,
        constraints: UserConstraints,
    ) -> Self {
        let harness = Self::new(options);
        harness
            .manager
            .initialize("test-video", levels, constraints)
            .await
            .unwrap();
        harness
    }

    /// Report `count` one-second downloads at `kbps`.
    pub fn feed_kbps(&self, kbps: u32, count: usize) {
        let network = self.manager.network();
        for _ in 0..count {
            network.on_segment_downloaded(u64::from(kbps) * 125, Duration::from_secs(1));
        }
    }

    /// Pin `id`, then hand control back to the algorithm.
    pub fn start_from(&self, id: &str) {
        self.manager.set_quality(id).unwrap();
        self.manager.set_auto_quality(true).unwrap();
    }

    pub fn current(&self) -> String {
        self.manager.current_quality().unwrap().as_str().to_owned()
    }
}

/// Advance the paused runtime clock.
pub async fn advance(duration: Duration) {
    time::sleep(duration).await;
}

pub async fn advance_ms(millis: u64) {
    advance(Duration::from_millis(millis)).await;
}
