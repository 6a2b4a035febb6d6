//! Drive an ABR session against a simulated network and player.
//!
//! ```
//! cargo run -p rendition --example simulate [aggressive|balanced|conservative]
//! ```
//!
//! Bandwidth follows a fixed trace: a fast start, a sharp drop, then
//! recovery. Each simulated second downloads one segment at the current
//! quality and reports it to the manager.

use std::{env::args, error::Error, sync::Arc, time::Duration};

use async_trait::async_trait;
use rendition::{platform::Mutex, prelude::*};
use tokio::sync::broadcast;
use tracing::{info, metadata::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

const SEGMENT_SECS: f64 = 2.0;

/// Available bandwidth per simulated second, in kbps.
const TRACE: &[(u32, f64)] = &[(20, 12_000.0), (15, 1_800.0), (10, 400.0), (25, 9_000.0)];

struct Player {
    buffered_secs: f64,
    position_secs: f64,
    quality_kbps: u32,
    waiting: bool,
}

struct SimulatedEngine {
    ladder: QualityLadder,
    player: Mutex<Player>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl SimulatedEngine {
    fn new(ladder: QualityLadder) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            player: Mutex::new(Player {
                buffered_secs: 0.0,
                position_secs: 0.0,
                quality_kbps: ladder.lowest().video_bitrate_kbps,
                waiting: false,
            }),
            ladder,
            events,
        }
    }

    /// Download one segment at `bandwidth_kbps` and play one second.
    ///
    /// Returns `(bytes, transfer time)` for the network monitor.
    fn step(&self, bandwidth_kbps: f64) -> (u64, Duration) {
        let mut player = self.player.lock();
        let segment_kbits = f64::from(player.quality_kbps) * SEGMENT_SECS;
        let transfer_secs = segment_kbits / bandwidth_kbps;

        // One wall second: fetch what fits, play what is buffered.
        let fetched = SEGMENT_SECS * (1.0 / transfer_secs).min(1.0);
        player.buffered_secs = (player.buffered_secs + fetched - 1.0).max(0.0);
        player.position_secs += 1.0;

        let starving = player.buffered_secs <= 0.0;
        if starving != player.waiting {
            player.waiting = starving;
            let event = if starving {
                PlaybackEvent::Waiting
            } else {
                PlaybackEvent::Playing
            };
            let _ = self.events.send(event);
        }

        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bytes = (segment_kbits * 1000.0 / 8.0) as u64;
        (bytes, Duration::from_secs_f64(transfer_secs))
    }
}

#[async_trait]
impl PlaybackEngine for SimulatedEngine {
    fn buffered_seconds(&self) -> Result<f64, PlaybackError> {
        Ok(self.player.lock().buffered_secs)
    }

    fn current_time(&self) -> Result<f64, PlaybackError> {
        Ok(self.player.lock().position_secs)
    }

    fn is_stalled(&self) -> Result<bool, PlaybackError> {
        Ok(self.player.lock().waiting)
    }

    async fn switch_to(&self, quality: QualityId) -> Result<(), PlaybackError> {
        let kbps = self
            .ladder
            .get(&quality)
            .map(|level| level.video_bitrate_kbps)
            .ok_or_else(|| PlaybackError::QualityUnavailable(quality.clone()))?;
        tokio::time::sleep(Duration::from_millis(150)).await;
        self.player.lock().quality_kbps = kbps;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}

struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn record_session(&self, summary: SessionSummary) {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => info!("session summary:\n{json}"),
            Err(error) => warn!(%error, "failed to serialize session summary"),
        }
    }
}

fn levels() -> Vec<QualityLevel> {
    [
        ("240p", 500),
        ("360p", 1000),
        ("480p", 2500),
        ("720p", 5000),
        ("1080p", 8000),
    ]
    .into_iter()
    .map(|(id, kbps)| QualityLevel::new(id, kbps).with_label(id))
    .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("rendition_session=info".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let strategy: Strategy = args().nth(1).as_deref().unwrap_or("balanced").parse()?;
    let engine = Arc::new(SimulatedEngine::new(QualityLadder::new(levels())?));
    let manager = AbrManager::new(
        Arc::clone(&engine),
        LogAnalytics,
        ManagerOptions::default()
            .with_strategy(strategy)
            .with_tick_interval(Duration::from_millis(500)),
    );

    let mut events_rx = manager.events().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events_rx.recv().await {
                Ok(Event::Abr(event)) => info!(?event),
                Ok(Event::Playback(_)) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => warn!(n, "events lagged"),
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    manager
        .initialize("simulated", levels(), UserConstraints::default())
        .await?;
    let network = manager.network();

    // Simulated seconds are compressed to 100 ms of wall time.
    for &(seconds, bandwidth_kbps) in TRACE {
        info!(bandwidth_kbps, seconds, "network phase");
        for _ in 0..seconds {
            let (bytes, transfer) = engine.step(bandwidth_kbps);
            network.on_segment_downloaded(bytes, transfer);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        info!(metrics = ?manager.metrics()?, "phase finished");
    }

    manager.destroy().await;
    drop(manager);
    printer.abort();
    Ok(())
}
