use std::{collections::VecDeque, time::Duration};

use web_time::Instant;

/// One completed (or failed, with `bytes == 0`) segment download.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkSample {
    pub bytes: u64,
    pub duration: Duration,
    pub observed_at: Instant,
}

/// Bounds of the rolling sample window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkMonitorOptions {
    /// Maximum number of samples kept.
    pub max_samples: usize,
    /// Samples older than this are pruned on read.
    pub max_age: Duration,
}

impl Default for NetworkMonitorOptions {
    fn default() -> Self {
        Self {
            max_samples: 10,
            max_age: Duration::from_secs(30),
        }
    }
}

/// Windowed throughput estimator fed by segment download telemetry.
///
/// The estimate is total bits over total transfer time across the window,
/// so long downloads weigh more than short ones.
#[derive(Clone, Debug)]
pub struct NetworkMonitor {
    opts: NetworkMonitorOptions,
    samples: VecDeque<NetworkSample>,
}

impl NetworkMonitor {
    pub fn new(opts: NetworkMonitorOptions) -> Self {
        let capacity = opts.max_samples.max(1);
        Self {
            opts,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a segment download.
    ///
    /// Zero-duration samples are dropped silently.
    pub fn on_segment_downloaded(&mut self, bytes: u64, duration: Duration, at: Instant) {
        self.push_sample(NetworkSample {
            bytes,
            duration,
            observed_at: at,
        });
    }

    pub fn push_sample(&mut self, sample: NetworkSample) {
        if sample.duration.is_zero() {
            tracing::trace!(bytes = sample.bytes, "dropping zero-duration sample");
            return;
        }

        self.samples.push_back(sample);
        while self.samples.len() > self.opts.max_samples.max(1) {
            self.samples.pop_front();
        }
    }

    /// Estimated bandwidth in kbps, or `None` when the window is empty.
    ///
    /// Prunes samples older than `max_age` relative to `now` first.
    #[expect(clippy::cast_precision_loss)] // byte counts stay far below 2^52
    pub fn estimate_kbps(&mut self, now: Instant) -> Option<f64> {
        self.prune(now);

        let (bytes, duration) = self
            .samples
            .iter()
            .fold((0_u64, Duration::ZERO), |(bytes, duration), s| {
                (bytes.saturating_add(s.bytes), duration + s.duration)
            });

        let secs = duration.as_secs_f64();
        if self.samples.is_empty() || secs <= 0.0 {
            return None;
        }

        let kilobits = (bytes as f64) * 8.0 / 1000.0;
        Some(kilobits / secs)
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    fn prune(&mut self, now: Instant) {
        let max_age = self.opts.max_age;
        self.samples
            .retain(|s| now.saturating_duration_since(s.observed_at) <= max_age);
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(NetworkMonitorOptions::default())
    }
}
