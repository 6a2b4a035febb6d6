use std::{sync::Arc, time::Duration};

use rendition_abr::{NetworkMonitor, NetworkMonitorOptions};
use rendition_platform::{Mutex, time};
use tracing::trace;

/// Cloneable entry point for segment download telemetry.
///
/// The segment loader reports completed downloads here; only the manager's
/// evaluation loop reads the estimate.
#[derive(Clone, Debug)]
pub struct NetworkHandle {
    monitor: Arc<Mutex<NetworkMonitor>>,
}

impl NetworkHandle {
    pub(crate) fn new(opts: NetworkMonitorOptions) -> Self {
        Self {
            monitor: Arc::new(Mutex::new(NetworkMonitor::new(opts))),
        }
    }

    /// Record a finished segment download.
    ///
    /// Failed fetches should be reported with the bytes actually received so
    /// they pull the estimate down.
    pub fn on_segment_downloaded(&self, bytes: u64, duration: Duration) {
        trace!(bytes, ?duration, "segment downloaded");
        self.monitor
            .lock()
            .on_segment_downloaded(bytes, duration, time::now());
    }

    pub fn sample_count(&self) -> usize {
        self.monitor.lock().sample_count()
    }

    pub(crate) fn estimate_kbps(&self, now: time::Instant) -> Option<f64> {
        self.monitor.lock().estimate_kbps(now)
    }
}
