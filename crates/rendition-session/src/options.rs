use std::time::Duration;

use rendition_abr::{NetworkMonitorOptions, Strategy};
use rendition_events::EventBus;

/// Configuration for [`AbrManager`](crate::AbrManager).
#[derive(Clone, Debug)]
pub struct ManagerOptions {
    /// Period of the evaluation loop.
    pub tick_interval: Duration,
    /// Strategy a new session starts with.
    pub strategy: Strategy,
    pub monitor: NetworkMonitorOptions,
    /// Bitrate ceiling applied while data saver mode is on.
    pub data_saver_max_kbps: u32,
    /// Upper bound on a single `switch_to` call.
    pub switch_timeout: Duration,
    /// Capacity of the event bus created when `events` is `None`.
    pub events_capacity: usize,
    /// Publish into an existing bus instead of creating one.
    pub events: Option<EventBus>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            strategy: Strategy::default(),
            monitor: NetworkMonitorOptions::default(),
            data_saver_max_kbps: 1000,
            switch_timeout: Duration::from_secs(10),
            events_capacity: 64,
            events: None,
        }
    }
}

impl ManagerOptions {
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_monitor(mut self, monitor: NetworkMonitorOptions) -> Self {
        self.monitor = monitor;
        self
    }

    #[must_use]
    pub fn with_data_saver_max_kbps(mut self, kbps: u32) -> Self {
        self.data_saver_max_kbps = kbps;
        self
    }

    #[must_use]
    pub fn with_switch_timeout(mut self, timeout: Duration) -> Self {
        self.switch_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }
}
