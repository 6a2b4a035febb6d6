#![forbid(unsafe_code)]

/// Notifications delivered by a playback engine.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Playback paused waiting for data.
    Waiting,
    /// Data delivery stalled.
    Stalled,
    /// Playback (re)started after waiting or seeking.
    Playing,
    /// Seek started.
    Seeking { to_secs: f64 },
    /// Seek finished.
    Seeked { position_secs: f64 },
    /// Periodic playhead update.
    TimeUpdate { position_secs: f64 },
}

impl PlaybackEvent {
    /// `true` for the events that mean playback is starved of data.
    pub fn is_starvation(&self) -> bool {
        matches!(self, Self::Waiting | Self::Stalled)
    }
}
