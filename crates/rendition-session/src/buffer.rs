use rendition_abr::BufferState;

use crate::{PlaybackEngine, PlaybackError};

/// Reads a [`BufferState`] snapshot from a playback engine.
pub struct BufferMonitor<'a, E: ?Sized> {
    engine: &'a E,
}

impl<'a, E: PlaybackEngine + ?Sized> BufferMonitor<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Take one snapshot.
    ///
    /// Non-finite or negative readings are reported as
    /// [`PlaybackError::InvalidReading`] rather than fed to the decision
    /// engine.
    pub fn sample(&self) -> Result<BufferState, PlaybackError> {
        let buffered_secs = checked("buffered seconds", self.engine.buffered_seconds()?)?;
        let playhead_secs = checked("playhead", self.engine.current_time()?)?;
        Ok(BufferState {
            buffered_secs,
            playhead_secs,
            is_stalled: self.engine.is_stalled()?,
        })
    }
}

fn checked(what: &'static str, value: f64) -> Result<f64, PlaybackError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PlaybackError::InvalidReading { what, value })
    }
}
