#![forbid(unsafe_code)]

use crate::{AbrEvent, PlaybackEvent};

/// Unified event for the ABR stack.
///
/// Hierarchical: each source has its own variant with a sub-enum.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// ABR manager event.
    Abr(AbrEvent),
    /// Playback engine event, as observed by the manager.
    Playback(PlaybackEvent),
}

impl From<AbrEvent> for Event {
    fn from(e: AbrEvent) -> Self {
        Self::Abr(e)
    }
}

impl From<PlaybackEvent> for Event {
    fn from(e: PlaybackEvent) -> Self {
        Self::Playback(e)
    }
}
