use async_trait::async_trait;
use rendition_abr::QualityId;
use rendition_events::PlaybackEvent;
use tokio::sync::broadcast;

use crate::PlaybackError;

/// The player the ABR manager drives.
///
/// Buffer reads are polled once per tick and must not block.
/// `switch_to` may take as long as the engine needs to prepare the new
/// rendition; the manager never awaits it on the tick path.
#[async_trait]
pub trait PlaybackEngine: Send + Sync + 'static {
    /// Seconds of media buffered ahead of the playhead.
    fn buffered_seconds(&self) -> Result<f64, PlaybackError>;

    /// Playhead position in seconds.
    fn current_time(&self) -> Result<f64, PlaybackError>;

    fn is_stalled(&self) -> Result<bool, PlaybackError>;

    /// Switch playback to `quality`. Resolves once the engine has committed.
    async fn switch_to(&self, quality: QualityId) -> Result<(), PlaybackError>;

    /// Stall, seek and playhead notifications.
    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent>;
}
