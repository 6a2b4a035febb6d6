use std::time::Duration;

use rendition_abr::{LadderError, QualityId};

/// Why a requested quality was refused.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum InvalidQualityReason {
    #[error("not in the quality ladder")]
    NotInLadder,
    #[error("exceeds the maximum allowed quality {max}")]
    ExceedsMaxQuality { max: QualityId },
}

/// Errors surfaced to callers of the ABR manager.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AbrError {
    #[error("invalid quality {id}: {reason}")]
    InvalidQuality {
        id: QualityId,
        reason: InvalidQualityReason,
    },

    #[error("invalid ABR configuration: {0}")]
    Configuration(#[from] LadderError),

    #[error("ABR session not initialized")]
    NotInitialized,

    #[error("ABR session already initialized")]
    AlreadyInitialized,

    #[error("ABR manager destroyed")]
    Destroyed,
}

pub type AbrResult<T> = Result<T, AbrError>;

/// Failures reported by a playback engine.
///
/// The manager recovers from all of these locally.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PlaybackError {
    #[error("quality {0} is unavailable")]
    QualityUnavailable(QualityId),

    #[error("switch to {quality} timed out after {timeout:?}")]
    SwitchTimedOut { quality: QualityId, timeout: Duration },

    #[error("invalid {what} reading: {value}")]
    InvalidReading { what: &'static str, value: f64 },

    #[error("playback engine not ready")]
    NotReady,

    #[error("{0}")]
    Internal(String),
}
