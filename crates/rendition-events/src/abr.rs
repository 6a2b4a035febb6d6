#![forbid(unsafe_code)]

use rendition_abr::{AbrReason, QualityId, SessionSummary, Strategy};

/// Why a quality switch was issued.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SwitchCause {
    /// First switch of a session to the initial quality.
    Initial,
    /// Decided by the decision engine.
    Adaptive(AbrReason),
    /// User picked a quality.
    Manual,
    /// User constraints changed and the current quality no longer fits.
    Constraint,
}

impl SwitchCause {
    pub fn is_emergency(self) -> bool {
        matches!(self, Self::Adaptive(AbrReason::CriticalBuffer))
    }
}

/// Events emitted by the ABR manager.
#[derive(Clone, Debug, PartialEq)]
pub enum AbrEvent {
    /// Session initialized and the initial quality picked.
    SessionStarted {
        video_id: String,
        initial_quality: QualityId,
        strategy: Strategy,
    },
    /// The playback engine confirmed a switch.
    QualitySwitched {
        from: QualityId,
        to: QualityId,
        cause: SwitchCause,
    },
    /// The playback engine rejected a switch; the current quality stays.
    SwitchFailed {
        target: QualityId,
        cause: SwitchCause,
        error: String,
    },
    /// Playback starved of data.
    BufferingDetected { pending: u32, total: u32 },
    StrategyChanged { strategy: Strategy },
    AutoQualityChanged { enabled: bool },
    /// Final summary, also handed to analytics.
    SessionEnded { summary: SessionSummary },
}
