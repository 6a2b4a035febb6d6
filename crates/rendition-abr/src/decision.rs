use std::{collections::HashMap, time::Duration};

use web_time::Instant;

use crate::{BufferState, QualityId, QualityLadder, QualityLevel, StrategyConfig};

/// What the manager should do after an evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Keep the current quality.
    Hold,
    Upgrade(QualityId),
    Downgrade(QualityId),
    /// Buffer starvation: drop to the lowest level regardless of damping.
    EmergencyDowngrade(QualityId),
}

impl Decision {
    pub fn target(&self) -> Option<&QualityId> {
        match self {
            Self::Hold => None,
            Self::Upgrade(id) | Self::Downgrade(id) | Self::EmergencyDowngrade(id) => Some(id),
        }
    }

    pub fn is_switch(&self) -> bool {
        !matches!(self, Self::Hold)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AbrReason {
    CriticalBuffer,
    BufferingEvents,
    MinInterval,
    NoEstimate,
    BandwidthDrop,
    BandwidthHeadroom,
    CandidatePending,
    BufferTooLowForUpSwitch,
    AlreadyOptimal,
    AlreadyLowest,
    UnknownCurrent,
}

/// How the caller should update its candidate timers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidacy {
    Unchanged,
    /// Keep (or start) timing this upgrade target and forget every other timer.
    Track(QualityId),
    /// Keep (or start) timing the bandwidth-drop condition and forget upgrade
    /// timers. The downgrade target is picked when the timer fires.
    TrackDowngrade,
    Clear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    pub reason: AbrReason,
    pub candidacy: Candidacy,
}

impl Evaluation {
    fn hold(reason: AbrReason, candidacy: Candidacy) -> Self {
        Self {
            decision: Decision::Hold,
            reason,
            candidacy,
        }
    }

    fn switch(decision: Decision, reason: AbrReason) -> Self {
        Self {
            decision,
            reason,
            candidacy: Candidacy::Clear,
        }
    }
}

/// Since when each upgrade target, and the bandwidth-drop condition, has
/// been continuously eligible.
#[derive(Clone, Debug, Default)]
pub struct CandidateTimers {
    since: HashMap<QualityId, Instant>,
    downgrade_since: Option<Instant>,
}

impl CandidateTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long `id` has been the candidate, zero if it is not tracked.
    pub fn elapsed(&self, id: &QualityId, now: Instant) -> Duration {
        self.since
            .get(id)
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(*since))
    }

    pub fn is_tracking(&self, id: &QualityId) -> bool {
        self.since.contains_key(id)
    }

    /// How long bandwidth has stayed below the downgrade threshold.
    pub fn downgrade_elapsed(&self, now: Instant) -> Option<Duration> {
        self.downgrade_since
            .map(|since| now.saturating_duration_since(since))
    }

    pub fn apply(&mut self, candidacy: &Candidacy, now: Instant) {
        match candidacy {
            Candidacy::Unchanged => {}
            Candidacy::Track(id) => {
                self.downgrade_since = None;
                self.since.retain(|tracked, _| tracked == id);
                self.since.entry(id.clone()).or_insert(now);
            }
            Candidacy::TrackDowngrade => {
                self.since.clear();
                self.downgrade_since.get_or_insert(now);
            }
            Candidacy::Clear => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.since.clear();
        self.downgrade_since = None;
    }
}

/// Everything a single evaluation looks at.
#[derive(Clone, Copy, Debug)]
pub struct DecisionInput<'a> {
    /// `None` when no telemetry is available (unknown, not zero).
    pub bandwidth_kbps: Option<f64>,
    pub buffer: BufferState,
    pub ladder: &'a QualityLadder,
    pub current: &'a QualityId,
    pub strategy: &'a StrategyConfig,
    /// `None` if no switch has happened yet.
    pub since_last_switch: Option<Duration>,
    pub buffering_events: u32,
    pub candidates: &'a CandidateTimers,
    pub now: Instant,
}

/// Pick the next quality.
///
/// Rules are checked in priority order and the first match wins:
/// critical buffer, repeated buffering, switch interval, bandwidth drop,
/// bandwidth headroom.
pub fn decide(input: &DecisionInput<'_>) -> Evaluation {
    let DecisionInput {
        bandwidth_kbps,
        buffer,
        ladder,
        current,
        strategy,
        since_last_switch,
        buffering_events,
        candidates,
        now,
    } = *input;

    let Some(current) = ladder.get(current) else {
        tracing::debug!(%current, "ABR decide: current quality not in ladder");
        return Evaluation::hold(AbrReason::UnknownCurrent, Candidacy::Clear);
    };
    let lowest = ladder.lowest();

    if buffer.buffered_secs < strategy.critical_buffer_secs {
        if current.id == lowest.id {
            return Evaluation::hold(AbrReason::AlreadyLowest, Candidacy::Clear);
        }
        tracing::debug!(
            current = %current.id,
            buffered_secs = buffer.buffered_secs,
            critical = strategy.critical_buffer_secs,
            "ABR decide: critical buffer"
        );
        return Evaluation::switch(
            Decision::EmergencyDowngrade(lowest.id.clone()),
            AbrReason::CriticalBuffer,
        );
    }

    if buffering_events >= strategy.max_buffering_events_before_forced_downgrade {
        tracing::debug!(
            current = %current.id,
            buffering_events,
            "ABR decide: forced downgrade after buffering"
        );
        return match ladder.next_lower(&current.id) {
            Some(lower) => Evaluation::switch(
                Decision::Downgrade(lower.id.clone()),
                AbrReason::BufferingEvents,
            ),
            None => Evaluation::hold(AbrReason::BufferingEvents, Candidacy::Clear),
        };
    }

    if since_last_switch.is_some_and(|elapsed| elapsed < strategy.min_switch_interval) {
        tracing::debug!(current = %current.id, ?since_last_switch, "ABR decide: MinInterval not elapsed");
        return Evaluation::hold(AbrReason::MinInterval, Candidacy::Unchanged);
    }

    let Some(bandwidth_kbps) = bandwidth_kbps else {
        tracing::debug!(current = %current.id, "ABR decide: NoEstimate");
        return Evaluation::hold(AbrReason::NoEstimate, Candidacy::Clear);
    };

    let current_kbps = f64::from(current.video_bitrate_kbps);

    tracing::debug!(
        current = %current.id,
        current_kbps,
        bandwidth_kbps,
        buffered_secs = buffer.buffered_secs,
        "ABR decide: evaluating"
    );

    if bandwidth_kbps < current_kbps / strategy.downgrade_bandwidth_multiplier {
        let Some(target) = downgrade_target(ladder, current, bandwidth_kbps) else {
            return Evaluation::hold(AbrReason::AlreadyLowest, Candidacy::Clear);
        };
        // The condition is timed, not the target: a noisy estimate may move
        // the target across ladder steps while the drop persists.
        let elapsed = candidates.downgrade_elapsed(now);
        if elapsed.is_some_and(|elapsed| elapsed >= strategy.downgrade_delay) {
            return Evaluation::switch(
                Decision::Downgrade(target.id.clone()),
                AbrReason::BandwidthDrop,
            );
        }
        tracing::debug!(
            target = %target.id,
            ?elapsed,
            delay = ?strategy.downgrade_delay,
            "ABR decide: downgrade pending"
        );
        return Evaluation::hold(AbrReason::CandidatePending, Candidacy::TrackDowngrade);
    }

    let threshold = bandwidth_kbps / strategy.upgrade_bandwidth_multiplier;
    let Some(target) = ladder
        .highest_at_or_below(threshold)
        .filter(|l| l.video_bitrate_kbps > current.video_bitrate_kbps)
    else {
        return Evaluation::hold(AbrReason::AlreadyOptimal, Candidacy::Clear);
    };

    if buffer.buffered_secs < strategy.good_buffer_secs {
        tracing::debug!(
            target = %target.id,
            buffered_secs = buffer.buffered_secs,
            good = strategy.good_buffer_secs,
            "ABR decide: buffer too low for up-switch"
        );
        return Evaluation::hold(AbrReason::BufferTooLowForUpSwitch, Candidacy::Clear);
    }

    timed_upgrade(candidates, now, target, strategy.upgrade_delay)
}

/// Highest level below `current` that fits `bandwidth_kbps`, else the lowest.
fn downgrade_target<'a>(
    ladder: &'a QualityLadder,
    current: &QualityLevel,
    bandwidth_kbps: f64,
) -> Option<&'a QualityLevel> {
    let below = || {
        ladder
            .levels()
            .iter()
            .filter(|l| l.video_bitrate_kbps < current.video_bitrate_kbps)
    };
    below()
        .rev()
        .find(|l| f64::from(l.video_bitrate_kbps) <= bandwidth_kbps)
        .or_else(|| below().next())
}

fn timed_upgrade(
    candidates: &CandidateTimers,
    now: Instant,
    target: &QualityLevel,
    delay: Duration,
) -> Evaluation {
    let elapsed = candidates.elapsed(&target.id, now);
    if candidates.is_tracking(&target.id) && elapsed >= delay {
        return Evaluation::switch(
            Decision::Upgrade(target.id.clone()),
            AbrReason::BandwidthHeadroom,
        );
    }
    tracing::debug!(
        target = %target.id,
        ?elapsed,
        ?delay,
        "ABR decide: candidate pending"
    );
    Evaluation::hold(AbrReason::CandidatePending, Candidacy::Track(target.id.clone()))
}
