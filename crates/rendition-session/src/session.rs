use std::mem;

use rendition_abr::{
    AbrReason, BufferState, CandidateTimers, DecisionInput, QualityId, QualityLadder,
    SessionMetrics, SessionSummary, Strategy, decide,
};
use rendition_events::{PlaybackEvent, SwitchCause};
use rendition_platform::time::Instant;
use tracing::{debug, trace};

use crate::{AbrResult, UserConstraints};

/// A switch handed to the playback engine.
///
/// Adaptive switches carry a generation and are committed only when the
/// engine confirms them. Manual and constraint switches are committed when
/// issued and carry none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SwitchTicket {
    pub(crate) target: QualityId,
    pub(crate) cause: SwitchCause,
    pub(crate) generation: Option<u64>,
}

/// A switch committed on the spot, together with the quality it replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ImmediateSwitch {
    pub(crate) from: QualityId,
    pub(crate) ticket: SwitchTicket,
}

/// Outcome of [`AbrSession::set_auto`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AutoToggle {
    Unchanged,
    Changed(Option<ImmediateSwitch>),
}

#[derive(Clone, Debug)]
struct InFlight {
    target: QualityId,
    generation: u64,
}

#[derive(Clone, Copy, Debug, Default)]
struct PlaybackFlags {
    stalled: bool,
    seeking: bool,
}

/// Integral of the active level's bitrate over wall time.
#[derive(Clone, Copy, Debug)]
struct BitrateClock {
    since: Instant,
    kbps_secs: f64,
}

impl BitrateClock {
    fn advance(&mut self, kbps: u32, now: Instant) {
        let secs = now.saturating_duration_since(self.since).as_secs_f64();
        self.kbps_secs += f64::from(kbps) * secs;
        self.since = now;
    }
}

/// Per-video ABR state. Owned by the manager behind its state lock.
#[derive(Debug)]
pub(crate) struct AbrSession {
    video_id: String,
    ladder: QualityLadder,
    /// `ladder` after user constraints; adaptive selection stays inside it.
    allowed: QualityLadder,
    constraints: UserConstraints,
    data_saver_max_kbps: u32,
    strategy: Strategy,
    current: QualityId,
    auto_quality: bool,
    manual: Option<QualityId>,
    last_switch_at: Option<Instant>,
    candidates: CandidateTimers,
    pending_buffering_events: u32,
    total_buffering_events: u32,
    quality_switch_count: u32,
    started_at: Instant,
    bitrate: BitrateClock,
    last_buffer: Option<BufferState>,
    in_flight: Option<InFlight>,
    generation: u64,
    playback: PlaybackFlags,
}

impl AbrSession {
    /// Start a session at the highest allowed level.
    pub(crate) fn new(
        video_id: String,
        ladder: QualityLadder,
        constraints: UserConstraints,
        data_saver_max_kbps: u32,
        strategy: Strategy,
        now: Instant,
    ) -> AbrResult<Self> {
        constraints.validate(&ladder)?;
        let allowed = constraints.allowed_ladder(&ladder, data_saver_max_kbps);
        let current = allowed.highest().id.clone();

        Ok(Self {
            video_id,
            ladder,
            allowed,
            constraints,
            data_saver_max_kbps,
            strategy,
            current,
            auto_quality: true,
            manual: None,
            last_switch_at: None,
            candidates: CandidateTimers::new(),
            pending_buffering_events: 0,
            total_buffering_events: 0,
            quality_switch_count: 0,
            started_at: now,
            bitrate: BitrateClock {
                since: now,
                kbps_secs: 0.0,
            },
            last_buffer: None,
            in_flight: None,
            generation: 0,
            playback: PlaybackFlags::default(),
        })
    }

    pub(crate) fn video_id(&self) -> &str {
        &self.video_id
    }

    pub(crate) fn current(&self) -> &QualityId {
        &self.current
    }

    pub(crate) fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub(crate) fn is_auto(&self) -> bool {
        self.auto_quality
    }

    #[cfg(test)]
    pub(crate) fn manual_quality(&self) -> Option<&QualityId> {
        self.manual.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn has_switch_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns `true` if the strategy changed.
    pub(crate) fn set_strategy(&mut self, strategy: Strategy) -> bool {
        mem::replace(&mut self.strategy, strategy) != strategy
    }

    /// Remember a fresh buffer reading, or fall back to the previous one
    /// when the engine could not be read.
    pub(crate) fn buffer_or_last(&mut self, sample: Option<BufferState>) -> Option<BufferState> {
        if let Some(state) = sample {
            self.last_buffer = Some(state);
        }
        self.last_buffer
    }

    /// Run one evaluation and return the switch to issue, if any.
    pub(crate) fn evaluate(
        &mut self,
        buffer: BufferState,
        bandwidth_kbps: Option<f64>,
        now: Instant,
    ) -> Option<SwitchTicket> {
        let strategy = self.strategy.config();
        let eval = decide(&DecisionInput {
            bandwidth_kbps,
            buffer,
            ladder: &self.allowed,
            current: &self.current,
            strategy: &strategy,
            since_last_switch: self
                .last_switch_at
                .map(|at| now.saturating_duration_since(at)),
            buffering_events: self.pending_buffering_events,
            candidates: &self.candidates,
            now,
        });

        let Some(target) = eval.decision.target().cloned() else {
            self.candidates.apply(&eval.candidacy, now);
            if eval.reason == AbrReason::BufferingEvents {
                // Nothing lower to fall back to.
                self.pending_buffering_events = 0;
            }
            trace!(reason = ?eval.reason, current = %self.current, "ABR hold");
            return None;
        };

        let cause = SwitchCause::Adaptive(eval.reason);
        if let Some(in_flight) = &self.in_flight {
            if !cause.is_emergency() || in_flight.target == target {
                debug!(
                    %target,
                    in_flight = %in_flight.target,
                    reason = ?eval.reason,
                    "ABR switch already in flight, skipping"
                );
                return None;
            }
            debug!(
                superseded = %in_flight.target,
                %target,
                "emergency downgrade supersedes in-flight switch"
            );
        }

        self.generation += 1;
        self.in_flight = Some(InFlight {
            target: target.clone(),
            generation: self.generation,
        });
        Some(SwitchTicket {
            target,
            cause,
            generation: Some(self.generation),
        })
    }

    /// Commit a confirmed adaptive switch.
    ///
    /// Returns the previous quality, or `None` when the switch was
    /// superseded (or was never pending).
    pub(crate) fn commit(&mut self, ticket: &SwitchTicket, now: Instant) -> Option<QualityId> {
        let generation = ticket.generation?;
        self.in_flight
            .take_if(|in_flight| in_flight.generation == generation)?;

        let from = self.move_to(ticket.target.clone(), now);
        if ticket.cause == SwitchCause::Adaptive(AbrReason::BufferingEvents) {
            self.pending_buffering_events = 0;
        }
        Some(from)
    }

    /// Forget a failed switch. Candidate timers are kept so the next
    /// evaluation can retry without waiting out the delay again.
    pub(crate) fn abandon(&mut self, ticket: &SwitchTicket) {
        if let Some(generation) = ticket.generation {
            self.in_flight
                .take_if(|in_flight| in_flight.generation == generation);
        }
    }

    /// Pin a user-selected quality and turn adaptive selection off.
    pub(crate) fn select_manual(
        &mut self,
        id: &QualityId,
        now: Instant,
    ) -> AbrResult<Option<ImmediateSwitch>> {
        let target = self.constraints.check_manual(&self.ladder, id)?.id.clone();

        self.auto_quality = false;
        self.manual = Some(target.clone());
        self.in_flight = None;
        self.candidates.clear();

        Ok(self.switch_now(target, SwitchCause::Manual, now))
    }

    /// Toggle adaptive selection.
    ///
    /// Re-enabling from a manual quality outside the allowed ladder moves
    /// back inside it right away.
    pub(crate) fn set_auto(&mut self, enabled: bool, now: Instant) -> AutoToggle {
        if self.auto_quality == enabled {
            return AutoToggle::Unchanged;
        }
        self.auto_quality = enabled;
        self.candidates.clear();

        if !enabled {
            self.manual = Some(self.current.clone());
            self.in_flight = None;
            return AutoToggle::Changed(None);
        }

        self.manual = None;
        if self.allowed.contains(&self.current) {
            return AutoToggle::Changed(None);
        }
        let target = self.allowed.highest().id.clone();
        AutoToggle::Changed(self.switch_now(target, SwitchCause::Constraint, now))
    }

    /// Apply new user constraints, lowering the quality at once if the
    /// current one no longer fits.
    pub(crate) fn update_constraints(
        &mut self,
        constraints: UserConstraints,
        now: Instant,
    ) -> AbrResult<Option<ImmediateSwitch>> {
        constraints.validate(&self.ladder)?;
        self.allowed = constraints.allowed_ladder(&self.ladder, self.data_saver_max_kbps);
        self.constraints = constraints;

        if self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| !self.allowed.contains(&in_flight.target))
        {
            self.in_flight = None;
        }

        let target = if self.auto_quality {
            (!self.allowed.contains(&self.current)).then(|| self.allowed.highest().id.clone())
        } else if self
            .constraints
            .check_manual(&self.ladder, &self.current)
            .is_err()
        {
            self.constraints.max_quality_id.clone()
        } else {
            None
        };

        let Some(target) = target else {
            return Ok(None);
        };
        if !self.auto_quality {
            self.manual = Some(target.clone());
        }
        self.in_flight = None;
        self.candidates.clear();
        Ok(self.switch_now(target, SwitchCause::Constraint, now))
    }

    /// Track stall and seek notifications.
    ///
    /// Returns `(pending, total)` when a new buffering event was counted.
    /// A stall counts once until playback resumes; stalls while seeking
    /// are not counted.
    pub(crate) fn observe(&mut self, event: &PlaybackEvent) -> Option<(u32, u32)> {
        match event {
            PlaybackEvent::Waiting | PlaybackEvent::Stalled => {
                let already = self.playback.stalled || self.playback.seeking;
                self.playback.stalled = true;
                if already {
                    return None;
                }
                self.pending_buffering_events += 1;
                self.total_buffering_events += 1;
                Some((self.pending_buffering_events, self.total_buffering_events))
            }
            PlaybackEvent::Playing => {
                self.playback = PlaybackFlags::default();
                None
            }
            PlaybackEvent::Seeking { .. } => {
                self.playback.seeking = true;
                None
            }
            PlaybackEvent::Seeked { .. } | PlaybackEvent::TimeUpdate { .. } => None,
        }
    }

    pub(crate) fn metrics(&self, estimated_bandwidth_kbps: Option<f64>, now: Instant) -> SessionMetrics {
        SessionMetrics {
            current_quality: self.current.clone(),
            estimated_bandwidth_kbps,
            buffering_event_count: self.total_buffering_events,
            pending_buffering_events: self.pending_buffering_events,
            quality_switch_count: self.quality_switch_count,
            session_duration: now.saturating_duration_since(self.started_at),
            strategy: self.strategy,
            auto_quality_enabled: self.auto_quality,
        }
    }

    pub(crate) fn summary(&self, now: Instant) -> SessionSummary {
        let mut bitrate = self.bitrate;
        let current_kbps = self.current_kbps();
        bitrate.advance(current_kbps, now);

        let session_duration = now.saturating_duration_since(self.started_at);
        let secs = session_duration.as_secs_f64();
        let average_quality_bitrate_kbps = if secs > 0.0 {
            bitrate.kbps_secs / secs
        } else {
            f64::from(current_kbps)
        };

        SessionSummary {
            video_id: self.video_id.clone(),
            strategy: self.strategy,
            quality_switch_count: self.quality_switch_count,
            buffering_event_count: self.total_buffering_events,
            average_quality_bitrate_kbps,
            session_duration,
        }
    }

    fn current_kbps(&self) -> u32 {
        self.ladder
            .get(&self.current)
            .map_or(0, |level| level.video_bitrate_kbps)
    }

    fn switch_now(
        &mut self,
        target: QualityId,
        cause: SwitchCause,
        now: Instant,
    ) -> Option<ImmediateSwitch> {
        if target == self.current {
            return None;
        }
        let from = self.move_to(target.clone(), now);
        Some(ImmediateSwitch {
            from,
            ticket: SwitchTicket {
                target,
                cause,
                generation: None,
            },
        })
    }

    fn move_to(&mut self, target: QualityId, now: Instant) -> QualityId {
        self.bitrate.advance(self.current_kbps(), now);
        let from = mem::replace(&mut self.current, target);
        if from != self.current {
            self.quality_switch_count += 1;
        }
        self.last_switch_at = Some(now);
        self.candidates.clear();
        from
    }
}
