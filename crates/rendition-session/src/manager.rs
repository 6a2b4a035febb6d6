use std::{
    mem,
    ops::ControlFlow,
    sync::{Arc, Weak},
    time::Duration,
};

use rendition_abr::{QualityId, QualityLadder, QualityLevel, SessionMetrics, Strategy};
use rendition_events::{AbrEvent, EventBus, PlaybackEvent, SwitchCause};
use rendition_platform::{Mutex, Ticker, time};
use tokio::{
    runtime::Handle,
    sync::broadcast::error::RecvError,
    task::{JoinError, JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    AbrError, AbrResult, AnalyticsSink, BufferMonitor, ManagerOptions, NetworkHandle,
    PlaybackEngine, PlaybackError, UserConstraints,
    session::{AbrSession, AutoToggle, ImmediateSwitch, SwitchTicket},
};

enum State {
    Idle,
    Active(Box<AbrSession>),
    Destroyed,
}

#[derive(Default)]
struct Tasks {
    runtime: Option<Handle>,
    ticker: Option<Ticker>,
    listener: Option<JoinHandle<()>>,
    switches: JoinSet<()>,
    closed: bool,
}

/// Background tasks taken out of [`Tasks`] by `stop_tasks`, already aborted.
struct Stopped {
    listener: Option<JoinHandle<()>>,
    switches: JoinSet<()>,
}

impl Stopped {
    /// Wait until every task is gone.
    async fn join(mut self) {
        if let Some(listener) = self.listener {
            log_join_error("playback event listener", listener.await);
        }
        while let Some(result) = self.switches.join_next().await {
            log_join_error("quality switch", result);
        }
    }
}

fn log_join_error(task: &'static str, result: Result<(), JoinError>) {
    match result {
        Err(error) if error.is_panic() => warn!(task, %error, "ABR task panicked"),
        Ok(()) | Err(_) => {}
    }
}

struct Shared<E, A> {
    engine: Arc<E>,
    analytics: A,
    options: ManagerOptions,
    bus: EventBus,
    network: NetworkHandle,
    state: Mutex<State>,
    tasks: Mutex<Tasks>,
    cancel: CancellationToken,
}

/// Drives quality selection for one video session.
///
/// Lifecycle: [`new`](Self::new) → [`initialize`](Self::initialize) →
/// controls and telemetry → [`destroy`](Self::destroy). Every
/// `tick_interval` the manager samples the engine buffer and the network
/// estimate, runs the decision engine and hands switches to the engine
/// without waiting for them. An adaptive switch is committed only after
/// the engine confirms it.
///
/// All observable changes are published on [`events`](Self::events).
pub struct AbrManager<E, A> {
    shared: Arc<Shared<E, A>>,
}

impl<E, A> AbrManager<E, A>
where
    E: PlaybackEngine,
    A: AnalyticsSink,
{
    pub fn new(engine: Arc<E>, analytics: A, options: ManagerOptions) -> Self {
        let bus = options
            .events
            .clone()
            .unwrap_or_else(|| EventBus::new(options.events_capacity));
        let network = NetworkHandle::new(options.monitor.clone());

        Self {
            shared: Arc::new(Shared {
                engine,
                analytics,
                options,
                bus,
                network,
                state: Mutex::new(State::Idle),
                tasks: Mutex::new(Tasks::default()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.bus
    }

    /// Handle for reporting segment downloads.
    pub fn network(&self) -> NetworkHandle {
        self.shared.network.clone()
    }

    /// Shorthand for `self.network().on_segment_downloaded(..)`.
    pub fn on_segment_downloaded(&self, bytes: u64, duration: Duration) {
        self.shared.network.on_segment_downloaded(bytes, duration);
    }

    /// Start a session for `video_id` over `levels`.
    ///
    /// Playback starts at the highest level the constraints allow. The
    /// evaluation loop and the playback event listener start right away;
    /// a failed initial switch is logged and does not fail initialization.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn initialize(
        &self,
        video_id: impl Into<String>,
        levels: Vec<QualityLevel>,
        constraints: UserConstraints,
    ) -> AbrResult<()> {
        let video_id = video_id.into();
        let runtime = Handle::current();
        let shared = &self.shared;

        let (initial, strategy) = {
            let mut state = shared.state.lock();
            match &*state {
                State::Idle => {}
                State::Active(_) => return Err(AbrError::AlreadyInitialized),
                State::Destroyed => return Err(AbrError::Destroyed),
            }
            let session = AbrSession::new(
                video_id.clone(),
                QualityLadder::new(levels)?,
                constraints,
                shared.options.data_saver_max_kbps,
                shared.options.strategy,
                time::now(),
            )?;
            let initial = session.current().clone();
            let strategy = session.strategy();
            *state = State::Active(Box::new(session));
            (initial, strategy)
        };

        info!(%video_id, %initial, %strategy, "ABR session started");
        shared.bus.publish(AbrEvent::SessionStarted {
            video_id,
            initial_quality: initial.clone(),
            strategy,
        });

        shared.start_tasks(&runtime);

        if let Some(Err(error)) = shared.switch_unless_cancelled(&initial).await {
            warn!(%error, quality = %initial, "initial quality switch failed");
            shared.publish_if_active(AbrEvent::SwitchFailed {
                target: initial,
                cause: SwitchCause::Initial,
                error: error.to_string(),
            });
        }
        Ok(())
    }

    /// Change the strategy. Takes effect from the next evaluation.
    pub fn set_strategy(&self, strategy: Strategy) -> AbrResult<()> {
        let changed = self.shared.with_session(|s| Ok(s.set_strategy(strategy)))?;
        if changed {
            info!(%strategy, "ABR strategy changed");
            self.shared.bus.publish(AbrEvent::StrategyChanged { strategy });
        }
        Ok(())
    }

    /// Turn adaptive selection on or off.
    ///
    /// Turning it off freezes the current quality and drops any adaptive
    /// switch still in flight.
    pub fn set_auto_quality(&self, enabled: bool) -> AbrResult<()> {
        let now = time::now();
        let AutoToggle::Changed(switch) = self
            .shared
            .with_session(|s| Ok(s.set_auto(enabled, now)))?
        else {
            return Ok(());
        };

        info!(enabled, "auto quality changed");
        self.shared
            .bus
            .publish(AbrEvent::AutoQualityChanged { enabled });
        if let Some(switch) = switch {
            self.shared.issue_immediate(switch);
        }
        Ok(())
    }

    /// Pin `id` and turn adaptive selection off.
    ///
    /// Fails with [`AbrError::InvalidQuality`] if `id` is not in the ladder
    /// or is above the user's maximum quality.
    pub fn set_quality(&self, id: impl Into<QualityId>) -> AbrResult<()> {
        let id = id.into();
        let now = time::now();
        let (was_auto, switch) = self.shared.with_session(|s| {
            let was_auto = s.is_auto();
            Ok((was_auto, s.select_manual(&id, now)?))
        })?;

        if was_auto {
            info!(enabled = false, "auto quality changed");
            self.shared
                .bus
                .publish(AbrEvent::AutoQualityChanged { enabled: false });
        }
        match switch {
            Some(switch) => self.shared.issue_immediate(switch),
            None => debug!(quality = %id, "manual quality already active"),
        }
        Ok(())
    }

    /// Replace the user constraints.
    ///
    /// If the current quality no longer fits, the manager switches down
    /// immediately instead of waiting for the next evaluation.
    pub fn update_constraints(&self, constraints: UserConstraints) -> AbrResult<()> {
        let now = time::now();
        debug!(?constraints, "updating ABR constraints");
        let switch = self
            .shared
            .with_session(|s| s.update_constraints(constraints, now))?;
        if let Some(switch) = switch {
            self.shared.issue_immediate(switch);
        }
        Ok(())
    }

    pub fn metrics(&self) -> AbrResult<SessionMetrics> {
        let now = time::now();
        let bandwidth = self.shared.network.estimate_kbps(now);
        self.shared.with_session(|s| Ok(s.metrics(bandwidth, now)))
    }

    pub fn current_quality(&self) -> AbrResult<QualityId> {
        self.shared.with_session(|s| Ok(s.current().clone()))
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Destroyed)
    }

    /// End the session. Idempotent.
    ///
    /// The evaluation loop, the event listener and every pending engine
    /// switch are stopped before this returns, so the engine sees no calls
    /// afterwards. The session summary goes to analytics and out as
    /// [`AbrEvent::SessionEnded`] exactly once; destroying a manager that
    /// was never initialized emits nothing.
    pub async fn destroy(&self) {
        let now = time::now();
        let session = match mem::replace(&mut *self.shared.state.lock(), State::Destroyed) {
            State::Active(session) => Some(session),
            State::Idle | State::Destroyed => None,
        };

        self.shared.stop_tasks().join().await;

        let Some(session) = session else {
            trace!("ABR manager already destroyed or never initialized");
            return;
        };

        let summary = session.summary(now);
        info!(
            video_id = %summary.video_id,
            switches = summary.quality_switch_count,
            buffering_events = summary.buffering_event_count,
            average_kbps = summary.average_quality_bitrate_kbps,
            duration = ?summary.session_duration,
            "ABR session ended"
        );
        self.shared.analytics.record_session(summary.clone());
        self.shared.bus.publish(AbrEvent::SessionEnded { summary });
    }
}

impl<E, A> Shared<E, A>
where
    E: PlaybackEngine,
    A: AnalyticsSink,
{
    fn with_session<R>(&self, f: impl FnOnce(&mut AbrSession) -> AbrResult<R>) -> AbrResult<R> {
        match &mut *self.state.lock() {
            State::Idle => Err(AbrError::NotInitialized),
            State::Active(session) => f(session),
            State::Destroyed => Err(AbrError::Destroyed),
        }
    }

    fn publish_if_active(&self, event: AbrEvent) {
        if matches!(*self.state.lock(), State::Active(_)) {
            self.bus.publish(event);
        }
    }

    fn start_tasks(self: &Arc<Self>, runtime: &Handle) {
        let listener = self.spawn_listener(runtime);
        let weak = Arc::downgrade(self);
        let ticker = Ticker::start(runtime, self.options.tick_interval, move || {
            match weak.upgrade() {
                Some(shared) => {
                    shared.tick();
                    ControlFlow::Continue(())
                }
                None => ControlFlow::Break(()),
            }
        });

        let mut tasks = self.tasks.lock();
        if tasks.closed {
            // Destroyed while initializing.
            ticker.stop();
            listener.abort();
            return;
        }
        tasks.runtime = Some(runtime.clone());
        tasks.ticker = Some(ticker);
        tasks.listener = Some(listener);
    }

    /// Stop the loop, the listener and pending switches.
    fn stop_tasks(&self) -> Stopped {
        self.cancel.cancel();
        let mut tasks = self.tasks.lock();
        tasks.closed = true;
        if let Some(ticker) = tasks.ticker.take() {
            ticker.stop();
        }
        let listener = tasks.listener.take();
        if let Some(listener) = &listener {
            listener.abort();
        }
        let mut switches = mem::take(&mut tasks.switches);
        switches.abort_all();
        Stopped { listener, switches }
    }

    fn spawn_listener(self: &Arc<Self>, runtime: &Handle) -> JoinHandle<()> {
        let mut rx = self.engine.subscribe();
        let weak: Weak<Self> = Arc::downgrade(self);
        let cancel = self.cancel.clone();

        runtime.spawn(async move {
            loop {
                let received = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    received = rx.recv() => received,
                };
                match received {
                    Ok(event) => {
                        let Some(shared) = weak.upgrade() else {
                            break;
                        };
                        shared.on_playback_event(event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "playback event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            trace!("playback event listener finished");
        })
    }

    fn on_playback_event(&self, event: PlaybackEvent) {
        let counted = match &mut *self.state.lock() {
            State::Active(session) => session.observe(&event),
            State::Idle | State::Destroyed => return,
        };

        self.bus.publish(event);
        if let Some((pending, total)) = counted {
            info!(pending, total, "buffering detected");
            self.bus
                .publish(AbrEvent::BufferingDetected { pending, total });
        }
    }

    fn tick(self: &Arc<Self>) {
        let now = time::now();
        let ticket = {
            let mut state = self.state.lock();
            let State::Active(session) = &mut *state else {
                return;
            };
            if !session.is_auto() {
                trace!("auto quality off, skipping evaluation");
                return;
            }

            let sample = match BufferMonitor::new(&*self.engine).sample() {
                Ok(sample) => Some(sample),
                Err(error) => {
                    warn!(%error, "buffer read failed, using last known state");
                    None
                }
            };
            let Some(buffer) = session.buffer_or_last(sample) else {
                debug!("no buffer state yet, skipping evaluation");
                return;
            };

            let bandwidth = self.network.estimate_kbps(now);
            if bandwidth.is_none() {
                debug!(video_id = session.video_id(), "no bandwidth samples in window");
            }
            session.evaluate(buffer, bandwidth, now)
        };

        if let Some(ticket) = ticket {
            debug!(target = %ticket.target, cause = ?ticket.cause, "issuing quality switch");
            self.spawn_switch(ticket);
        }
    }

    /// Publish a switch that was committed on the spot and tell the engine.
    fn issue_immediate(self: &Arc<Self>, switch: ImmediateSwitch) {
        let ImmediateSwitch { from, ticket } = switch;
        info!(%from, to = %ticket.target, cause = ?ticket.cause, "quality switched");
        self.bus.publish(AbrEvent::QualitySwitched {
            from,
            to: ticket.target.clone(),
            cause: ticket.cause,
        });
        self.spawn_switch(ticket);
    }

    fn spawn_switch(self: &Arc<Self>, ticket: SwitchTicket) {
        let mut tasks = self.tasks.lock();
        if tasks.closed {
            trace!(target = %ticket.target, "manager closed, dropping quality switch");
            return;
        }
        let Some(runtime) = tasks.runtime.clone() else {
            warn!(target = %ticket.target, "no runtime for quality switch");
            return;
        };
        while let Some(result) = tasks.switches.try_join_next() {
            log_join_error("quality switch", result);
        }

        let shared = Arc::clone(self);
        tasks.switches.spawn_on(
            async move {
                match shared.switch_unless_cancelled(&ticket.target).await {
                    Some(result) => shared.finish_switch(&ticket, result),
                    None => trace!(target = %ticket.target, "quality switch cancelled"),
                }
            },
            &runtime,
        );
    }

    /// Run the engine switch unless the manager is torn down first.
    async fn switch_unless_cancelled(
        &self,
        target: &QualityId,
    ) -> Option<Result<(), PlaybackError>> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            result = self.switch_engine(target) => Some(result),
        }
    }

    async fn switch_engine(&self, target: &QualityId) -> Result<(), PlaybackError> {
        let timeout = self.options.switch_timeout;
        match tokio::time::timeout(timeout, self.engine.switch_to(target.clone())).await {
            Ok(result) => result,
            Err(_) => Err(PlaybackError::SwitchTimedOut {
                quality: target.clone(),
                timeout,
            }),
        }
    }

    fn finish_switch(&self, ticket: &SwitchTicket, result: Result<(), PlaybackError>) {
        let now = time::now();
        let mut state = self.state.lock();
        let State::Active(session) = &mut *state else {
            trace!(target = %ticket.target, "session gone, dropping switch result");
            return;
        };

        match result {
            Ok(()) => {
                let committed = session.commit(ticket, now);
                drop(state);
                match committed {
                    Some(from) => {
                        info!(%from, to = %ticket.target, cause = ?ticket.cause, "quality switched");
                        self.bus.publish(AbrEvent::QualitySwitched {
                            from,
                            to: ticket.target.clone(),
                            cause: ticket.cause,
                        });
                    }
                    None if ticket.generation.is_some() => {
                        debug!(target = %ticket.target, "superseded switch completed, discarded");
                    }
                    None => trace!(target = %ticket.target, "engine confirmed switch"),
                }
            }
            Err(error) => {
                session.abandon(ticket);
                drop(state);
                warn!(
                    %error,
                    target = %ticket.target,
                    cause = ?ticket.cause,
                    "quality switch failed, keeping current quality"
                );
                self.bus.publish(AbrEvent::SwitchFailed {
                    target: ticket.target.clone(),
                    cause: ticket.cause,
                    error: error.to_string(),
                });
            }
        }
    }
}

impl<E, A> Drop for Shared<E, A> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<E, A> std::fmt::Debug for AbrManager<E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.shared.state.lock() {
            State::Idle => "idle",
            State::Active(_) => "active",
            State::Destroyed => "destroyed",
        };
        f.debug_struct("AbrManager")
            .field("state", &state)
            .field("options", &self.shared.options)
            .finish_non_exhaustive()
    }
}
