use std::{ops::ControlFlow, time::Duration};

use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::Mutex;

/// Periodic callback running on a tokio runtime.
///
/// The first tick fires one `period` after [`Ticker::start`]. Ticks that
/// would overlap a slow callback are delayed, never bunched up.
///
/// [`Ticker::stop`] is synchronous: once it returns the task has been
/// cancelled and aborted, and the callback is not entered again.
pub struct Ticker {
    cancel: CancellationToken,
    period: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    /// Start ticking on `runtime`.
    ///
    /// Returning [`ControlFlow::Break`] from `tick` ends the loop.
    pub fn start<F>(runtime: &Handle, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        if token.is_cancelled() || tick().is_break() {
                            break;
                        }
                    }
                }
            }
            trace!(?period, "Ticker: loop finished");
        });

        Self {
            cancel,
            period,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop ticking. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("period", &self.period)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
