//! Poller: a repeating status check bound to a cancellable handle.
//!
//! `start` runs the check immediately, then once per interval, until the check
//! reports a terminal step, the check fails, or the handle is stopped or dropped.
//! Ticks inside one session never overlap: a slow check delays the next tick.
//! A check still in flight when the session is cancelled is dropped, so its
//! result can never reach the caller's state.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// What a single check tells the poller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Continue,
    Done,
}

/// Owner of one poll session. Dropping it stops the session.
#[derive(Debug)]
pub struct PollHandle {
    name: String,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Cancels future ticks. Safe to call any number of times.
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            debug!(session = %self.name, "stopping poll session");
            self.token.cancel();
        }
    }

    /// False once the session reached a terminal step, failed, or was stopped.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Waits for the session task to wind down.
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(session = %self.name, "poll session task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Starts a poll session on the current tokio runtime.
pub fn start<F, Fut, E>(name: impl Into<String>, interval: Duration, mut check: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<PollStep, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let name = name.into();
    let token = CancellationToken::new();
    let session = token.clone();
    let task_name = name.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = session.cancelled() => return,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = session.cancelled() => {
                    debug!(session = %task_name, "discarding in-flight check after cancellation");
                    return;
                }
                outcome = check() => outcome,
            };

            match outcome {
                Ok(PollStep::Continue) => {}
                Ok(PollStep::Done) => {
                    debug!(session = %task_name, "poll session reached a terminal state");
                    break;
                }
                Err(e) => {
                    warn!(session = %task_name, "status check failed, stopping poll session: {e}");
                    break;
                }
            }
        }

        session.cancel();
    });

    PollHandle {
        name,
        token,
        task: Some(task),
    }
}
