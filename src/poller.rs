use std::future::Future;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Called after every delivered result, typically `ctx.request_repaint()`.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// Retry schedule for a single poll: up to `retries` extra attempts, waiting
/// 1s, 2s, 4s, ... (capped at 30s) before each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
}

impl RetryPolicy {
    const BASE_MS: u64 = 1_000;
    const MAX_MS: u64 = 30_000;

    pub fn delay(&self, attempt: u32) -> Duration {
        let ms = Self::BASE_MS.saturating_mul(1u64 << attempt.min(16));
        Duration::from_millis(ms.min(Self::MAX_MS))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 3 }
    }
}

/// Background loop that runs `fetch` now and then once per interval.
///
/// A poll (including its retries) finishes before the next one starts, so
/// results arrive in issue order and the newest one always wins. Dropping the
/// poller aborts the loop.
pub struct Poller<T> {
    label: &'static str,
    receiver: Receiver<Result<T, FetchError>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Poller<T> {
    pub fn spawn<F, Fut>(
        runtime: &Handle,
        label: &'static str,
        interval: Duration,
        retry: RetryPolicy,
        notify: Notify,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let (tx, receiver) = mpsc::channel();

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let mut attempt = 0;
                let result = loop {
                    match fetch().await {
                        Ok(value) => break Ok(value),
                        Err(err) if attempt < retry.retries => {
                            let delay = retry.delay(attempt);
                            debug!(poller = label, attempt, ?delay, error = %err, "retrying");
                            attempt += 1;
                            tokio::time::sleep(delay).await;
                        }
                        Err(err) => break Err(err),
                    }
                };

                if let Err(err) = &result {
                    warn!(poller = label, url = err.url(), error = %err, "poll failed");
                }

                if tx.send(result).is_err() {
                    // Owner is gone
                    break;
                }
                notify();
            }
        });

        Self {
            label,
            receiver,
            task,
        }
    }

    /// Latest result delivered since the last call, if any. Older undrained
    /// results are superseded and dropped.
    pub fn latest(&self) -> Option<Result<T, FetchError>> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(result) => latest = Some(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_none() && !self.task.is_finished() {
                        warn!(poller = self.label, "result channel closed");
                    }
                    break;
                }
            }
        }
        latest
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
