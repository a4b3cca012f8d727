use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::{ErrorInfo, SokoError};
use crate::types::{EntityId, PaymentRecord, PaymentStatus};

/// Anything that can report the current state of a payment.
#[async_trait]
pub trait PaymentStatusSource: Send + Sync {
    async fn payment_status(&self, payment_id: &EntityId) -> Result<PaymentRecord, SokoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before the first check and between checks.
    pub interval: Duration,
    /// Stop after this many checks. `None` polls until a terminal status.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Progress reported while a poll is running.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// A check returned a non-terminal status.
    Pending { attempt: u32, record: PaymentRecord },
    /// A check failed; polling continues.
    Failed {
        attempt: u32,
        error: ErrorInfo,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(PaymentRecord),
    Failed(PaymentRecord),
    /// `max_attempts` checks ran without a terminal status.
    Exhausted { attempts: u32 },
    Cancelled,
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Repeatedly verifies a payment until it settles.
#[derive(Clone)]
pub struct PaymentPoller {
    source: Arc<dyn PaymentStatusSource>,
    policy: PollPolicy,
}

impl PaymentPoller {
    pub fn new(source: Arc<dyn PaymentStatusSource>, policy: PollPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Poll in the current task until a terminal status, exhaustion, or
    /// cancellation. The first check happens one interval after the call.
    pub async fn run(
        &self,
        payment_id: &EntityId,
        cancel: CancellationToken,
        events: Option<mpsc::UnboundedSender<PollEvent>>,
    ) -> PollOutcome {
        let interval = self.policy.interval;
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let emit = |event: PollEvent| {
            if let Some(tx) = &events {
                let _ = tx.send(event);
            }
        };

        let mut attempt = 0u32;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = ticker.tick() => {}
            }

            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                result = self.source.payment_status(payment_id) => result,
            };

            match result {
                Ok(record) => match record.status {
                    PaymentStatus::Completed => {
                        info!(payment_id = %payment_id, attempt, "Payment completed");
                        return PollOutcome::Completed(record);
                    }
                    PaymentStatus::Failed => {
                        info!(payment_id = %payment_id, attempt, "Payment failed");
                        return PollOutcome::Failed(record);
                    }
                    status => {
                        debug!(payment_id = %payment_id, attempt, %status, "Payment still pending");
                        emit(PollEvent::Pending { attempt, record });
                    }
                },
                Err(err) => {
                    warn!(payment_id = %payment_id, attempt, error = %err, "Payment status check failed");
                    emit(PollEvent::Failed {
                        attempt,
                        message: err.display_message(),
                        error: ErrorInfo::from(&err),
                    });
                }
            }

            if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                return PollOutcome::Exhausted { attempts: attempt };
            }
        }
    }

    /// Poll on a background task. Dropping the handle stops polling.
    pub fn spawn(&self, payment_id: EntityId) -> PollHandle {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { poller.run(&payment_id, token, Some(tx)).await });
        PollHandle {
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
            task,
            events: rx,
        }
    }
}

/// Owner of a background poll.
pub struct PollHandle {
    cancel: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<PollOutcome>,
    events: mpsc::UnboundedReceiver<PollEvent>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Next progress event; `None` once the poll has ended.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Wait for the poll to end.
    pub async fn outcome(self) -> PollOutcome {
        let Self { _guard, task, .. } = self;
        task.await.unwrap_or(PollOutcome::Cancelled)
    }
}
