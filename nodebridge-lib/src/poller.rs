//! Payment outcome polling.
//!
//! Backends accept a payment and hand back a reference id; the outcome has to
//! be fetched afterwards. The poller turns that into a bounded, cancellable
//! wait for a terminal status.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::PollConfig;
use crate::models::{PayOutcome, PaymentState};
use crate::Result;

/// Source of payment status records, implemented by each dialect.
#[async_trait]
pub trait PaymentStatusSource: Send + Sync {
    /// State of the payment, or `None` while the backend has no record yet.
    async fn payment_state(&self, reference: &str) -> Result<Option<PaymentState>>;
}

/// How a poll ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollResult {
    /// The backend reported a terminal status.
    Settled(PayOutcome),
    /// The caller cancelled; the outcome is unknown.
    Cancelled,
    /// The query ceiling was reached; the outcome is unknown.
    GaveUp {
        /// Status queries made
        attempts: u32,
    },
}

/// Fires a [`CancelToken`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to every token cloned from this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cooperative cancellation signal.
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Create a linked handle and token.
    pub fn pair() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Self { rx })
    }

    /// A token that never fires.
    pub fn never() -> Self {
        Self::pair().1
    }

    /// Returns true once cancellation was signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve when cancellation is signalled; pending forever otherwise.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `delay`. Returns true if cancelled first.
    pub async fn sleep(&mut self, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => false,
            _ = self.cancelled() => true,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

/// Poll `source` until the payment reaches a terminal status.
///
/// - no record yet: wait `empty_interval`, query again
/// - pending (or unrecognized): wait `pending_interval`, query again
/// - succeeded / failed: settled
/// - any query error: settled as `CouldNotFindRoute`, no retry at this layer
///
/// Cancellation also interrupts an in-flight status query, including any
/// transport backoff inside it.
pub async fn poll_payment<S>(
    source: &S,
    reference: &str,
    config: &PollConfig,
    cancel: &CancelToken,
) -> PollResult
where
    S: PaymentStatusSource + ?Sized,
{
    let mut cancel = cancel.clone();
    let mut attempts = 0u32;

    while !cancel.is_cancelled() {
        if let Some(max) = config.max_attempts {
            if attempts >= max {
                tracing::warn!("payment {} unresolved after {} polls", reference, attempts);
                return PollResult::GaveUp { attempts };
            }
        }
        attempts += 1;

        let state = tokio::select! {
            state = source.payment_state(reference) => state,
            _ = cancel.cancelled() => break,
        };

        let delay = match state {
            Ok(None) => config.empty_interval(),
            Ok(Some(PaymentState::Pending)) => config.pending_interval(),
            Ok(Some(PaymentState::Succeeded)) => return PollResult::Settled(PayOutcome::Ok),
            Ok(Some(PaymentState::Failed)) => {
                return PollResult::Settled(PayOutcome::CouldNotFindRoute)
            }
            Ok(Some(PaymentState::Unknown(raw))) => {
                tracing::debug!("payment {} in unrecognized state {}", reference, raw);
                config.pending_interval()
            }
            Err(err) => {
                tracing::warn!("payment {} status query failed: {}", reference, err);
                return PollResult::Settled(PayOutcome::CouldNotFindRoute);
            }
        };

        if cancel.sleep(delay).await {
            break;
        }
    }

    tracing::debug!("payment {} polling cancelled", reference);
    PollResult::Cancelled
}
