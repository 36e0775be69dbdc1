//! Single-resolution request/response exchange.
//!
//! A pending operation (for example waiting on an interactive sign-in) is
//! settled by exactly one of success, failure or cancellation, whichever comes
//! first; later attempts are ignored. The waiting side also gives up after a
//! deadline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome<T> {
    Resolved(T),
    Failed(String),
    Cancelled,
    TimedOut,
}

/// Settling side. Cheap to clone; every clone races for the same slot.
#[derive(Debug)]
pub struct Resolver<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<ExchangeOutcome<T>>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Resolver<T> {
    /// Returns false when the exchange was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(ExchangeOutcome::Resolved(value))
    }

    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.settle(ExchangeOutcome::Failed(reason.into()))
    }

    pub fn cancel(&self) -> bool {
        self.settle(ExchangeOutcome::Cancelled)
    }

    pub fn is_settled(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }

    fn settle(&self, outcome: ExchangeOutcome<T>) -> bool {
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        match sender {
            Some(sender) => sender.send(outcome).is_ok(),
            None => {
                debug!("exchange already settled, ignoring late outcome");
                false
            }
        }
    }
}

/// Waiting side of the exchange.
#[derive(Debug)]
pub struct PendingExchange<T> {
    rx: oneshot::Receiver<ExchangeOutcome<T>>,
}

impl<T> PendingExchange<T> {
    /// Dropping every resolver without settling counts as cancellation.
    pub async fn wait(self, timeout: Duration) -> ExchangeOutcome<T> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => ExchangeOutcome::Cancelled,
            Err(_) => ExchangeOutcome::TimedOut,
        }
    }
}

pub fn exchange<T>() -> (Resolver<T>, PendingExchange<T>) {
    let (tx, rx) = oneshot::channel();
    (
        Resolver {
            slot: Arc::new(Mutex::new(Some(tx))),
        },
        PendingExchange { rx },
    )
}
