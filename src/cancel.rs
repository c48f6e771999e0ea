//! Cooperative cancellation shared between the controller and compile tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Marker returned by work that stopped because its [`CancelSignal`] fired.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct Shared {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Owner side of a cancellation pair. Dropping it does not cancel.
#[derive(Debug, Default)]
pub struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    /// Fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer handle to hand to a worker.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        if !self.shared.cancelled.swap(true, Ordering::AcqRel) {
            self.shared.notify.notify_waiters();
        }
    }

    /// `true` once [`CancelToken::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }
}

/// Observer side of a cancellation pair.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    shared: Arc<Shared>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    /// `true` once the owning token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the owning token was cancelled.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve when the owning token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.shared.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/cancel.rs"]
mod tests;
