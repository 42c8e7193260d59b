//! Observer callbacks for tracked requests.
//!
//! Observers are invoked synchronously while the tracker holds its
//! registry lock, so they must return quickly and must not block. Anything
//! slow belongs behind a channel; see [`channel`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use jobwatch_core::status::StatusUpdate;
use jobwatch_core::types::RequestId;
use tokio::sync::mpsc;

/// Receives every status update for the request it was registered on.
pub trait Observer: Send + Sync {
    fn notify(&self, update: &StatusUpdate);
}

impl<F> Observer for F
where
    F: Fn(&StatusUpdate) + Send + Sync,
{
    fn notify(&self, update: &StatusUpdate) {
        self(update)
    }
}

/// An observer that forwards every update into `tx`.
pub fn channel(tx: mpsc::UnboundedSender<StatusUpdate>) -> Arc<dyn Observer> {
    Arc::new(move |update: &StatusUpdate| {
        // A dropped receiver only means nobody is listening anymore.
        let _ = tx.send(update.clone());
    })
}

/// Deliver `update` to each observer in order.
///
/// `observers` is a snapshot taken by the caller. A panicking observer is
/// logged and skipped; the remaining observers still run.
pub(crate) fn fan_out(request_id: &RequestId, observers: &[Arc<dyn Observer>], update: &StatusUpdate) {
    for (index, observer) in observers.iter().enumerate() {
        let delivered = catch_unwind(AssertUnwindSafe(|| observer.notify(update)));
        if delivered.is_err() {
            tracing::error!(
                request_id = %request_id,
                observer = index,
                status = %update.status,
                "Observer panicked during notification",
            );
        }
    }
}
