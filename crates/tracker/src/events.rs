//! Lifecycle events emitted by the request tracker.
//!
//! Published on a [`tokio::sync::broadcast`] channel. Call
//! [`RequestTracker::subscribe`](crate::RequestTracker::subscribe) to
//! receive them; they are independent of observer notifications.

use jobwatch_core::status::JobStatus;
use jobwatch_core::types::{JobId, RequestId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TrackerEvent {
    /// A new tracking entry was created.
    Registered { request_id: RequestId, job_id: JobId },

    /// Another observer joined an already-tracked request.
    ObserverAdded {
        request_id: RequestId,
        /// Observer count after the addition.
        observers: usize,
    },

    /// A status query was armed.
    PollScheduled { request_id: RequestId, delay_ms: u64 },

    /// A status query completed and its update was fanned out.
    Polled {
        request_id: RequestId,
        status: JobStatus,
        progress: f64,
    },

    /// The entry was removed after a terminal status.
    Retired {
        request_id: RequestId,
        status: JobStatus,
    },

    /// The entry was removed by an explicit cancellation.
    Cancelled { request_id: RequestId },
}
