//! In-memory table of tracked requests.
//!
//! Pure bookkeeping: the tracker owns a single [`Registry`] behind its
//! mutex and is the only code that mutates it.

use std::collections::HashMap;
use std::sync::Arc;

use jobwatch_backend::JobBackend;
use jobwatch_core::types::{JobId, RequestId};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::observer::Observer;

/// Where the single scheduled status query of an entry currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollPhase {
    /// The timer is armed and has not fired yet.
    Armed,
    /// The timer fired and the status query is in flight.
    Fetching,
}

/// Ownership handle of the one status query scheduled for an entry.
pub(crate) struct PollHandle {
    /// Identifies this query; results carrying another ticket are stale.
    pub(crate) ticket: u64,
    pub(crate) phase: PollPhase,
    pub(crate) cancel: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the timer, or abandon the in-flight query.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// One in-flight remote job and everyone waiting on it.
pub(crate) struct TrackedRequest {
    pub(crate) request_id: RequestId,
    pub(crate) job_id: JobId,
    pub(crate) backend: Arc<dyn JobBackend>,
    /// Never empty. Insertion order is notification order.
    pub(crate) observers: Vec<Arc<dyn Observer>>,
    pub(crate) poll: PollHandle,
}

impl TrackedRequest {
    pub(crate) fn new(
        request_id: RequestId,
        job_id: JobId,
        backend: Arc<dyn JobBackend>,
        observer: Arc<dyn Observer>,
        poll: PollHandle,
    ) -> Self {
        Self {
            request_id,
            job_id,
            backend,
            observers: vec![observer],
            poll,
        }
    }

    /// The armed timer, if the query has not started yet.
    pub(crate) fn pending_timer(&self) -> Option<&PollHandle> {
        (self.poll.phase == PollPhase::Armed).then_some(&self.poll)
    }

    /// Replace the scheduled query, cancelling the previous one first.
    pub(crate) fn replace_poll(&mut self, poll: PollHandle) {
        self.poll.cancel();
        self.poll = poll;
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: HashMap<RequestId, TrackedRequest>,
}

impl Registry {
    pub(crate) fn get(&self, request_id: &RequestId) -> Option<&TrackedRequest> {
        self.entries.get(request_id)
    }

    pub(crate) fn get_mut(&mut self, request_id: &RequestId) -> Option<&mut TrackedRequest> {
        self.entries.get_mut(request_id)
    }

    /// Insert a new entry. An existing entry for the same id is replaced
    /// and returned so the caller can stop its poll.
    pub(crate) fn insert(&mut self, entry: TrackedRequest) -> Option<TrackedRequest> {
        self.entries.insert(entry.request_id.clone(), entry)
    }

    pub(crate) fn remove(&mut self, request_id: &RequestId) -> Option<TrackedRequest> {
        self.entries.remove(request_id)
    }

    pub(crate) fn contains(&self, request_id: &RequestId) -> bool {
        self.entries.contains_key(request_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = TrackedRequest> + '_ {
        self.entries.drain().map(|(_, entry)| entry)
    }
}
