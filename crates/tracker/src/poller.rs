//! Timer-driven status polling.
//!
//! Every tracked request owns exactly one [`PollHandle`]: a spawned task
//! that sleeps for the scheduled delay, runs one status query against the
//! owning backend, and hands the result to the dispatcher. Rescheduling
//! always replaces the previous handle, so two live timers for one request
//! cannot exist.
//!
//! Each handle carries a ticket. A query whose ticket no longer matches
//! the entry (cancelled, retired, or re-registered in the meantime) is
//! discarded without notifying anyone.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use jobwatch_backend::{BackendError, JobBackend};
use jobwatch_core::polling::{QUEUED_POLL_INTERVAL_SECS, STARTED_POLL_INTERVAL_SECS};
use jobwatch_core::status::{JobStatus, StatusReport};
use jobwatch_core::types::RequestId;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::{dispatch, Dispatch, NextPoll};
use crate::events::TrackerEvent;
use crate::observer::fan_out;
use crate::registry::{PollHandle, PollPhase};
use crate::tracker::TrackerInner;

/// Adaptive polling intervals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay before re-polling a request that is still queued.
    pub queued_interval: Duration,
    /// Delay before re-polling a request that has started.
    pub started_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            queued_interval: Duration::from_secs(QUEUED_POLL_INTERVAL_SECS),
            started_interval: Duration::from_secs(STARTED_POLL_INTERVAL_SECS),
        }
    }
}

impl PollConfig {
    /// Delay until the next poll after observing `status`, or `None` for
    /// terminal statuses.
    pub fn interval_for(&self, status: JobStatus) -> Option<Duration> {
        match status {
            JobStatus::Queued => Some(self.queued_interval),
            JobStatus::Started => Some(self.started_interval),
            JobStatus::Finished | JobStatus::Failed | JobStatus::Unknown => None,
        }
    }
}

impl TrackerInner {
    /// Arm a one-shot status query for `request_id` after `delay`.
    ///
    /// Must be called with the registry lock held, and the returned handle
    /// stored in the entry before the lock is released.
    pub(crate) fn schedule_fetch(
        self: &Arc<Self>,
        request_id: &RequestId,
        backend: Arc<dyn JobBackend>,
        delay: Duration,
    ) -> PollHandle {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancel = self.shutdown.child_token();
        let delay_ms = delay.as_millis() as u64;

        let task = tokio::spawn(run_poll(
            Arc::clone(self),
            request_id.clone(),
            backend,
            ticket,
            delay,
            cancel.clone(),
        ));

        tracing::debug!(request_id = %request_id, ticket, delay_ms, "Status poll scheduled");
        let _ = self.event_tx.send(TrackerEvent::PollScheduled {
            request_id: request_id.clone(),
            delay_ms,
        });

        PollHandle {
            ticket,
            phase: PollPhase::Armed,
            cancel,
            task,
        }
    }

    /// The timer fired: clear it and mark the query as in flight.
    ///
    /// Returns `false` if the ticket is stale.
    async fn begin_fetch(&self, request_id: &RequestId, ticket: u64) -> bool {
        let mut registry = self.registry.lock().await;
        match registry.get_mut(request_id) {
            Some(entry) if entry.poll.ticket == ticket => {
                entry.poll.phase = PollPhase::Fetching;
                true
            }
            _ => false,
        }
    }

    /// Route a finished status query through the dispatcher.
    ///
    /// The fan-out, the retirement, and the next schedule all happen under
    /// one registry lock, so a concurrent cancel is ordered entirely before
    /// or entirely after this poll.
    async fn complete_fetch(
        self: &Arc<Self>,
        request_id: &RequestId,
        ticket: u64,
        result: Result<StatusReport, BackendError>,
    ) {
        let mut registry = self.registry.lock().await;
        let Some(entry) = registry.get_mut(request_id) else {
            tracing::debug!(request_id = %request_id, ticket, "Discarding status for untracked request");
            return;
        };
        if entry.poll.ticket != ticket {
            tracing::debug!(request_id = %request_id, ticket, "Discarding stale status");
            return;
        }

        if let Err(e) = &result {
            tracing::warn!(
                request_id = %request_id,
                job_id = %entry.job_id,
                error = %e,
                "Status query failed, giving up on request",
            );
        }

        let Dispatch { update, next } = dispatch(result, &self.config);
        let observers = entry.observers.clone();

        tracing::debug!(
            request_id = %request_id,
            status = %update.status,
            progress = update.progress,
            observers = observers.len(),
            "Status polled",
        );
        fan_out(request_id, &observers, &update);
        let _ = self.event_tx.send(TrackerEvent::Polled {
            request_id: request_id.clone(),
            status: update.status,
            progress: update.progress,
        });

        match next {
            NextPoll::After(delay) => {
                let poll = self.schedule_fetch(request_id, Arc::clone(&entry.backend), delay);
                entry.replace_poll(poll);
            }
            NextPoll::Retire => {
                registry.remove(request_id);
                tracing::info!(request_id = %request_id, status = %update.status, "Request retired");
                let _ = self.event_tx.send(TrackerEvent::Retired {
                    request_id: request_id.clone(),
                    status: update.status,
                });
            }
        }
    }
}

/// Body of one scheduled poll task.
async fn run_poll(
    inner: Arc<TrackerInner>,
    request_id: RequestId,
    backend: Arc<dyn JobBackend>,
    ticket: u64,
    delay: Duration,
    cancel: CancellationToken,
) {
    if !delay.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    if !inner.begin_fetch(&request_id, ticket).await {
        return;
    }

    let result = tokio::select! {
        _ = cancel.cancelled() => return,
        result = backend.status(&request_id) => result,
    };

    inner.complete_fetch(&request_id, ticket, result).await;
}
