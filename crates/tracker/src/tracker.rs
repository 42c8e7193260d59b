//! The request tracker: registration, cancellation, and shutdown.
//!
//! [`RequestTracker`] is created once and cloned freely; all clones share
//! one registry. Every mutation of the registry (registration, dispatch,
//! cancellation, shutdown) happens under the same [`Mutex`].

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use jobwatch_backend::BackendResolver;
use jobwatch_core::polling::FIRST_POLL_DELAY_MS;
use jobwatch_core::types::{JobId, RequestId};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::TrackerError;
use crate::events::TrackerEvent;
use crate::observer::Observer;
use crate::poller::PollConfig;
use crate::registry::{PollPhase, Registry, TrackedRequest};

/// Broadcast channel capacity for tracker events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long [`RequestTracker::shutdown`] waits for poll tasks to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracks submitted requests until they reach a terminal state.
#[derive(Clone)]
pub struct RequestTracker {
    inner: Arc<TrackerInner>,
}

/// State shared between the tracker handles and their poll tasks.
pub(crate) struct TrackerInner {
    pub(crate) registry: Mutex<Registry>,
    resolver: Arc<dyn BackendResolver>,
    pub(crate) config: PollConfig,
    pub(crate) event_tx: broadcast::Sender<TrackerEvent>,
    /// Master token; every poll token is a child of it.
    pub(crate) shutdown: CancellationToken,
    pub(crate) next_ticket: AtomicU64,
}

/// Point-in-time view of one tracked request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedSnapshot {
    pub job_id: JobId,
    pub observers: usize,
    /// A timer is armed and waiting to fire.
    pub timer_armed: bool,
    /// A status query is running right now.
    pub fetch_in_flight: bool,
}

impl RequestTracker {
    /// Create a tracker that resolves backends through `resolver`.
    pub fn new(resolver: Arc<dyn BackendResolver>, config: PollConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(TrackerInner {
                registry: Mutex::new(Registry::default()),
                resolver,
                config,
                event_tx,
                shutdown: CancellationToken::new(),
                next_ticket: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribe to tracker lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn config(&self) -> &PollConfig {
        &self.inner.config
    }

    /// Register `observer` for updates on `request_id`.
    ///
    /// The first observer of a request creates its tracking entry and
    /// triggers an immediate status query. Later observers join the
    /// existing entry and wait for its next natural poll.
    pub async fn listen(
        &self,
        request_id: RequestId,
        job_id: JobId,
        observer: Arc<dyn Observer>,
    ) -> Result<(), TrackerError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(TrackerError::ShutDown);
        }

        let backend = self
            .inner
            .resolver
            .resolve(&job_id)
            .await
            .ok_or_else(|| TrackerError::job_not_found(&job_id))?;

        let mut registry = self.inner.registry.lock().await;
        // Shutdown may have drained the registry while the backend resolved.
        if self.inner.shutdown.is_cancelled() {
            return Err(TrackerError::ShutDown);
        }

        if let Some(entry) = registry.get_mut(&request_id) {
            if entry.job_id != job_id {
                tracing::debug!(
                    request_id = %request_id,
                    tracked_job_id = %entry.job_id,
                    job_id = %job_id,
                    "Observer joined request tracked under another job id",
                );
            }
            entry.observers.push(observer);
            let observers = entry.observers.len();
            tracing::debug!(request_id = %request_id, observers, "Observer added");
            let _ = self.inner.event_tx.send(TrackerEvent::ObserverAdded {
                request_id,
                observers,
            });
            return Ok(());
        }

        let poll = self.inner.schedule_fetch(
            &request_id,
            Arc::clone(&backend),
            Duration::from_millis(FIRST_POLL_DELAY_MS),
        );
        registry.insert(TrackedRequest::new(
            request_id.clone(),
            job_id.clone(),
            backend,
            observer,
            poll,
        ));

        tracing::info!(request_id = %request_id, job_id = %job_id, "Tracking request");
        let _ = self
            .inner
            .event_tx
            .send(TrackerEvent::Registered { request_id, job_id });
        Ok(())
    }

    /// Stop tracking `request_id` and ask its backend to cancel it.
    ///
    /// Fails with `NotFound` before touching any state when no backend
    /// resolves for `job_id`. Once this returns, no observer of the request
    /// is notified again, even if a status query was in flight.
    pub async fn cancel(&self, request_id: &RequestId, job_id: &JobId) -> Result<(), TrackerError> {
        let backend = self
            .inner
            .resolver
            .resolve(job_id)
            .await
            .ok_or_else(|| TrackerError::job_not_found(job_id))?;

        let removed = self.inner.registry.lock().await.remove(request_id);
        if let Some(entry) = removed {
            entry.poll.cancel();
            tracing::info!(
                request_id = %request_id,
                observers = entry.observers.len(),
                "Stopped tracking cancelled request",
            );
            let _ = self.inner.event_tx.send(TrackerEvent::Cancelled {
                request_id: request_id.clone(),
            });
        }

        backend.cancel(request_id).await.map_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Backend cancellation failed");
            TrackerError::CancelFailed {
                request_id: request_id.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(request_id = %request_id, job_id = %job_id, "Request cancelled");
        Ok(())
    }

    pub async fn is_tracked(&self, request_id: &RequestId) -> bool {
        self.inner.registry.lock().await.contains(request_id)
    }

    pub async fn tracked_count(&self) -> usize {
        self.inner.registry.lock().await.len()
    }

    /// Observers registered for `request_id`, zero when untracked.
    pub async fn observer_count(&self, request_id: &RequestId) -> usize {
        self.inner
            .registry
            .lock()
            .await
            .get(request_id)
            .map_or(0, |entry| entry.observers.len())
    }

    pub async fn snapshot(&self, request_id: &RequestId) -> Option<TrackedSnapshot> {
        let registry = self.inner.registry.lock().await;
        registry.get(request_id).map(|entry| TrackedSnapshot {
            job_id: entry.job_id.clone(),
            observers: entry.observers.len(),
            timer_armed: entry.pending_timer().is_some(),
            fetch_in_flight: entry.poll.phase == PollPhase::Fetching,
        })
    }

    /// Stop every poll and forget every tracked request.
    ///
    /// Observers are not notified. Later registrations fail with
    /// [`TrackerError::ShutDown`].
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down request tracker");
        self.inner.shutdown.cancel();

        let tasks: Vec<_> = {
            let mut registry = self.inner.registry.lock().await;
            registry.drain().map(|entry| entry.poll.task).collect()
        };
        let count = tasks.len();

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, futures::future::join_all(tasks))
            .await
            .is_err()
        {
            tracing::warn!(count, "Timed out waiting for poll tasks to exit");
        }

        tracing::info!(count, "Request tracker shut down complete");
    }
}
