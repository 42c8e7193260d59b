//! Pass-through job operations plus request tracking, behind one handle.
//!
//! [`JobGateway`] accepts raw identifiers, validates them, routes
//! catalog/submission/invocation calls to the owning backend, and forwards
//! `listen`/`cancel` to the [`RequestTracker`].

use std::collections::BTreeMap;
use std::sync::Arc;

use jobwatch_backend::{BackendResolver, CatalogRouter, JobBackend, JobList, ProviderInfo};
use jobwatch_core::types::{JobId, RequestId};

use crate::error::TrackerError;
use crate::observer::Observer;
use crate::poller::PollConfig;
use crate::tracker::RequestTracker;

pub struct JobGateway {
    router: Arc<CatalogRouter>,
    tracker: RequestTracker,
}

impl JobGateway {
    /// Build a gateway whose tracker resolves backends through `router`.
    pub fn new(router: Arc<CatalogRouter>, config: PollConfig) -> Self {
        let tracker = RequestTracker::new(Arc::clone(&router) as Arc<dyn BackendResolver>, config);
        Self { router, tracker }
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// Reload the job catalog from both backend families.
    pub async fn refresh(&self) -> Result<JobList, TrackerError> {
        Ok(self.router.refresh().await?)
    }

    /// The loaded job catalog.
    pub async fn list(&self) -> JobList {
        self.router.list().await
    }

    pub async fn providers(&self) -> Result<BTreeMap<String, ProviderInfo>, TrackerError> {
        Ok(self.router.providers().await?)
    }

    /// Submit a job and return the backend-assigned request id.
    pub async fn run(
        &self,
        job_id: &str,
        spec: &serde_json::Value,
    ) -> Result<RequestId, TrackerError> {
        let job_id = JobId::parse(job_id)?;
        let backend = self.backend_for(&job_id).await?;
        Ok(backend.run(&job_id, spec).await?)
    }

    /// Invoke a job synchronously.
    pub async fn call(
        &self,
        job_id: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, TrackerError> {
        let job_id = JobId::parse(job_id)?;
        let backend = self.backend_for(&job_id).await?;
        Ok(backend.call(&job_id, body).await?)
    }

    pub async fn listen(
        &self,
        request_id: &str,
        job_id: &str,
        observer: Arc<dyn Observer>,
    ) -> Result<(), TrackerError> {
        let request_id = RequestId::parse(request_id)?;
        let job_id = JobId::parse(job_id)?;
        self.tracker.listen(request_id, job_id, observer).await
    }

    pub async fn cancel(&self, request_id: &str, job_id: &str) -> Result<(), TrackerError> {
        let request_id = RequestId::parse(request_id)?;
        let job_id = JobId::parse(job_id)?;
        self.tracker.cancel(&request_id, &job_id).await
    }

    /// Submit a job and start tracking it with `observer`.
    pub async fn run_and_listen(
        &self,
        job_id: &str,
        spec: &serde_json::Value,
        observer: Arc<dyn Observer>,
    ) -> Result<RequestId, TrackerError> {
        let request_id = self.run(job_id, spec).await?;
        let job_id = JobId::parse(job_id)?;
        self.tracker
            .listen(request_id.clone(), job_id, observer)
            .await?;
        Ok(request_id)
    }

    async fn backend_for(
        &self,
        job_id: &JobId,
    ) -> Result<Arc<dyn JobBackend>, TrackerError> {
        self.router
            .resolve(job_id)
            .await
            .ok_or_else(|| TrackerError::job_not_found(job_id))
    }
}
