#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobwatch_backend::{
    BackendError, BackendFamily, BackendResolver, JobBackend, JobDescriptor, JobList,
};
use jobwatch_core::status::{JobStatus, StatusReport, StatusUpdate};
use jobwatch_core::types::{JobId, RequestId};
use jobwatch_tracker::observer;
use jobwatch_tracker::Observer;
use tokio::sync::{mpsc, Notify, Semaphore};

/// In-memory backend that answers status queries from a script.
///
/// Once the script runs out every further query reports `queued`.
pub struct ScriptedBackend {
    family: BackendFamily,
    jobs: Vec<JobDescriptor>,
    script: Mutex<VecDeque<Result<StatusReport, BackendError>>>,
    /// When set, each status query waits for one permit before answering.
    gate: Option<Semaphore>,
    fail_cancel: bool,
    status_calls: AtomicUsize,
    runs: Mutex<Vec<JobId>>,
    cancels: Mutex<Vec<RequestId>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<StatusReport, BackendError>>) -> Self {
        Self {
            family: BackendFamily::Legacy,
            jobs: Vec::new(),
            script: Mutex::new(script.into()),
            gate: None,
            fail_cancel: false,
            status_calls: AtomicUsize::new(0),
            runs: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
        }
    }

    pub fn with_family(mut self, family: BackendFamily) -> Self {
        self.family = family;
        self
    }

    pub fn with_jobs(mut self, jobs: Vec<JobDescriptor>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Hold every status query until [`release`](Self::release) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> Vec<JobId> {
        self.runs.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> Vec<RequestId> {
        self.cancels.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobBackend for ScriptedBackend {
    fn family(&self) -> BackendFamily {
        self.family
    }

    async fn list(&self) -> Result<JobList, BackendError> {
        Ok(JobList::new(self.jobs.clone()))
    }

    async fn run(
        &self,
        job_id: &JobId,
        _spec: &serde_json::Value,
    ) -> Result<RequestId, BackendError> {
        let mut runs = self.runs.lock().unwrap();
        runs.push(job_id.clone());
        RequestId::parse(format!("{}-req-{}", self.family, runs.len()))
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn call(
        &self,
        job_id: &JobId,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        Ok(serde_json::json!({ "job": job_id, "family": self.family, "echo": body }))
    }

    async fn status(&self, _request_id: &RequestId) -> Result<StatusReport, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| BackendError::InvalidResponse(e.to_string()))?
                .forget();
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::new(JobStatus::Queued)))
    }

    async fn cancel(&self, request_id: &RequestId) -> Result<(), BackendError> {
        if self.fail_cancel {
            return Err(BackendError::ApiError {
                status: 409,
                body: "already finished".into(),
            });
        }
        self.cancels.lock().unwrap().push(request_id.clone());
        Ok(())
    }
}

/// Resolves exactly one job id to one backend.
pub struct FixedResolver {
    pub job_id: JobId,
    pub backend: Arc<ScriptedBackend>,
}

#[async_trait]
impl BackendResolver for FixedResolver {
    async fn resolve(&self, job_id: &JobId) -> Option<Arc<dyn JobBackend>> {
        (job_id == &self.job_id).then(|| Arc::clone(&self.backend) as Arc<dyn JobBackend>)
    }
}

/// Resolves every job to one backend, but only once [`release`](Self::release)
/// is called.
pub struct HeldResolver {
    gate: Notify,
    backend: Arc<ScriptedBackend>,
}

impl HeldResolver {
    pub fn new(backend: Arc<ScriptedBackend>) -> Self {
        Self {
            gate: Notify::new(),
            backend,
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl BackendResolver for HeldResolver {
    async fn resolve(&self, _job_id: &JobId) -> Option<Arc<dyn JobBackend>> {
        self.gate.notified().await;
        Some(Arc::clone(&self.backend) as Arc<dyn JobBackend>)
    }
}

pub fn req(id: &str) -> RequestId {
    RequestId::parse(id).unwrap()
}

pub fn job(id: &str) -> JobId {
    JobId::parse(id).unwrap()
}

pub fn descriptor(id: &str, provider: Option<&str>) -> JobDescriptor {
    JobDescriptor {
        id: job(id),
        name: None,
        provider: provider.map(str::to_string),
        metadata: serde_json::Value::Null,
    }
}

pub fn queued(progress: f64) -> Result<StatusReport, BackendError> {
    Ok(StatusReport::new(JobStatus::Queued).with_progress(progress))
}

pub fn started(progress: f64) -> Result<StatusReport, BackendError> {
    Ok(StatusReport::new(JobStatus::Started).with_progress(progress))
}

pub fn finished() -> Result<StatusReport, BackendError> {
    Ok(StatusReport::new(JobStatus::Finished))
}

/// A channel-backed observer and the receiving end of its updates.
pub fn recorder() -> (Arc<dyn Observer>, mpsc::UnboundedReceiver<StatusUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (observer::channel(tx), rx)
}

/// Let spawned poll tasks run without moving past any armed timer.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Wait (in paused time) until `backend` has seen `calls` status queries.
pub async fn wait_for_calls(backend: &ScriptedBackend, calls: usize) {
    for _ in 0..1000 {
        if backend.status_calls() >= calls {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!(
        "expected {calls} status calls, saw {}",
        backend.status_calls()
    );
}
