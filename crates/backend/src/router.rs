//! Job-to-backend routing.
//!
//! [`CatalogRouter`] keeps the merged job catalog of both backend families
//! in memory and resolves a [`JobId`] to the backend that owns it, based on
//! the descriptor's `provider` attribute.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use jobwatch_core::types::JobId;

use crate::backend::{BackendError, JobBackend};
use crate::catalog::{BackendFamily, JobDescriptor, JobList, ProviderInfo};

/// Lookup from a job to the backend that owns it.
#[async_trait]
pub trait BackendResolver: Send + Sync {
    /// Returns `None` when no backend can be resolved for `job_id`.
    async fn resolve(&self, job_id: &JobId) -> Option<Arc<dyn JobBackend>>;
}

/// Routes jobs between a legacy and a generic backend using the catalog.
pub struct CatalogRouter {
    legacy: Arc<dyn JobBackend>,
    generic: Arc<dyn JobBackend>,
    /// Descriptors in catalog order.
    jobs: RwLock<Vec<JobDescriptor>>,
}

impl CatalogRouter {
    pub fn new(legacy: Arc<dyn JobBackend>, generic: Arc<dyn JobBackend>) -> Self {
        Self {
            legacy,
            generic,
            jobs: RwLock::new(Vec::new()),
        }
    }

    /// The backend serving `family`.
    pub fn backend(&self, family: BackendFamily) -> Arc<dyn JobBackend> {
        match family {
            BackendFamily::Legacy => Arc::clone(&self.legacy),
            BackendFamily::Generic => Arc::clone(&self.generic),
        }
    }

    /// Reload the catalog from both backends.
    ///
    /// Legacy jobs are listed first. A job id listed by both keeps the
    /// generic descriptor, in the legacy position.
    pub async fn refresh(&self) -> Result<JobList, BackendError> {
        let legacy = self.legacy.list().await?;
        let generic = self.generic.list().await?;

        let mut merged: Vec<JobDescriptor> = Vec::with_capacity(legacy.jobs.len() + generic.jobs.len());
        let mut index: HashMap<JobId, usize> = HashMap::new();
        for desc in legacy.jobs.into_iter().chain(generic.jobs) {
            match index.get(&desc.id) {
                Some(&pos) => merged[pos] = desc,
                None => {
                    index.insert(desc.id.clone(), merged.len());
                    merged.push(desc);
                }
            }
        }

        tracing::info!(count = merged.len(), "Job catalog loaded");
        *self.jobs.write().await = merged.clone();
        Ok(JobList::new(merged))
    }

    /// Replace the catalog without contacting the backends.
    pub async fn load(&self, jobs: Vec<JobDescriptor>) {
        *self.jobs.write().await = jobs;
    }

    /// The currently loaded catalog.
    pub async fn list(&self) -> JobList {
        JobList::new(self.jobs.read().await.clone())
    }

    /// Look up a single descriptor.
    pub async fn descriptor(&self, job_id: &JobId) -> Option<JobDescriptor> {
        self.jobs
            .read()
            .await
            .iter()
            .find(|desc| &desc.id == job_id)
            .cloned()
    }

    /// Provider directory, as reported by the generic backend.
    pub async fn providers(&self) -> Result<BTreeMap<String, ProviderInfo>, BackendError> {
        self.generic.providers().await
    }
}

#[async_trait]
impl BackendResolver for CatalogRouter {
    async fn resolve(&self, job_id: &JobId) -> Option<Arc<dyn JobBackend>> {
        let desc = self.descriptor(job_id).await?;
        Some(self.backend(desc.family()))
    }
}
