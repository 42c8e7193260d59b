//! The [`JobBackend`] trait implemented by every backend family.

use std::collections::BTreeMap;

use async_trait::async_trait;
use jobwatch_core::status::StatusReport;
use jobwatch_core::types::{JobId, RequestId};

use crate::catalog::{BackendFamily, JobList, ProviderInfo};

/// Errors from a remote backend call.
///
/// Every variant counts as a transport failure when it comes back from a
/// status query.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured base URL cannot carry the request path.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The backend answered with a body we could not interpret.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

/// One remote job backend.
///
/// Implementations are shared as `Arc<dyn JobBackend>` between the router,
/// the gateway, and every tracked request they own.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Which routing family this backend serves.
    fn family(&self) -> BackendFamily;

    /// List the jobs this backend can run.
    async fn list(&self) -> Result<JobList, BackendError>;

    /// Provider directory. Backends without providers return an empty map.
    async fn providers(&self) -> Result<BTreeMap<String, ProviderInfo>, BackendError> {
        Ok(BTreeMap::new())
    }

    /// Submit a job for asynchronous execution.
    async fn run(
        &self,
        job_id: &JobId,
        spec: &serde_json::Value,
    ) -> Result<RequestId, BackendError>;

    /// Invoke a job synchronously and return its result body.
    async fn call(
        &self,
        job_id: &JobId,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError>;

    /// Query the current status of a submitted request.
    async fn status(&self, request_id: &RequestId) -> Result<StatusReport, BackendError>;

    /// Ask the backend to stop a submitted request.
    async fn cancel(&self, request_id: &RequestId) -> Result<(), BackendError>;
}
