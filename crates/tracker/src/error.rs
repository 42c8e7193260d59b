use jobwatch_backend::BackendError;
use jobwatch_core::error::CoreError;
use jobwatch_core::types::{JobId, RequestId};

/// Errors returned synchronously by the tracker and gateway.
///
/// Status query failures never show up here: they become an `unknown`
/// observer notification instead.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Malformed identifier or unresolvable job.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A pass-through backend call (run, call, list, providers) failed.
    #[error("Backend call failed: {0}")]
    Backend(#[from] BackendError),

    /// Local tracking was stopped but the backend refused the cancellation.
    #[error("Failed to cancel request {request_id}: {reason}")]
    CancelFailed {
        request_id: RequestId,
        reason: String,
    },

    /// The tracker no longer accepts registrations.
    #[error("Request tracker is shut down")]
    ShutDown,
}

impl TrackerError {
    pub(crate) fn job_not_found(job_id: &JobId) -> Self {
        Self::Core(CoreError::NotFound {
            entity: "job",
            id: job_id.to_string(),
        })
    }
}
