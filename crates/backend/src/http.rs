//! HTTP client for a remote job backend.
//!
//! Wraps the backend REST API (catalog listing, submission, synchronous
//! invocation, status, cancellation) using [`reqwest`]. Both backend
//! families speak JSON; they differ only in their route layout.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use jobwatch_core::status::StatusReport;
use jobwatch_core::types::{JobId, RequestId};

use crate::backend::{BackendError, JobBackend};
use crate::catalog::{BackendFamily, JobList, ProviderInfo};

/// HTTP client for a single backend instance.
pub struct HttpBackend {
    client: reqwest::Client,
    family: BackendFamily,
    api_url: String,
    token: Option<String>,
}

/// Response returned by a submission endpoint.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
}

impl HttpBackend {
    /// Create a new client for a backend instance.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8080`.
    pub fn new(family: BackendFamily, api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), family, api_url)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        family: BackendFamily,
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, family, api_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (connection pooling across both families).
    pub fn with_client(
        client: reqwest::Client,
        family: BackendFamily,
        api_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            family,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Base HTTP URL of this backend.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- routes ----

    /// `api_url` followed by `segments`, each kept as one path segment
    /// (a `/` inside an id is percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn list_url(&self) -> Result<Url, BackendError> {
        match self.family {
            BackendFamily::Legacy => self.endpoint(&["jobs"]),
            BackendFamily::Generic => self.endpoint(&["v1", "models"]),
        }
    }

    fn providers_url(&self) -> Result<Url, BackendError> {
        self.endpoint(&["v1", "providers"])
    }

    fn run_url(&self, job_id: &JobId) -> Result<Url, BackendError> {
        match self.family {
            BackendFamily::Legacy => self.endpoint(&["jobs", job_id.as_str(), "run"]),
            BackendFamily::Generic => {
                self.endpoint(&["v1", "models", job_id.as_str(), "requests"])
            }
        }
    }

    fn call_url(&self, job_id: &JobId) -> Result<Url, BackendError> {
        match self.family {
            BackendFamily::Legacy => self.endpoint(&["jobs", job_id.as_str(), "call"]),
            BackendFamily::Generic => self.endpoint(&["v1", "models", job_id.as_str(), "invoke"]),
        }
    }

    fn status_url(&self, request_id: &RequestId) -> Result<Url, BackendError> {
        match self.family {
            BackendFamily::Legacy => self.endpoint(&["requests", request_id.as_str(), "status"]),
            BackendFamily::Generic => self.endpoint(&["v1", "requests", request_id.as_str()]),
        }
    }

    fn cancel_url(&self, request_id: &RequestId) -> Result<Url, BackendError> {
        match self.family {
            BackendFamily::Legacy => self.endpoint(&["requests", request_id.as_str(), "cancel"]),
            BackendFamily::Generic => self.endpoint(&["v1", "requests", request_id.as_str()]),
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`BackendError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl JobBackend for HttpBackend {
    fn family(&self) -> BackendFamily {
        self.family
    }

    async fn list(&self) -> Result<JobList, BackendError> {
        let response = self.authorize(self.client.get(self.list_url()?)).send().await?;
        let mut list: JobList = Self::parse_response(response).await?;
        if list.count == 0 {
            list.count = list.jobs.len();
        }
        Ok(list)
    }

    async fn providers(&self) -> Result<BTreeMap<String, ProviderInfo>, BackendError> {
        if self.family == BackendFamily::Legacy {
            return Ok(BTreeMap::new());
        }
        let response = self
            .authorize(self.client.get(self.providers_url()?))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn run(
        &self,
        job_id: &JobId,
        spec: &serde_json::Value,
    ) -> Result<RequestId, BackendError> {
        let response = self
            .authorize(self.client.post(self.run_url(job_id)?))
            .json(spec)
            .send()
            .await?;
        let submitted: SubmitResponse = Self::parse_response(response).await?;
        let request_id = RequestId::parse(submitted.request_id)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            family = %self.family,
            job_id = %job_id,
            request_id = %request_id,
            "Job submitted",
        );
        Ok(request_id)
    }

    async fn call(
        &self,
        job_id: &JobId,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, BackendError> {
        let response = self
            .authorize(self.client.post(self.call_url(job_id)?))
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn status(&self, request_id: &RequestId) -> Result<StatusReport, BackendError> {
        let response = self
            .authorize(self.client.get(self.status_url(request_id)?))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn cancel(&self, request_id: &RequestId) -> Result<(), BackendError> {
        let builder = match self.family {
            BackendFamily::Legacy => self.client.post(self.cancel_url(request_id)?),
            BackendFamily::Generic => self.client.delete(self.cancel_url(request_id)?),
        };
        let response = self.authorize(builder).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
