//! Remote job backend clients.
//!
//! Provides the [`JobBackend`](backend::JobBackend) trait covering job
//! submission, status queries, and cancellation, a `reqwest` HTTP
//! implementation for both backend families, catalog and provider types,
//! and the catalog-driven router that decides which backend owns a job.

pub mod backend;
pub mod catalog;
pub mod http;
pub mod router;

pub use backend::{BackendError, JobBackend};
pub use catalog::{BackendFamily, JobDescriptor, JobList, ProviderInfo};
pub use http::HttpBackend;
pub use router::{BackendResolver, CatalogRouter};
