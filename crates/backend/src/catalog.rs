//! Job catalog and provider directory payloads.

use serde::{Deserialize, Serialize};

use jobwatch_core::types::JobId;

/// Provider attribute value that routes a job to the legacy family.
pub const LEGACY_PROVIDER: &str = "legacy";

/// The two routing targets for job operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendFamily {
    Legacy,
    Generic,
}

impl BackendFamily {
    /// Pick the family for a job descriptor's `provider` attribute.
    ///
    /// A missing provider routes to the legacy family.
    pub fn from_provider(provider: Option<&str>) -> Self {
        match provider {
            None => Self::Legacy,
            Some(p) if p.eq_ignore_ascii_case(LEGACY_PROVIDER) => Self::Legacy,
            Some(_) => Self::Generic,
        }
    }
}

impl std::fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Generic => f.write_str("generic"),
        }
    }
}

/// One invocable job (model) as listed by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: JobId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    /// Free-form descriptor fields (inputs, tags, etc.).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl JobDescriptor {
    pub fn family(&self) -> BackendFamily {
        BackendFamily::from_provider(self.provider.as_deref())
    }
}

/// Ordered collection of job descriptors with a count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<JobDescriptor>,
    #[serde(default)]
    pub count: usize,
}

impl JobList {
    pub fn new(jobs: Vec<JobDescriptor>) -> Self {
        let count = jobs.len();
        Self { jobs, count }
    }
}

/// Attribute bag for one entry of the provider directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    #[serde(default)]
    pub icon: Option<String>,
    /// Everything else the directory reports for the provider.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_routing() {
        assert_eq!(BackendFamily::from_provider(None), BackendFamily::Legacy);
        assert_eq!(
            BackendFamily::from_provider(Some("Legacy")),
            BackendFamily::Legacy
        );
        assert_eq!(
            BackendFamily::from_provider(Some("replicate")),
            BackendFamily::Generic
        );
    }

    #[test]
    fn descriptor_without_provider_is_legacy() {
        let desc: JobDescriptor = serde_json::from_str(r#"{"id":"upscale-x4"}"#).unwrap();
        assert_eq!(desc.family(), BackendFamily::Legacy);
        assert!(desc.metadata.is_null());
    }

    #[test]
    fn provider_info_keeps_extra_fields() {
        let info: ProviderInfo = serde_json::from_str(
            r#"{"icon":"https://cdn.example/icon.png","region":"eu","tier":2}"#,
        )
        .unwrap();
        assert_eq!(info.icon.as_deref(), Some("https://cdn.example/icon.png"));
        assert_eq!(info.metadata["region"], "eu");
        assert_eq!(info.metadata["tier"], 2);
    }

    #[test]
    fn job_list_counts_its_jobs() {
        let list = JobList::new(vec![JobDescriptor {
            id: JobId::parse("a").unwrap(),
            name: None,
            provider: None,
            metadata: serde_json::Value::Null,
        }]);
        assert_eq!(list.count, 1);
    }
}
