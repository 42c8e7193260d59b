//! Opaque identifiers for remote jobs and submitted requests.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of any identifier accepted from callers.
const MAX_ID_LEN: usize = 256;

/// Identifier of a submitted request, assigned by the remote backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

/// Identifier of an invocable job (model) in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl RequestId {
    /// Validate and wrap a raw request identifier.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        validate_token("request id", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl JobId {
    /// Validate and wrap a raw job identifier.
    pub fn parse(raw: impl Into<String>) -> Result<Self, CoreError> {
        let raw = raw.into();
        validate_token("job id", &raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::str::FromStr for JobId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Validate an opaque identifier token.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_ID_LEN` bytes.
/// - Must not contain whitespace or control characters.
pub fn validate_token(kind: &str, raw: &str) -> Result<(), CoreError> {
    if raw.is_empty() {
        return Err(CoreError::InvalidArgument(format!(
            "{kind} must not be empty"
        )));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(CoreError::InvalidArgument(format!(
            "{kind} must not exceed {MAX_ID_LEN} bytes"
        )));
    }
    if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CoreError::InvalidArgument(format!(
            "{kind} must not contain whitespace or control characters"
        )));
    }
    Ok(())
}
