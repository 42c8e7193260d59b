//! JSON-lines output for status updates.

use chrono::{DateTime, Utc};
use jobwatch_core::status::StatusUpdate;
use jobwatch_core::types::RequestId;
use serde::Serialize;

/// One printed status notification.
#[derive(Debug, Serialize)]
pub struct UpdateLine<'a> {
    pub timestamp: DateTime<Utc>,
    pub request_id: &'a RequestId,
    #[serde(flatten)]
    pub update: &'a StatusUpdate,
}

impl<'a> UpdateLine<'a> {
    pub fn now(request_id: &'a RequestId, update: &'a StatusUpdate) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id,
            update,
        }
    }
}

/// Render `value` as a single JSON line.
pub fn to_line(value: &impl Serialize) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}
