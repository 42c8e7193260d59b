//! Polling interval constants for tracked requests.

/// Delay before re-polling a request that was still `queued`.
pub const QUEUED_POLL_INTERVAL_SECS: u64 = 30;

/// Delay before re-polling a request that has `started`.
pub const STARTED_POLL_INTERVAL_SECS: u64 = 10;

/// Delay before the first poll after registration ("as soon as possible").
pub const FIRST_POLL_DELAY_MS: u64 = 0;
