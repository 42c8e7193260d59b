//! Request tracking and polling engine.
//!
//! After a job is submitted, [`RequestTracker`] keeps one tracking entry
//! per request id, polls the owning backend at adaptive intervals, and
//! fans every status change out to the request's observers until the job
//! finishes, fails, becomes unreachable, or is cancelled.
//!
//! [`JobGateway`] layers the pass-through catalog, submission, and
//! invocation calls on top of the tracker.

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod gateway;
pub mod observer;
pub mod poller;
mod registry;
pub mod tracker;

pub use error::TrackerError;
pub use events::TrackerEvent;
pub use gateway::JobGateway;
pub use observer::Observer;
pub use poller::PollConfig;
pub use tracker::{RequestTracker, TrackedSnapshot};
