//! Status finite-state policy.
//!
//! Turns the outcome of one status query into the update every observer
//! receives and the decision whether to poll again.
//!
//! ```text
//! queued  ──► queued    notify (queued, p ?? 0),        poll again after queued_interval
//! queued  ──► started   notify (started, p ?? 0),       poll again after started_interval
//! *       ──► finished  notify (finished, p ?? 100),    retire
//! *       ──► failed    notify (failed, p ?? 0, msg),   retire
//! *       ──► unknown   notify (unknown, 0, diagnostic), retire
//! ```

use std::time::Duration;

use jobwatch_backend::BackendError;
use jobwatch_core::error::CoreError;
use jobwatch_core::status::{
    JobStatus, StatusReport, StatusUpdate, DEFAULT_PROGRESS, FINISHED_PROGRESS,
};

use crate::poller::PollConfig;

/// What happens to the tracking entry after the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPoll {
    /// Arm the next status query after this delay.
    After(Duration),
    /// Remove the entry; no further polling.
    Retire,
}

/// The result of dispatching one status query.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub update: StatusUpdate,
    pub next: NextPoll,
}

/// Apply the status policy to a fetch outcome.
pub fn dispatch(result: Result<StatusReport, BackendError>, config: &PollConfig) -> Dispatch {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            return Dispatch {
                update: StatusUpdate::new(JobStatus::Unknown, DEFAULT_PROGRESS)
                    .with_message(CoreError::Transport(e.to_string()).to_string()),
                next: NextPoll::Retire,
            };
        }
    };

    match report.status {
        JobStatus::Queued | JobStatus::Started => Dispatch {
            update: StatusUpdate::new(
                report.status,
                report.progress.unwrap_or(DEFAULT_PROGRESS),
            ),
            next: config
                .interval_for(report.status)
                .map_or(NextPoll::Retire, NextPoll::After),
        },
        JobStatus::Finished => Dispatch {
            update: StatusUpdate::new(
                JobStatus::Finished,
                report.progress.unwrap_or(FINISHED_PROGRESS),
            ),
            next: NextPoll::Retire,
        },
        JobStatus::Failed => Dispatch {
            update: StatusUpdate::new(
                JobStatus::Failed,
                report.progress.unwrap_or(DEFAULT_PROGRESS),
            )
            .with_message(report.exc_info.unwrap_or_default()),
            next: NextPoll::Retire,
        },
        // The backend itself could not say where the job is.
        JobStatus::Unknown => Dispatch {
            update: StatusUpdate::new(JobStatus::Unknown, DEFAULT_PROGRESS).with_message(
                report
                    .exc_info
                    .unwrap_or_else(|| "Backend reported an unknown status".to_string()),
            ),
            next: NextPoll::Retire,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PollConfig {
        PollConfig::default()
    }

    #[test]
    fn queued_polls_again_after_long_interval() {
        let d = dispatch(
            Ok(StatusReport::new(JobStatus::Queued).with_progress(10.0)),
            &config(),
        );
        assert_eq!(d.update, StatusUpdate::new(JobStatus::Queued, 10.0));
        assert_eq!(d.next, NextPoll::After(Duration::from_secs(30)));
    }

    #[test]
    fn started_polls_again_after_short_interval() {
        let d = dispatch(Ok(StatusReport::new(JobStatus::Started)), &config());
        assert_eq!(d.update, StatusUpdate::new(JobStatus::Started, 0.0));
        assert_eq!(d.next, NextPoll::After(Duration::from_secs(10)));
    }

    #[test]
    fn finished_defaults_progress_to_hundred() {
        let d = dispatch(Ok(StatusReport::new(JobStatus::Finished)), &config());
        assert_eq!(d.update, StatusUpdate::new(JobStatus::Finished, 100.0));
        assert_eq!(d.next, NextPoll::Retire);
    }

    #[test]
    fn finished_keeps_reported_progress() {
        let d = dispatch(
            Ok(StatusReport::new(JobStatus::Finished).with_progress(97.0)),
            &config(),
        );
        assert_eq!(d.update.progress, 97.0);
    }

    #[test]
    fn failed_carries_diagnostic() {
        let d = dispatch(
            Ok(StatusReport::new(JobStatus::Failed)
                .with_progress(42.0)
                .with_exc_info("CUDA out of memory")),
            &config(),
        );
        assert_eq!(
            d.update,
            StatusUpdate::new(JobStatus::Failed, 42.0).with_message("CUDA out of memory")
        );
        assert_eq!(d.next, NextPoll::Retire);
    }

    #[test]
    fn failed_without_details_has_empty_message() {
        let d = dispatch(Ok(StatusReport::new(JobStatus::Failed)), &config());
        assert_eq!(
            d.update,
            StatusUpdate::new(JobStatus::Failed, 0.0).with_message("")
        );
    }

    #[test]
    fn transport_failure_becomes_unknown() {
        let d = dispatch(
            Err(BackendError::ApiError {
                status: 502,
                body: "bad gateway".into(),
            }),
            &config(),
        );
        assert_eq!(d.update.status, JobStatus::Unknown);
        assert_eq!(d.update.progress, 0.0);
        let message = d.update.message.unwrap();
        assert!(message.starts_with("Transport failure: "), "unexpected message: {message}");
        assert!(message.contains("502"), "unexpected message: {message}");
        assert_eq!(d.next, NextPoll::Retire);
    }

    #[test]
    fn remote_unknown_retires() {
        let d = dispatch(Ok(StatusReport::new(JobStatus::Unknown)), &config());
        assert_eq!(d.update.status, JobStatus::Unknown);
        assert!(d.update.message.is_some());
        assert_eq!(d.next, NextPoll::Retire);
    }

    #[test]
    fn custom_intervals_are_honoured() {
        let config = PollConfig {
            queued_interval: Duration::from_secs(5),
            started_interval: Duration::from_secs(1),
        };
        let d = dispatch(Ok(StatusReport::new(JobStatus::Queued)), &config);
        assert_eq!(d.next, NextPoll::After(Duration::from_secs(5)));
    }
}
