use std::time::Duration;

use jobwatch_tracker::PollConfig;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Watcher configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherConfig {
    /// Base URL of the legacy job API (default: `http://localhost:8080`).
    pub legacy_url: String,
    /// Base URL of the generic job API (default: `http://localhost:8081`).
    pub generic_url: String,
    /// Bearer token sent to both backends, if set.
    pub api_token: Option<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Adaptive polling intervals (default: 30 s queued, 10 s started).
    pub poll: PollConfig,
}

impl WatcherConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `JOBWATCH_LEGACY_URL`           | `http://localhost:8080` |
    /// | `JOBWATCH_GENERIC_URL`          | `http://localhost:8081` |
    /// | `JOBWATCH_API_TOKEN`            | unset                   |
    /// | `JOBWATCH_QUEUED_POLL_SECS`     | `30`                    |
    /// | `JOBWATCH_STARTED_POLL_SECS`    | `10`                    |
    /// | `JOBWATCH_REQUEST_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let legacy_url = url(&lookup, "JOBWATCH_LEGACY_URL", "http://localhost:8080")?;
        let generic_url = url(&lookup, "JOBWATCH_GENERIC_URL", "http://localhost:8081")?;

        let api_token = lookup("JOBWATCH_API_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let queued = positive_secs(&lookup, "JOBWATCH_QUEUED_POLL_SECS", 30)?;
        let started = positive_secs(&lookup, "JOBWATCH_STARTED_POLL_SECS", 10)?;
        let request_timeout_secs = positive_secs(&lookup, "JOBWATCH_REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            legacy_url,
            generic_url,
            api_token,
            request_timeout_secs,
            poll: PollConfig {
                queued_interval: Duration::from_secs(queued),
                started_interval: Duration::from_secs(started),
            },
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn url(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    let value = lookup(var).unwrap_or_else(|| default.into());
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::Invalid {
            var,
            value,
            expected: "an http(s) URL",
        })
    }
}

fn positive_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            expected: "a positive number of seconds",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<WatcherConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WatcherConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = load(&[]).unwrap();
        assert_eq!(config.legacy_url, "http://localhost:8080");
        assert_eq!(config.generic_url, "http://localhost:8081");
        assert_eq!(config.api_token, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll, PollConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("JOBWATCH_LEGACY_URL", "https://legacy.internal/"),
            ("JOBWATCH_API_TOKEN", " secret "),
            ("JOBWATCH_QUEUED_POLL_SECS", "5"),
            ("JOBWATCH_STARTED_POLL_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.legacy_url, "https://legacy.internal/");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.poll.queued_interval, Duration::from_secs(5));
        assert_eq!(config.poll.started_interval, Duration::from_secs(2));
    }

    #[test]
    fn blank_token_is_unset() {
        let config = load(&[("JOBWATCH_API_TOKEN", "  ")]).unwrap();
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn zero_interval_rejected() {
        let err = load(&[("JOBWATCH_STARTED_POLL_SECS", "0")]).unwrap_err();
        assert_matches!(
            err,
            ConfigError::Invalid {
                var: "JOBWATCH_STARTED_POLL_SECS",
                ..
            }
        );
    }

    #[test]
    fn non_numeric_timeout_rejected() {
        let err = load(&[("JOBWATCH_REQUEST_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_matches!(
            err,
            ConfigError::Invalid {
                var: "JOBWATCH_REQUEST_TIMEOUT_SECS",
                ..
            }
        );
    }

    #[test]
    fn url_without_scheme_rejected() {
        let err = load(&[("JOBWATCH_GENERIC_URL", "localhost:8081")]).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "JOBWATCH_GENERIC_URL", .. });
    }
}
