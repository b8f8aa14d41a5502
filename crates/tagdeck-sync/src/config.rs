#![forbid(unsafe_code)]

//! Backend connection settings.

use std::time::Duration;

pub const ENV_BASE_URL: &str = "TAGDECK_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "TAGDECK_REQUEST_TIMEOUT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "TAGDECK_POLL_INTERVAL_MS";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "TAGDECK_POLL_MAX_ATTEMPTS";

/// Where the backend lives and how patiently to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Endpoint names are appended to this URL.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Delay between processing-status polls.
    pub poll_interval: Duration,
    /// Polls before giving up with a timeout error.
    pub poll_max_attempts: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_millis(30_000),
            poll_interval: Duration::from_millis(1_000),
            poll_max_attempts: 60,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_max_attempts = max_attempts;
        self
    }

    /// Read overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read overrides through a custom lookup (for tests).
    ///
    /// Unparseable values keep the default.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = get_env(ENV_BASE_URL).map(|v| v.trim().to_string())
            && !url.is_empty()
        {
            config.base_url = url;
        }
        if let Some(ms) = parse_u64(&get_env, ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_u64(&get_env, ENV_POLL_INTERVAL_MS) {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse_u64(&get_env, ENV_POLL_MAX_ATTEMPTS)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
        {
            config.poll_max_attempts = attempts;
        }
        config
    }
}

fn parse_u64<F>(get_env: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    get_env(key).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn map_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn get_env<'a>(map: &'a HashMap<String, String>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_max_attempts, 60);
    }

    #[test]
    fn env_overrides() {
        let env = map_env(&[
            (ENV_BASE_URL, "http://tags.local/api "),
            (ENV_REQUEST_TIMEOUT_MS, "2500"),
            (ENV_POLL_INTERVAL_MS, "10"),
            (ENV_POLL_MAX_ATTEMPTS, "3"),
        ]);
        let config = SyncConfig::from_env_with(get_env(&env));
        assert_eq!(config.base_url, "http://tags.local/api");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.poll_max_attempts, 3);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let env = map_env(&[
            (ENV_BASE_URL, "   "),
            (ENV_REQUEST_TIMEOUT_MS, "soon"),
            (ENV_POLL_MAX_ATTEMPTS, "0"),
        ]);
        assert_eq!(SyncConfig::from_env_with(get_env(&env)), SyncConfig::default());
    }
}
