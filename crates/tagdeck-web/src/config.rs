#![forbid(unsafe_code)]

//! Render scheduling settings.

use std::time::Duration;

pub const ENV_RENDER_DEBOUNCE_MS: &str = "TAGDECK_RENDER_DEBOUNCE_MS";
pub const ENV_RENDER_DEADLINE_MS: &str = "TAGDECK_RENDER_DEADLINE_MS";

/// How long render passes may trail state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Quiet period after the latest change before rendering.
    pub debounce: Duration,
    /// Upper bound between the first unrendered change and a render.
    pub hard_deadline: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            hard_deadline: Duration::from_millis(250),
        }
    }
}

impl RenderConfig {
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn with_hard_deadline(mut self, deadline: Duration) -> Self {
        self.hard_deadline = deadline;
        self
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read overrides through a custom lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            get_env(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        let mut config = Self::default();
        if let Some(debounce) = read(ENV_RENDER_DEBOUNCE_MS) {
            config.debounce = debounce;
        }
        if let Some(deadline) = read(ENV_RENDER_DEADLINE_MS) {
            config.hard_deadline = deadline;
        }
        config
    }
}
