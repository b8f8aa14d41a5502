#![forbid(unsafe_code)]

//! Editor configuration.

use crate::drag::DragConfig;

/// Environment variable overriding the drag threshold, in pixels.
pub const ENV_DRAG_THRESHOLD_PX: &str = "TAGDECK_DRAG_THRESHOLD_PX";

/// Tunables for [`crate::EditorState`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Pointer travel (px) before an armed press becomes a drag.
    pub drag_threshold_px: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DragConfig::default().threshold_px,
        }
    }
}

impl EditorConfig {
    #[must_use]
    pub fn with_drag_threshold(mut self, px: f64) -> Self {
        self.drag_threshold_px = px;
        self
    }

    /// Read overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read overrides through a custom lookup (for tests).
    ///
    /// Unparseable or negative values keep the default.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(px) = get_env(ENV_DRAG_THRESHOLD_PX)
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|px| px.is_finite() && *px >= 0.0)
        {
            config.drag_threshold_px = px;
        }
        config
    }

    /// The drag-gesture settings derived from this config.
    #[must_use]
    pub fn drag_config(&self) -> DragConfig {
        DragConfig::default().with_threshold(self.drag_threshold_px)
    }
}
