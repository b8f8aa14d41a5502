#![forbid(unsafe_code)]

//! Debounced render scheduling.
//!
//! The editor re-derives the whole view on every render, so renders are
//! the expensive part. [`RenderScheduler`] watches the editor version and
//! decides when a render pass is due. State mutations themselves are never
//! delayed; only the render trails them.
//!
//! # Invariants
//!
//! - **Latest-wins**: one render covers every change since the last one.
//! - **Bounded latency**: a pending render fires within `hard_deadline` of
//!   the first unrendered change, even under a continuous change stream.
//! - **Deterministic**: time is passed in; identical inputs give identical
//!   decisions.
//!
//! # Decision Rule
//!
//! 1) If `now - first_change ≥ hard_deadline`, **render** (forced).
//! 2) If `now - last_change ≥ debounce`, **render**.
//! 3) Otherwise **wait** for the smaller remaining interval.

use std::time::Duration;

use tracing::trace;

use crate::config::RenderConfig;

/// Outcome of [`RenderScheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderDecision {
    /// Nothing changed since the last render.
    Idle,
    /// A render is pending; check again after `remaining`.
    Wait { remaining: Duration },
    /// Render now.
    Render {
        version: u64,
        /// Time since the first unrendered change.
        waited: Duration,
        forced_by_deadline: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    version: u64,
    first_change: Duration,
    last_change: Duration,
}

/// Decides when to render.
#[derive(Debug, Clone, Default)]
pub struct RenderScheduler {
    config: RenderConfig,
    settled_version: Option<u64>,
    pending: Option<Pending>,
    renders: u64,
}

impl RenderScheduler {
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Record the editor version at `now`.
    pub fn observe(&mut self, version: u64, now: Duration) {
        if let Some(pending) = self.pending.as_mut() {
            if pending.version != version {
                pending.version = version;
                pending.last_change = now;
            }
            return;
        }
        if self.settled_version != Some(version) {
            self.pending = Some(Pending {
                version,
                first_change: now,
                last_change: now,
            });
        }
    }

    /// Decide whether a render is due at `now`.
    pub fn tick(&mut self, now: Duration) -> RenderDecision {
        let Some(pending) = self.pending else {
            return RenderDecision::Idle;
        };
        let since_first = now.saturating_sub(pending.first_change);
        let since_last = now.saturating_sub(pending.last_change);
        let quiet = since_last >= self.config.debounce;
        let forced = since_first >= self.config.hard_deadline;

        if quiet || forced {
            self.pending = None;
            self.settled_version = Some(pending.version);
            self.renders += 1;
            trace!(version = pending.version, forced = forced && !quiet, "render due");
            return RenderDecision::Render {
                version: pending.version,
                waited: since_first,
                forced_by_deadline: forced && !quiet,
            };
        }

        let remaining = (self.config.debounce - since_last)
            .min(self.config.hard_deadline.saturating_sub(since_first));
        RenderDecision::Wait { remaining }
    }

    /// Drop the pending render.
    ///
    /// The pending version counts as settled, so only a later change
    /// schedules the next render. Returns whether a render was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.settled_version = Some(pending.version);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Renders issued so far.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}
