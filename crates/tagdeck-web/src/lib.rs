#![forbid(unsafe_code)]

//! `tagdeck-web` drives the TagDeck editor from a host event loop.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes pointer events
//!   and reports the geometry of what it rendered.
//! - **Deterministic time**: the host advances a monotonic clock explicitly.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//!
//! Network calls are out of scope here. Committed drops are queued for the
//! host, which persists them and reports back through
//! [`HostBridge::complete_sync`].

pub mod bridge;
pub mod config;
pub mod scheduler;

use core::time::Duration;

pub use bridge::{HostBridge, ViewSnapshot};
pub use config::RenderConfig;
pub use scheduler::{RenderDecision, RenderScheduler};

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time. Earlier values are ignored.
    pub fn set(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}
