#![forbid(unsafe_code)]

//! Step-based host bridge.
//!
//! [`HostBridge`] bundles the editor with everything a host loop needs:
//!
//! 1. Push pointer events via [`HostBridge::push_pointer`].
//! 2. Report rendered geometry via [`HostBridge::report_layout`].
//! 3. Advance time via [`HostBridge::advance_time`].
//! 4. Call [`HostBridge::step`]; it returns a [`ViewSnapshot`] when a
//!    render is due.
//! 5. Drain committed drops via [`HostBridge::take_pending_syncs`], persist
//!    them, and report back with [`HostBridge::complete_sync`].

use core::time::Duration;
use std::collections::VecDeque;

use serde::Serialize;
use tagdeck_core::{PointerCoalescer, PointerEvent};
use tagdeck_state::{
    DragError, DragPhase, EditorState, PendingSync, PointerOutcome, ReleaseOutcome, RenderedLeaf,
    StackedLayout, SyncOutcome, ViewModel,
};
use tracing::debug;

use crate::DeterministicClock;
use crate::config::RenderConfig;
use crate::scheduler::{RenderDecision, RenderScheduler};

/// What the host renders after a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    /// Monotonically increasing render index.
    pub frame: u64,
    /// Host clock at render time, in milliseconds.
    pub at_ms: u64,
    pub forced_by_deadline: bool,
    pub drag_phase: DragPhase,
    pub view: ViewModel,
}

/// Host-driven editor runner.
#[derive(Debug)]
pub struct HostBridge {
    editor: EditorState,
    coalescer: PointerCoalescer,
    clock: DeterministicClock,
    scheduler: RenderScheduler,
    layout: StackedLayout,
    outbox: VecDeque<PendingSync>,
    frame: u64,
}

impl HostBridge {
    #[must_use]
    pub fn new(editor: EditorState, config: RenderConfig) -> Self {
        Self {
            editor,
            coalescer: PointerCoalescer::new(),
            clock: DeterministicClock::new(),
            scheduler: RenderScheduler::new(config),
            layout: StackedLayout::default(),
            outbox: VecDeque::new(),
            frame: 0,
        }
    }

    #[must_use]
    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    /// Mutate the editor directly (filters, toggles, loads).
    ///
    /// Changes are picked up by the next [`step`](Self::step).
    pub fn editor_mut(&mut self) -> &mut EditorState {
        &mut self.editor
    }

    #[must_use]
    pub fn clock(&self) -> &DeterministicClock {
        &self.clock
    }

    #[must_use]
    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn coalescer(&self) -> &PointerCoalescer {
        &self.coalescer
    }

    pub fn advance_time(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    pub fn set_time(&mut self, now: Duration) {
        self.clock.set(now);
    }

    /// Replace the geometry of the rendered selected pane.
    pub fn report_layout(&mut self, leaves: Vec<RenderedLeaf>) {
        self.layout = StackedLayout::from_leaves(leaves);
    }

    /// Push a pointer event.
    ///
    /// Moves are coalesced and handled on the next step. Any other event
    /// first flushes the pending move, so a release always sees the latest
    /// drop target. Returns the outcomes of the events handled now.
    pub fn push_pointer(&mut self, event: PointerEvent) -> Result<Vec<PointerOutcome>, DragError> {
        let mut outcomes = Vec::new();
        if let Some(event) = self.coalescer.push(event) {
            if let Some(pending) = self.coalescer.flush() {
                outcomes.push(self.route(pending)?);
            }
            outcomes.push(self.route(event)?);
        }
        self.scheduler.observe(self.editor.version(), self.clock.now());
        Ok(outcomes)
    }

    fn route(&mut self, event: PointerEvent) -> Result<PointerOutcome, DragError> {
        let outcome = self.editor.handle_pointer(event, &self.layout)?;
        if let PointerOutcome::Released(ReleaseOutcome::Committed(pending)) = &outcome {
            debug!(ticket = pending.ticket, len = pending.order.len(), "queued order sync");
            self.outbox.push_back(pending.clone());
        }
        Ok(outcome)
    }

    /// Committed drops waiting to be persisted, oldest first.
    pub fn take_pending_syncs(&mut self) -> Vec<PendingSync> {
        self.outbox.drain(..).collect()
    }

    /// Report the persistence result for a committed drop.
    pub fn complete_sync(&mut self, ticket: u64, outcome: SyncOutcome) -> usize {
        let replayed = self.editor.complete_sync(ticket, outcome);
        self.scheduler.observe(self.editor.version(), self.clock.now());
        replayed
    }

    /// Handle the coalesced move and render if the scheduler says so.
    pub fn step(&mut self) -> Result<Option<ViewSnapshot>, DragError> {
        if let Some(pending) = self.coalescer.flush() {
            self.route(pending)?;
        }
        let now = self.clock.now();
        self.scheduler.observe(self.editor.version(), now);
        match self.scheduler.tick(now) {
            RenderDecision::Render {
                forced_by_deadline, ..
            } => {
                self.frame += 1;
                Ok(Some(ViewSnapshot {
                    frame: self.frame,
                    at_ms: u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
                    forced_by_deadline,
                    drag_phase: self.editor.drag_phase(),
                    view: self.editor.view(),
                }))
            }
            RenderDecision::Idle | RenderDecision::Wait { .. } => Ok(None),
        }
    }

    /// Drop any pending render and pending move.
    pub fn cancel_render(&mut self) -> bool {
        self.coalescer.clear();
        self.scheduler.cancel()
    }
}
