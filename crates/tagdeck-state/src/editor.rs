#![forbid(unsafe_code)]

//! The editor application state.
//!
//! [`EditorState`] owns the catalog, the selection, the active filter, and
//! the drag gesture. It is passed explicitly to whatever needs it; there are
//! no globals. Every method runs to completion synchronously, so the state
//! is consistent at every handler boundary.
//!
//! # Reorder-in-flight latch
//!
//! While a drag is past its threshold, or a committed drop is waiting for
//! its sync to finish, wholesale updates would rebuild the selected pane
//! under the user's pointer. They are queued instead and replayed in arrival
//! order once the latch drops:
//!
//! | Update | While latched |
//! |--------|---------------|
//! | [`EditorState::load_dataset`] | Queued; drops everything queued before it |
//! | [`EditorState::apply_catalog_refresh`] | Queued; collapses onto an earlier queued refresh |
//! | [`EditorState::replace_selection`] | Queued; never dropped |
//!
//! Individual toggles and filter changes are never queued. A toggle that
//! changes the rendered rows under a drag trips the drag's validity guard.
//!
//! # Arranged pane
//!
//! A committed drop may move a leaf into another bucket of the selected
//! pane. That relocated pane is what the user arranged, so it is rendered
//! as-is until the selection or the catalog changes; after that the pane is
//! rebuilt from the stored order.

use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use serde_json::Value;
use tagdeck_core::{
    Catalog, FilterCriteria, HierarchyNode, ItemId, ItemRecord, LoadReport, Point, PointerEvent,
    PointerKind, ToggleState, hierarchy,
};
use tracing::{debug, debug_span, info};

use crate::config::EditorConfig;
use crate::drag::{self, DragConfig, DragPhase, DragSession, LayoutProbe, LiveTarget, Release, Tracking};
use crate::error::{DragError, LineageError};
use crate::reconcile;
use crate::selection::SelectionStore;
use crate::view::{self, ViewModel};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Whether a wholesale update ran now or was queued behind the latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateDisposition {
    Applied,
    Deferred,
}

/// Why a gesture ended without a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AbortReason {
    /// The origin row no longer showed the dragged leaf.
    StaleOrigin,
    /// The host cancelled the gesture.
    Explicit,
    /// There was no gesture to end.
    NotDragging,
}

/// A committed drop whose order still has to reach the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSync {
    /// Hand back to [`EditorState::complete_sync`].
    pub ticket: u64,
    pub order: Vec<ItemId>,
    /// The same order as backend identifiers.
    pub wire_order: Vec<String>,
}

/// How a release resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReleaseOutcome {
    /// Released under the drag threshold. The host decides what a click does.
    Click { id: ItemId },
    /// The drop resolved to the origin.
    NoOp,
    /// The selection order changed locally; sync it.
    Committed(PendingSync),
    Aborted { reason: AbortReason },
}

/// Result of routing one pointer event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Nothing to do (press outside any leaf, move with no gesture).
    Ignored,
    Armed { index: usize },
    /// A move was tracked; `None` while still under the threshold.
    Moved(Option<LiveTarget>),
    Released(ReleaseOutcome),
}

/// Backend verdict on a [`PendingSync`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The backend stored this order.
    Confirmed(Vec<ItemId>),
    /// The sync failed; the local order stays as the working state.
    Failed(String),
}

/// Which tree a group toggle addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupScope {
    /// The filtered catalog tree with tri-state group controls.
    Catalog,
    /// The available pane (filtered, unselected).
    Available,
    /// The selected pane; every run of the group path is addressed.
    Selected,
}

/// A full dataset as delivered by the backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    /// Raw `available-items` rows.
    pub available: Vec<Value>,
    /// Names of the selected items, in authoritative order.
    pub selected: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
enum Deferred {
    Load(Dataset),
    CatalogRefresh(Vec<Value>),
    ReplaceSelection(Vec<String>),
}

// ---------------------------------------------------------------------------
// EditorState
// ---------------------------------------------------------------------------

/// Explicit application state for one editor.
#[derive(Debug, Default)]
pub struct EditorState {
    config: EditorConfig,
    drag_config: DragConfig,
    catalog: Catalog,
    store: SelectionStore,
    criteria: FilterCriteria,
    last_load: LoadReport,
    session: Option<DragSession>,
    /// Selected pane as left by the last drop.
    arranged: Option<HierarchyNode>,
    syncs_in_flight: BTreeSet<u64>,
    next_ticket: u64,
    deferred: VecDeque<Deferred>,
    version: u64,
}

impl EditorState {
    /// Create an empty editor.
    #[must_use]
    pub fn create(config: EditorConfig) -> Self {
        Self {
            drag_config: config.drag_config(),
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Selected ids in stored order.
    #[must_use]
    pub fn selection(&self) -> &[ItemId] {
        self.store.ids()
    }

    /// The selection as backend identifiers.
    #[must_use]
    pub fn wire_selection(&self) -> Vec<String> {
        self.wire_order(self.store.ids())
    }

    fn wire_order(&self, ids: &[ItemId]) -> Vec<String> {
        ids.iter()
            .map(|id| self.catalog.wire_name(id).to_string())
            .collect()
    }

    #[must_use]
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    #[must_use]
    pub fn last_load(&self) -> &LoadReport {
        &self.last_load
    }

    /// Monotonic counter bumped on every visible change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Bump the version after the selection changed, keeping external
    /// records in step with it.
    fn selection_changed(&mut self) {
        let store = &self.store;
        let dropped = self.catalog.retain_externals(|id| store.contains(id));
        if dropped > 0 {
            debug!(dropped, "dropped external records no longer selected");
        }
        for id in self.store.ids() {
            if self.catalog.ensure_external(id) {
                debug!(id = %id, "synthesized external record for selection");
            }
        }
        self.touch();
    }

    /// Whether wholesale updates are currently being queued.
    #[must_use]
    pub fn reorder_in_flight(&self) -> bool {
        self.session.as_ref().is_some_and(DragSession::is_dragging)
            || !self.syncs_in_flight.is_empty()
    }

    #[must_use]
    pub fn drag_phase(&self) -> DragPhase {
        match &self.session {
            Some(session) => session.phase(),
            None if !self.syncs_in_flight.is_empty() => DragPhase::Committing,
            None => DragPhase::Idle,
        }
    }

    #[must_use]
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Number of updates waiting for the latch to drop.
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Derive the current view.
    #[must_use]
    pub fn view(&self) -> ViewModel {
        ViewModel::derive_with_selected(
            &self.catalog,
            &self.store,
            &self.criteria,
            self.version,
            self.selected_pane(),
        )
    }

    /// The selected pane as currently rendered.
    ///
    /// This is the pane left by the last drop while its leaf order still
    /// matches the selection, and the run-grouped pane otherwise.
    #[must_use]
    pub fn selected_pane(&self) -> HierarchyNode {
        match &self.arranged {
            Some(pane) if pane.leaf_ids() == self.store.ids() => pane.clone(),
            _ => view::selected_pane(&self.catalog, &self.store),
        }
    }

    // --- Lifecycle ---------------------------------------------------------

    /// Replace catalog and selection with a freshly loaded dataset.
    pub fn load_dataset(&mut self, dataset: Dataset) -> UpdateDisposition {
        if self.reorder_in_flight() {
            debug!(queued = self.deferred.len(), "dataset load deferred behind active reorder");
            self.deferred.clear();
            self.deferred.push_back(Deferred::Load(dataset));
            return UpdateDisposition::Deferred;
        }
        self.apply_load(dataset);
        UpdateDisposition::Applied
    }

    fn apply_load(&mut self, dataset: Dataset) {
        let _span = debug_span!("load_dataset", rows = dataset.available.len()).entered();
        let (catalog, report) = Catalog::from_rows(&dataset.available);
        self.catalog = catalog;
        self.arranged = None;
        self.store.reset();
        let ids = self.resolve_names(&dataset.selected);
        self.store.replace(ids);
        info!(
            items = report.items,
            duplicate_names = report.duplicate_names,
            skipped_unnamed = report.skipped_unnamed,
            external = self.catalog.external_count(),
            selected = self.store.len(),
            "dataset loaded"
        );
        self.last_load = report;
        self.touch();
    }

    /// Drop everything: catalog, selection, filter, gesture, and queue.
    pub fn reset(&mut self) {
        self.catalog = Catalog::new();
        self.store.reset();
        self.criteria = FilterCriteria::default();
        self.last_load = LoadReport::default();
        self.session = None;
        self.arranged = None;
        self.syncs_in_flight.clear();
        self.deferred.clear();
        self.touch();
    }

    fn resolve_names(&mut self, names: &[String]) -> Vec<ItemId> {
        names
            .iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                let id = self.catalog.resolve_wire_name(name);
                if self.catalog.ensure_external(&id) {
                    debug!(id = %id, "synthesized external record for selection");
                }
                id
            })
            .collect()
    }

    // --- Wholesale updates -------------------------------------------------

    /// Replace the catalog, keeping the selection.
    ///
    /// Selected ids that vanish from the new catalog stay selected as
    /// external records.
    pub fn apply_catalog_refresh(&mut self, rows: Vec<Value>) -> UpdateDisposition {
        if self.reorder_in_flight() {
            let collapsed = self.deferred.iter_mut().find_map(|queued| match queued {
                Deferred::CatalogRefresh(existing) => Some(existing),
                _ => None,
            });
            match collapsed {
                Some(existing) => *existing = rows,
                None => self.deferred.push_back(Deferred::CatalogRefresh(rows)),
            }
            debug!(queued = self.deferred.len(), "catalog refresh deferred behind active reorder");
            return UpdateDisposition::Deferred;
        }
        self.refresh_catalog(rows);
        UpdateDisposition::Applied
    }

    fn refresh_catalog(&mut self, rows: Vec<Value>) {
        let (catalog, report) = Catalog::from_rows(&rows);
        self.catalog = catalog;
        self.arranged = None;
        let selected: Vec<ItemId> = self.store.ids().to_vec();
        for id in &selected {
            self.catalog.ensure_external(id);
        }
        info!(
            items = report.items,
            duplicate_names = report.duplicate_names,
            external = self.catalog.external_count(),
            "catalog refreshed"
        );
        self.last_load = report;
        self.touch();
    }

    /// Replace the selection wholesale from backend names, in order.
    pub fn replace_selection(&mut self, names: Vec<String>) -> UpdateDisposition {
        if self.reorder_in_flight() {
            self.deferred.push_back(Deferred::ReplaceSelection(names));
            debug!(queued = self.deferred.len(), "selection replacement deferred behind active reorder");
            return UpdateDisposition::Deferred;
        }
        self.apply_replace(&names);
        UpdateDisposition::Applied
    }

    fn apply_replace(&mut self, names: &[String]) {
        let ids = self.resolve_names(names);
        self.store.replace(ids);
        self.selection_changed();
    }

    /// Apply a backend undo: new selection order plus a catalog refresh.
    pub fn apply_backend_undo(
        &mut self,
        selected: Vec<String>,
        available: Vec<Value>,
    ) -> UpdateDisposition {
        let refreshed = self.apply_catalog_refresh(available);
        let replaced = self.replace_selection(selected);
        if refreshed == UpdateDisposition::Deferred || replaced == UpdateDisposition::Deferred {
            UpdateDisposition::Deferred
        } else {
            UpdateDisposition::Applied
        }
    }

    fn drain_deferred(&mut self) -> usize {
        if self.reorder_in_flight() || self.deferred.is_empty() {
            return 0;
        }
        let queued: Vec<Deferred> = self.deferred.drain(..).collect();
        debug!(count = queued.len(), "replaying deferred updates");
        let count = queued.len();
        for update in queued {
            match update {
                Deferred::Load(dataset) => self.apply_load(dataset),
                Deferred::CatalogRefresh(rows) => self.refresh_catalog(rows),
                Deferred::ReplaceSelection(names) => self.apply_replace(&names),
            }
        }
        count
    }

    // --- Filtering ---------------------------------------------------------

    /// Change the filter. Never touches the selection.
    pub fn set_filter(&mut self, criteria: FilterCriteria) {
        if self.criteria != criteria {
            self.criteria = criteria;
            self.touch();
        }
    }

    fn filtered(&self) -> impl Iterator<Item = &ItemRecord> {
        self.catalog
            .items()
            .iter()
            .filter(move |item| self.criteria.matches(item))
    }

    // --- Selection ---------------------------------------------------------

    /// Select or deselect one item. Unknown ids are selected anyway.
    pub fn toggle_item(&mut self, id: &ItemId, selected: bool) -> bool {
        let changed = self.store.toggle(id, selected);
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Select or deselect by backend name (external feed matches).
    pub fn toggle_name(&mut self, name: &str, selected: bool) -> bool {
        let id = self.catalog.resolve_wire_name(name);
        self.toggle_item(&id, selected)
    }

    /// Toggle every leaf of the group at `path`. Returns how many changed.
    pub fn toggle_group(&mut self, scope: GroupScope, path: &[&str], checked: bool) -> usize {
        let changed = match scope {
            GroupScope::Catalog => {
                let tree = hierarchy::build(self.filtered());
                match tree.find(path) {
                    Some(node) => reconcile::on_group_toggle(&mut self.store, node, checked),
                    None => 0,
                }
            }
            GroupScope::Available => {
                let tree = hierarchy::build(self.filtered().filter(|item| !self.store.contains(&item.id)));
                match tree.find(path) {
                    Some(node) => reconcile::on_group_toggle(&mut self.store, node, checked),
                    None => 0,
                }
            }
            GroupScope::Selected => {
                let pane = self.selected_pane();
                let runs = pane.find_all(path);
                reconcile::on_groups_toggle(&mut self.store, &runs, checked)
            }
        };
        if changed > 0 {
            self.selection_changed();
        }
        changed
    }

    /// Derived check state of the catalog group at `path`.
    #[must_use]
    pub fn group_state(&self, path: &[&str]) -> Option<ToggleState> {
        let tree = hierarchy::build(self.filtered());
        tree.find(path)
            .map(|node| reconcile::compute_group_state(&self.store, node))
    }

    /// Select everything in the available pane, in its leaf order.
    pub fn select_visible(&mut self) -> usize {
        let tree = hierarchy::build(self.filtered().filter(|item| !self.store.contains(&item.id)));
        let changed = reconcile::on_group_toggle(&mut self.store, &tree, true);
        if changed > 0 {
            self.selection_changed();
        }
        changed
    }

    /// Deselect every selected item that passes the current filter.
    pub fn deselect_visible(&mut self) -> usize {
        let visible: Vec<ItemId> = self
            .store
            .ids()
            .iter()
            .filter(|id| {
                self.catalog
                    .get(id.as_str())
                    .is_some_and(|item| self.criteria.matches(item))
            })
            .cloned()
            .collect();
        let changed = self.store.bulk_toggle(&visible, false);
        if changed > 0 {
            self.selection_changed();
        }
        changed
    }

    /// Clear the selection with a single-level undo snapshot.
    pub fn clear_selection(&mut self) -> bool {
        let changed = self.store.clear();
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Restore the selection from before the last clear.
    pub fn undo_clear(&mut self) -> bool {
        let changed = self.store.undo();
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Reconcile the stored order with an order the backend confirmed.
    pub fn confirm_order(&mut self, confirmed: &[ItemId]) {
        if self.store.reorder(confirmed).changed {
            self.selection_changed();
        }
    }

    // --- Lineage -----------------------------------------------------------

    /// Validate a lineage edit without applying it.
    ///
    /// Returns the trimmed lineage value.
    pub fn validate_lineage(&self, item_name: &str, lineage: &str) -> Result<String, LineageError> {
        let item_name = item_name.trim();
        if item_name.is_empty() {
            return Err(LineageError::Empty { field: "item_name" });
        }
        let lineage = lineage.trim();
        if lineage.is_empty() {
            return Err(LineageError::Empty { field: "lineage" });
        }
        if self.catalog.find_by_name(item_name).is_none() {
            return Err(LineageError::UnknownItem(item_name.to_string()));
        }
        Ok(lineage.to_string())
    }

    /// Patch an item's lineage in place. Selection is untouched.
    pub fn patch_lineage(&mut self, item_name: &str, lineage: &str) -> Result<ItemId, LineageError> {
        let lineage = self.validate_lineage(item_name, lineage)?;
        let id = self
            .catalog
            .patch_lineage(item_name, &lineage)
            .ok_or_else(|| LineageError::UnknownItem(item_name.trim().to_string()))?;
        debug!(id = %id, lineage = %lineage, "lineage patched");
        self.arranged = None;
        self.touch();
        Ok(id)
    }

    // --- Pointer gesture ---------------------------------------------------

    /// Route one pointer event.
    ///
    /// Hosts should flush their coalesced move before passing a release.
    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        probe: &dyn LayoutProbe,
    ) -> Result<PointerOutcome, DragError> {
        let at = event.position();
        match event.kind {
            PointerKind::Down => match probe.leaf_index_at(at.y) {
                Some(index) => {
                    self.pointer_down(index, at, probe)?;
                    Ok(PointerOutcome::Armed { index })
                }
                None => Ok(PointerOutcome::Ignored),
            },
            PointerKind::Move => Ok(self.pointer_move(at, probe)),
            PointerKind::Up => Ok(PointerOutcome::Released(self.pointer_up(at, probe))),
            PointerKind::Cancel => Ok(PointerOutcome::Released(self.pointer_cancel())),
        }
    }

    /// Press on the drag handle of the rendered leaf at `index`.
    pub fn pointer_down(
        &mut self,
        index: usize,
        at: Point,
        probe: &dyn LayoutProbe,
    ) -> Result<(), DragError> {
        if self.session.is_some() {
            return Err(DragError::AlreadyActive);
        }
        let slots = self.selected_pane().leaf_slots();
        self.session = Some(DragSession::arm(index, at, probe, &slots)?);
        Ok(())
    }

    /// Pointer moved. Latest position wins.
    pub fn pointer_move(&mut self, at: Point, probe: &dyn LayoutProbe) -> PointerOutcome {
        let slots = self.selected_pane().leaf_slots();
        let Some(session) = self.session.as_mut() else {
            return PointerOutcome::Ignored;
        };
        let previous = session.live_target().map(|target| target.index);
        match session.track(at, probe, &slots, &self.drag_config) {
            Tracking::Armed => PointerOutcome::Moved(None),
            Tracking::Target(target) => {
                if previous != Some(target.index) {
                    self.touch();
                }
                PointerOutcome::Moved(Some(target))
            }
            Tracking::Stale => {
                self.session = None;
                self.touch();
                self.drain_deferred();
                PointerOutcome::Released(ReleaseOutcome::Aborted {
                    reason: AbortReason::StaleOrigin,
                })
            }
        }
    }

    /// Release: click, no-op, commit, or stale abort.
    pub fn pointer_up(&mut self, at: Point, probe: &dyn LayoutProbe) -> ReleaseOutcome {
        let Some(session) = self.session.take() else {
            return ReleaseOutcome::Aborted {
                reason: AbortReason::NotDragging,
            };
        };
        let was_dragging = session.is_dragging();
        let mut pane = self.selected_pane();
        let slots = pane.leaf_slots();

        let outcome = match session.release(at, probe, &slots, &self.drag_config) {
            Release::Click(id) => ReleaseOutcome::Click { id },
            Release::NoOp => ReleaseOutcome::NoOp,
            Release::Stale => ReleaseOutcome::Aborted {
                reason: AbortReason::StaleOrigin,
            },
            Release::Drop(plan) => {
                let _span = debug_span!(
                    "drag_commit",
                    dragged = %plan.dragged_id,
                    from = plan.origin_index,
                    to = plan.target.index
                )
                .entered();
                match drag::apply_drop(&mut pane, &plan) {
                    Some(order) => {
                        self.store.reorder(&order);
                        let ticket = self.next_ticket;
                        self.next_ticket = self.next_ticket.wrapping_add(1);
                        self.syncs_in_flight.insert(ticket);
                        debug!(
                            ticket,
                            cross_container = plan.crosses_containers(),
                            "drop committed"
                        );
                        self.arranged = Some(pane);
                        ReleaseOutcome::Committed(PendingSync {
                            ticket,
                            wire_order: self.wire_order(&order),
                            order,
                        })
                    }
                    None => {
                        debug!("drop reference vanished from the selected pane; aborting");
                        ReleaseOutcome::Aborted {
                            reason: AbortReason::StaleOrigin,
                        }
                    }
                }
            }
        };

        if was_dragging || matches!(outcome, ReleaseOutcome::Committed(_)) {
            self.touch();
        }
        self.drain_deferred();
        outcome
    }

    /// Abort the gesture without side effects.
    pub fn pointer_cancel(&mut self) -> ReleaseOutcome {
        match self.session.take() {
            Some(session) => {
                debug!(dragged = %session.dragged_id(), "drag cancelled");
                if session.is_dragging() {
                    self.touch();
                }
                self.drain_deferred();
                ReleaseOutcome::Aborted {
                    reason: AbortReason::Explicit,
                }
            }
            None => ReleaseOutcome::Aborted {
                reason: AbortReason::NotDragging,
            },
        }
    }

    /// Finish the committing phase of a drop, whatever the sync result.
    ///
    /// Returns how many deferred updates were replayed.
    pub fn complete_sync(&mut self, ticket: u64, outcome: SyncOutcome) -> usize {
        if !self.syncs_in_flight.remove(&ticket) {
            debug!(ticket, "completion for unknown sync ticket");
        }
        match outcome {
            SyncOutcome::Confirmed(order) => self.confirm_order(&order),
            SyncOutcome::Failed(reason) => {
                debug!(ticket, reason = %reason, "sync failed; keeping local order");
            }
        }
        self.drain_deferred()
    }
}
