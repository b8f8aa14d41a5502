#![forbid(unsafe_code)]

//! Drag-to-reorder for the selected pane.
//!
//! A [`DragSession`] lives from press to release. It works on logical leaf
//! indices only. Geometry comes from the host through a [`LayoutProbe`],
//! and container identity comes from the selected pane's [`LeafSlot`]s.
//!
//! # Design
//!
//! ```text
//! Idle ──press──▶ Armed ──moved past threshold──▶ Dragging ──release──▶ Committing ──sync done──▶ Idle
//!                   │                                │
//!                   └──release──▶ Click              └──stale origin / cancel──▶ Cancelled ──▶ Idle
//! ```
//!
//! The insertion point is the first rendered leaf whose vertical midpoint
//! lies below the pointer, or "append" past the last leaf. Indices are
//! flattened across every container in visual order, so a drop may land in
//! a different bucket than the one the drag started in.
//!
//! # Invariants
//!
//! 1. `origin_index` and every target index are positions in the flat
//!    visual order of the selected pane, never per-container positions.
//! 2. A resolved target equal to the origin is a no-op. Dropping just below
//!    oneself resolves to the origin, so a self-drop cannot move the leaf.
//! 3. The origin's id and displayed text are re-checked against the live
//!    layout on every tracked move and on release.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Press on an unrendered index | Host hit-test raced a re-render | [`DragError::IndexOutOfRange`] |
//! | Origin text changed | Refresh or filter replaced the row | Abort as stale, `debug!` logged |
//! | Reference leaf vanished at commit | Layout and selection disagree | Abort as stale |

use serde::{Deserialize, Serialize};
use tagdeck_core::{ContainerKey, HierarchyNode, ItemId, LeafSlot, Point, RowBounds};
use tracing::debug;

use crate::error::DragError;

// ---------------------------------------------------------------------------
// DragConfig
// ---------------------------------------------------------------------------

/// How pointer travel is interpreted as a drag versus a click.
#[derive(Clone, Debug, PartialEq)]
pub struct DragConfig {
    /// Travel in pixels that must be exceeded before a drag starts (default: 5).
    pub threshold_px: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self { threshold_px: 5.0 }
    }
}

impl DragConfig {
    #[must_use]
    pub fn with_threshold(mut self, px: f64) -> Self {
        self.threshold_px = px;
        self
    }
}

// ---------------------------------------------------------------------------
// LayoutProbe
// ---------------------------------------------------------------------------

/// One rendered selected-pane leaf as the host sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderedLeaf {
    pub id: ItemId,
    /// Text currently displayed in the row.
    pub text: String,
    pub bounds: RowBounds,
}

/// Geometry query into the host's rendered selected pane.
pub trait LayoutProbe {
    /// Number of rendered leaves.
    fn leaf_count(&self) -> usize;

    /// The leaf at `index` in visual order.
    fn leaf_at(&self, index: usize) -> Option<RenderedLeaf>;

    /// Index of the leaf whose row contains `y`.
    fn leaf_index_at(&self, y: f64) -> Option<usize> {
        (0..self.leaf_count()).find(|&i| {
            self.leaf_at(i)
                .is_some_and(|leaf| leaf.bounds.contains_y(y))
        })
    }
}

/// Uniform rows stacked from a top offset.
///
/// Hosts with fixed-height rows can hand this over instead of querying
/// their layout engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StackedLayout {
    leaves: Vec<RenderedLeaf>,
}

impl StackedLayout {
    /// Rows of `row_height` starting at `top`, one per `(id, text)`.
    #[must_use]
    pub fn new<I, S>(rows: I, top: f64, row_height: f64) -> Self
    where
        I: IntoIterator<Item = (ItemId, S)>,
        S: Into<String>,
    {
        let leaves = rows
            .into_iter()
            .enumerate()
            .map(|(i, (id, text))| RenderedLeaf {
                id,
                text: text.into(),
                bounds: RowBounds::new(top + i as f64 * row_height, row_height),
            })
            .collect();
        Self { leaves }
    }

    /// Rows with explicit bounds.
    #[must_use]
    pub fn from_leaves(leaves: Vec<RenderedLeaf>) -> Self {
        Self { leaves }
    }

    #[must_use]
    pub fn leaves(&self) -> &[RenderedLeaf] {
        &self.leaves
    }
}

impl LayoutProbe for StackedLayout {
    fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    fn leaf_at(&self, index: usize) -> Option<RenderedLeaf> {
        self.leaves.get(index).cloned()
    }
}

// ---------------------------------------------------------------------------
// Insertion math
// ---------------------------------------------------------------------------

/// Where a dragged leaf would be inserted, before removal of the leaf itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InsertionPoint {
    /// Before the rendered leaf at this index.
    Before(usize),
    /// After the last rendered leaf.
    Append,
}

impl InsertionPoint {
    /// Slot index in `0..=leaf_count`.
    #[must_use]
    pub fn slot(self, leaf_count: usize) -> usize {
        match self {
            Self::Before(i) => i,
            Self::Append => leaf_count,
        }
    }
}

/// Find the first leaf whose vertical midpoint exceeds `y`.
#[must_use]
pub fn insertion_point(probe: &dyn LayoutProbe, y: f64) -> InsertionPoint {
    (0..probe.leaf_count())
        .find(|&i| probe.leaf_at(i).is_some_and(|leaf| leaf.bounds.midpoint() > y))
        .map_or(InsertionPoint::Append, InsertionPoint::Before)
}

/// Final index of the dragged leaf once it is removed and reinserted at `slot`.
#[must_use]
pub fn resolve_target(origin: usize, slot: usize) -> usize {
    if slot > origin { slot - 1 } else { slot }
}

// ---------------------------------------------------------------------------
// DragSession
// ---------------------------------------------------------------------------

/// Observable gesture phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DragPhase {
    #[default]
    Idle,
    Armed,
    Dragging,
    /// A drop was committed locally and its sync has not finished.
    Committing,
}

/// The live drop target while dragging.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LiveTarget {
    /// Resolved index of the dragged leaf after the drop.
    pub index: usize,
    pub insertion: InsertionPoint,
    /// The leaf the dragged one will be placed before, if not appending.
    pub reference: Option<ItemId>,
    /// Container that will receive the leaf.
    pub container: Option<ContainerKey>,
}

/// Result of feeding a pointer position to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tracking {
    /// Still under the drag threshold.
    Armed,
    /// Dragging toward the given target.
    Target(LiveTarget),
    /// The origin row no longer shows the dragged leaf.
    Stale,
}

/// A drop ready to apply to the selected pane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropPlan {
    pub dragged_id: ItemId,
    pub origin_index: usize,
    pub origin_container: ContainerKey,
    pub target: LiveTarget,
}

impl DropPlan {
    /// Whether the drop moves the leaf into a different container.
    #[must_use]
    pub fn crosses_containers(&self) -> bool {
        self.target
            .container
            .as_ref()
            .is_some_and(|target| *target != self.origin_container)
    }
}

/// What a release resolves to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Release {
    /// Released under the threshold.
    Click(ItemId),
    /// Target resolves to the origin.
    NoOp,
    Drop(DropPlan),
    Stale,
}

/// One press-to-release gesture on a selected-pane leaf.
#[derive(Clone, Debug)]
pub struct DragSession {
    dragged_id: ItemId,
    origin_text: String,
    origin_index: usize,
    origin_container: ContainerKey,
    start: Point,
    current: Point,
    dragging: bool,
    live_target: Option<LiveTarget>,
}

impl DragSession {
    /// Arm a session on the rendered leaf at `index`.
    ///
    /// Captures the leaf's identity for later validity checks.
    pub fn arm(
        index: usize,
        at: Point,
        probe: &dyn LayoutProbe,
        slots: &[LeafSlot],
    ) -> Result<Self, DragError> {
        let rendered = probe.leaf_count();
        let leaf = probe
            .leaf_at(index)
            .filter(|_| index < rendered)
            .ok_or(DragError::IndexOutOfRange { index, rendered })?;
        let origin_container = slots
            .iter()
            .find(|slot| slot.id == leaf.id)
            .map(|slot| slot.container.clone())
            .ok_or_else(|| DragError::NotSelected(leaf.id.clone()))?;

        Ok(Self {
            dragged_id: leaf.id,
            origin_text: leaf.text,
            origin_index: index,
            origin_container,
            start: at,
            current: at,
            dragging: false,
            live_target: None,
        })
    }

    #[must_use]
    pub fn dragged_id(&self) -> &ItemId {
        &self.dragged_id
    }

    #[must_use]
    pub fn origin_index(&self) -> usize {
        self.origin_index
    }

    #[must_use]
    pub fn origin_container(&self) -> &ContainerKey {
        &self.origin_container
    }

    #[must_use]
    pub fn live_target(&self) -> Option<&LiveTarget> {
        self.live_target.as_ref()
    }

    /// Pointer travel since the press.
    #[must_use]
    pub fn pointer_delta(&self) -> (f64, f64) {
        self.current.delta_from(self.start)
    }

    #[must_use]
    pub fn phase(&self) -> DragPhase {
        if self.dragging {
            DragPhase::Dragging
        } else {
            DragPhase::Armed
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Feed the latest pointer position.
    pub fn track(
        &mut self,
        at: Point,
        probe: &dyn LayoutProbe,
        slots: &[LeafSlot],
        config: &DragConfig,
    ) -> Tracking {
        self.current = at;
        if !self.dragging {
            if self.start.distance(at) <= config.threshold_px {
                return Tracking::Armed;
            }
            self.dragging = true;
            debug!(dragged = %self.dragged_id, origin_index = self.origin_index, "drag started");
        }

        if !self.origin_is_live(probe) {
            return Tracking::Stale;
        }

        let count = probe.leaf_count();
        let insertion = insertion_point(probe, at.y);
        let index = resolve_target(self.origin_index, insertion.slot(count));
        let reference = match insertion {
            InsertionPoint::Before(i) => probe.leaf_at(i).map(|leaf| leaf.id),
            InsertionPoint::Append => None,
        };
        let container = match &reference {
            Some(id) => slots
                .iter()
                .find(|slot| slot.id == *id)
                .map(|slot| slot.container.clone()),
            None => slots.last().map(|slot| slot.container.clone()),
        };

        let target = LiveTarget {
            index,
            insertion,
            reference,
            container,
        };
        self.live_target = Some(target.clone());
        Tracking::Target(target)
    }

    /// Resolve the gesture at release position `at`. Consumes the session.
    pub fn release(
        mut self,
        at: Point,
        probe: &dyn LayoutProbe,
        slots: &[LeafSlot],
        config: &DragConfig,
    ) -> Release {
        match self.track(at, probe, slots, config) {
            Tracking::Armed => Release::Click(self.dragged_id),
            Tracking::Stale => Release::Stale,
            Tracking::Target(target) if target.index == self.origin_index => Release::NoOp,
            Tracking::Target(target) => Release::Drop(DropPlan {
                dragged_id: self.dragged_id,
                origin_index: self.origin_index,
                origin_container: self.origin_container,
                target,
            }),
        }
    }

    fn origin_is_live(&self, probe: &dyn LayoutProbe) -> bool {
        let live = probe.leaf_at(self.origin_index);
        let valid = live
            .as_ref()
            .is_some_and(|leaf| leaf.id == self.dragged_id && leaf.text == self.origin_text);
        if !valid {
            debug!(
                dragged = %self.dragged_id,
                origin_index = self.origin_index,
                rendered = ?live.map(|leaf| leaf.id),
                "drag origin no longer matches the rendered row; aborting"
            );
        }
        valid
    }
}

/// Apply `plan` to a selected pane and return the new flat order.
///
/// The leaf is moved into the reference leaf's container, or the last
/// container when appending. Its own fields are not touched; the move only
/// changes display order. Returns `None` if the pane no longer holds the
/// dragged or reference leaf.
pub fn apply_drop(pane: &mut HierarchyNode, plan: &DropPlan) -> Option<Vec<ItemId>> {
    let mut working = pane.clone();
    let leaf = working.detach_leaf(&plan.dragged_id)?;
    let placed = match &plan.target.reference {
        Some(reference) => working.insert_leaf_before(reference, leaf),
        None => working.append_to_last_container(leaf),
    };
    if placed.is_err() {
        return None;
    }
    working.prune_empty();
    let order = working.leaf_ids();
    *pane = working;
    Some(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tagdeck_core::{ItemRecord, hierarchy};

    fn rec(id: &str, vendor: &str) -> ItemRecord {
        ItemRecord::new(id, id).with_vendor(vendor)
    }

    fn items() -> Vec<ItemRecord> {
        vec![rec("A", "Acme"), rec("B", "Acme"), rec("C", "Zeta")]
    }

    fn layout(records: &[ItemRecord]) -> StackedLayout {
        StackedLayout::new(
            records.iter().map(|r| (r.id.clone(), r.name.clone())),
            0.0,
            20.0,
        )
    }

    fn ids(names: &[&str]) -> Vec<ItemId> {
        names.iter().map(|n| ItemId::new(*n)).collect()
    }

    // =======================================================================
    // Insertion math
    // =======================================================================

    #[test]
    fn insertion_point_uses_midpoints() {
        let probe = layout(&items());
        assert_eq!(insertion_point(&probe, 0.0), InsertionPoint::Before(0));
        assert_eq!(insertion_point(&probe, 9.9), InsertionPoint::Before(0));
        assert_eq!(insertion_point(&probe, 10.0), InsertionPoint::Before(1));
        assert_eq!(insertion_point(&probe, 49.0), InsertionPoint::Before(2));
        assert_eq!(insertion_point(&probe, 50.0), InsertionPoint::Append);
        assert_eq!(insertion_point(&probe, 500.0), InsertionPoint::Append);
    }

    #[test]
    fn resolve_target_accounts_for_removal() {
        assert_eq!(resolve_target(2, 0), 0);
        assert_eq!(resolve_target(0, 3), 2);
        assert_eq!(resolve_target(1, 1), 1);
        assert_eq!(resolve_target(1, 2), 1);
    }

    #[test]
    fn leaf_index_at_hit_tests_rows() {
        let probe = layout(&items());
        assert_eq!(probe.leaf_index_at(25.0), Some(1));
        assert_eq!(probe.leaf_index_at(61.0), None);
    }

    // =======================================================================
    // Session
    // =======================================================================

    #[test]
    fn arm_rejects_unrendered_index() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records).leaf_slots();
        let err = DragSession::arm(7, Point::default(), &probe, &slots).unwrap_err();
        assert_eq!(err, DragError::IndexOutOfRange { index: 7, rendered: 3 });
    }

    #[test]
    fn arm_rejects_unselected_leaf() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records[..2]).leaf_slots();
        let err = DragSession::arm(2, Point::default(), &probe, &slots).unwrap_err();
        assert_eq!(err, DragError::NotSelected(ItemId::new("C")));
    }

    #[test]
    fn small_travel_is_a_click() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records).leaf_slots();
        let config = DragConfig::default();
        let session = DragSession::arm(1, Point::new(5.0, 30.0), &probe, &slots).unwrap();
        let release = session.release(Point::new(8.0, 33.0), &probe, &slots, &config);
        assert_eq!(release, Release::Click(ItemId::new("B")));
    }

    #[test]
    fn threshold_must_be_exceeded() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records).leaf_slots();
        let config = DragConfig::default();
        let mut session = DragSession::arm(0, Point::new(0.0, 5.0), &probe, &slots).unwrap();
        assert_eq!(session.track(Point::new(0.0, 10.0), &probe, &slots, &config), Tracking::Armed);
        assert_eq!(session.phase(), DragPhase::Armed);
        assert!(matches!(
            session.track(Point::new(0.0, 10.1), &probe, &slots, &config),
            Tracking::Target(_)
        ));
        assert_eq!(session.phase(), DragPhase::Dragging);
    }

    #[test]
    fn dragging_last_to_first_targets_zero_across_containers() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records).leaf_slots();
        let config = DragConfig::default();
        let session = DragSession::arm(2, Point::new(0.0, 50.0), &probe, &slots).unwrap();
        let Release::Drop(plan) = session.release(Point::new(0.0, 2.0), &probe, &slots, &config)
        else {
            panic!("expected drop");
        };
        assert_eq!(plan.target.index, 0);
        assert_eq!(plan.target.reference, Some(ItemId::new("A")));
        assert!(plan.crosses_containers());
    }

    #[test]
    fn dropping_onto_self_is_noop() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records).leaf_slots();
        let config = DragConfig::default();
        for y in [12.0, 35.0, 49.0] {
            let session = DragSession::arm(1, Point::new(0.0, 30.0), &probe, &slots).unwrap();
            let release = session.release(Point::new(40.0, y), &probe, &slots, &config);
            assert_eq!(release, Release::NoOp, "y = {y}");
        }
    }

    #[test]
    fn changed_origin_text_is_stale() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records).leaf_slots();
        let config = DragConfig::default();
        let mut session = DragSession::arm(0, Point::new(0.0, 5.0), &probe, &slots).unwrap();

        let refreshed = StackedLayout::new(
            [
                (ItemId::new("A"), "A (renamed)"),
                (ItemId::new("B"), "B"),
                (ItemId::new("C"), "C"),
            ],
            0.0,
            20.0,
        );
        assert_eq!(
            session.track(Point::new(0.0, 45.0), &refreshed, &slots, &config),
            Tracking::Stale
        );
    }

    #[test]
    fn pointer_delta_tracks_travel() {
        let records = items();
        let probe = layout(&records);
        let slots = hierarchy::build_ordered(&records).leaf_slots();
        let mut session = DragSession::arm(0, Point::new(1.0, 1.0), &probe, &slots).unwrap();
        session.track(Point::new(4.0, 31.0), &probe, &slots, &DragConfig::default());
        assert_eq!(session.pointer_delta(), (3.0, 30.0));
        assert_eq!(session.live_target().map(|t| t.index), Some(1));
    }

    // =======================================================================
    // apply_drop
    // =======================================================================

    #[test]
    fn apply_drop_moves_leaf_and_flattens() {
        let records = items();
        let probe = layout(&records);
        let mut pane = hierarchy::build_ordered(&records);
        let slots = pane.leaf_slots();
        let config = DragConfig::default();

        let session = DragSession::arm(2, Point::new(0.0, 50.0), &probe, &slots).unwrap();
        let Release::Drop(plan) = session.release(Point::new(0.0, 0.0), &probe, &slots, &config)
        else {
            panic!("expected drop");
        };
        let order = apply_drop(&mut pane, &plan).unwrap();
        assert_eq!(order, ids(&["C", "A", "B"]));
        assert_eq!(pane.leaf_ids(), order);
    }

    #[test]
    fn apply_drop_appends_to_last_container() {
        let records = items();
        let probe = layout(&records);
        let mut pane = hierarchy::build_ordered(&records);
        let slots = pane.leaf_slots();
        let config = DragConfig::default();

        let session = DragSession::arm(0, Point::new(0.0, 5.0), &probe, &slots).unwrap();
        let Release::Drop(plan) = session.release(Point::new(0.0, 90.0), &probe, &slots, &config)
        else {
            panic!("expected drop");
        };
        assert_eq!(plan.target.index, 2);
        assert_eq!(apply_drop(&mut pane, &plan).unwrap(), ids(&["B", "C", "A"]));
    }

    #[test]
    fn apply_drop_with_missing_reference_leaves_pane_alone() {
        let records = items();
        let mut pane = hierarchy::build_ordered(&records);
        let before = pane.clone();
        let plan = DropPlan {
            dragged_id: ItemId::new("A"),
            origin_index: 0,
            origin_container: pane.leaf_slots()[0].container.clone(),
            target: LiveTarget {
                index: 1,
                insertion: InsertionPoint::Before(2),
                reference: Some(ItemId::new("gone")),
                container: None,
            },
        };
        assert!(apply_drop(&mut pane, &plan).is_none());
        assert_eq!(pane, before);
    }
}
