#![forbid(unsafe_code)]

//! The selection store: the ordered list of selected item ids.
//!
//! # Invariants
//!
//! 1. No id appears twice; a companion set mirrors the ordered list.
//! 2. Order is significant. It is what the backend and the selected pane see.
//! 3. Membership is independent of the filter. Nothing here reads filters.
//! 4. [`SelectionStore::reorder`] never loses a member. Ids missing from the
//!    proposed order are re-appended in their prior relative order.
//!
//! # Failure Modes
//!
//! | Input | Behavior |
//! |-------|----------|
//! | Toggle of an unknown id | Added anyway (external selections) |
//! | Reorder with missing ids | Missing ids re-appended, `warn!` logged |
//! | Reorder with unknown or repeated ids | Extras ignored, `warn!` logged |
//! | Undo with no snapshot | No-op |

use std::collections::HashSet;

use tagdeck_core::ItemId;
use tracing::warn;

/// What [`SelectionStore::reorder`] had to fix up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderReport {
    /// Previously-selected ids the proposal left out, re-appended at the end.
    pub reincluded: usize,
    /// Proposed ids that were not members, or repeated.
    pub ignored: usize,
    /// Whether the stored order changed.
    pub changed: bool,
}

impl ReorderReport {
    /// Whether the proposal was an exact permutation of the membership.
    #[must_use]
    pub fn was_permutation(&self) -> bool {
        self.reincluded == 0 && self.ignored == 0
    }
}

/// Ordered, duplicate-free selection with single-level clear/undo.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    ordered: Vec<ItemId>,
    members: HashSet<ItemId>,
    snapshot: Option<Vec<ItemId>>,
    version: u64,
}

impl SelectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding `ids` in order, later repeats dropped.
    #[must_use]
    pub fn from_order(ids: impl IntoIterator<Item = ItemId>) -> Self {
        let mut store = Self::new();
        for id in ids {
            store.push(id);
        }
        store
    }

    fn push(&mut self, id: ItemId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.ordered.push(id);
        true
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Selected ids in stored order.
    #[must_use]
    pub fn ids(&self) -> &[ItemId] {
        &self.ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.members.contains(id)
    }

    #[must_use]
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        self.ordered.iter().position(|member| member == id)
    }

    /// Incremented on every effective mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether a clear can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Move `id` into the desired state. Returns whether anything changed.
    ///
    /// Selecting appends at the end; deselecting keeps the remainder's order.
    pub fn toggle(&mut self, id: &ItemId, selected: bool) -> bool {
        let changed = if selected {
            self.push(id.clone())
        } else if self.members.remove(id) {
            self.ordered.retain(|member| member != id);
            true
        } else {
            false
        };
        if changed {
            self.bump();
        }
        changed
    }

    /// Toggle each id in the given order. Returns how many changed.
    pub fn bulk_toggle<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a ItemId>,
        selected: bool,
    ) -> usize {
        if selected {
            let mut added = 0;
            for id in ids {
                if self.push(id.clone()) {
                    added += 1;
                }
            }
            if added > 0 {
                self.bump();
            }
            return added;
        }

        let doomed: HashSet<&ItemId> = ids.into_iter().filter(|id| self.contains(id)).collect();
        if doomed.is_empty() {
            return 0;
        }
        self.ordered.retain(|member| !doomed.contains(member));
        for id in &doomed {
            self.members.remove(*id);
        }
        self.bump();
        doomed.len()
    }

    /// Replace the order with `proposed`, reconciling it against membership.
    ///
    /// Membership never changes here: unknown ids are ignored and missing
    /// members are re-appended.
    pub fn reorder(&mut self, proposed: &[ItemId]) -> ReorderReport {
        let mut report = ReorderReport::default();
        let mut placed: HashSet<&ItemId> = HashSet::with_capacity(self.ordered.len());
        let mut next: Vec<ItemId> = Vec::with_capacity(self.ordered.len());

        for id in proposed {
            if self.members.contains(id) && placed.insert(id) {
                next.push(id.clone());
            } else {
                report.ignored += 1;
            }
        }
        for id in &self.ordered {
            if !placed.contains(id) {
                next.push(id.clone());
                report.reincluded += 1;
            }
        }

        if !report.was_permutation() {
            warn!(
                reincluded = report.reincluded,
                ignored = report.ignored,
                "reorder was not a permutation of the selection; reconciled"
            );
        }

        report.changed = next != self.ordered;
        if report.changed {
            self.ordered = next;
            self.bump();
        }
        report
    }

    /// Replace membership and order wholesale. Repeats are dropped.
    ///
    /// Discards any undo snapshot; the replacement is authoritative.
    pub fn replace(&mut self, ids: impl IntoIterator<Item = ItemId>) {
        let fresh = Self::from_order(ids);
        self.ordered = fresh.ordered;
        self.members = fresh.members;
        self.snapshot = None;
        self.bump();
    }

    /// Empty the selection, keeping a snapshot for [`SelectionStore::undo`].
    ///
    /// Returns `false` (and keeps the previous snapshot) if already empty.
    pub fn clear(&mut self) -> bool {
        if self.ordered.is_empty() {
            return false;
        }
        self.snapshot = Some(std::mem::take(&mut self.ordered));
        self.members.clear();
        self.bump();
        true
    }

    /// Restore the snapshot taken by the last [`SelectionStore::clear`].
    ///
    /// Single level: the snapshot is consumed.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.snapshot.take() else {
            return false;
        };
        self.members = snapshot.iter().cloned().collect();
        self.ordered = snapshot;
        self.bump();
        true
    }

    /// Drop everything, including the undo snapshot.
    pub fn reset(&mut self) {
        self.ordered.clear();
        self.members.clear();
        self.snapshot = None;
        self.bump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(names: &[&str]) -> Vec<ItemId> {
        names.iter().map(|n| ItemId::new(*n)).collect()
    }

    fn store(names: &[&str]) -> SelectionStore {
        SelectionStore::from_order(ids(names))
    }

    // =======================================================================
    // toggle
    // =======================================================================

    #[test]
    fn toggle_appends_and_removes() {
        let mut s = SelectionStore::new();
        assert!(s.toggle(&ItemId::new("A"), true));
        assert!(s.toggle(&ItemId::new("B"), true));
        assert!(s.toggle(&ItemId::new("C"), true));
        assert_eq!(s.ids(), ids(&["A", "B", "C"]).as_slice());

        assert!(s.toggle(&ItemId::new("B"), false));
        assert_eq!(s.ids(), ids(&["A", "C"]).as_slice());
    }

    #[test]
    fn toggle_is_idempotent() {
        let mut s = store(&["A"]);
        let version = s.version();
        assert!(!s.toggle(&ItemId::new("A"), true));
        assert!(!s.toggle(&ItemId::new("Z"), false));
        assert_eq!(s.version(), version);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn bulk_toggle_keeps_untouched_order() {
        let mut s = store(&["C", "A"]);
        let added = s.bulk_toggle(&ids(&["A", "B", "D"]), true);
        assert_eq!(added, 2);
        assert_eq!(s.ids(), ids(&["C", "A", "B", "D"]).as_slice());

        let removed = s.bulk_toggle(&ids(&["A", "D", "Q"]), false);
        assert_eq!(removed, 2);
        assert_eq!(s.ids(), ids(&["C", "B"]).as_slice());
    }

    // =======================================================================
    // reorder
    // =======================================================================

    #[test]
    fn reorder_permutation() {
        let mut s = store(&["A", "B", "C"]);
        let report = s.reorder(&ids(&["C", "A", "B"]));
        assert!(report.was_permutation());
        assert!(report.changed);
        assert_eq!(s.ids(), ids(&["C", "A", "B"]).as_slice());
    }

    #[test]
    fn reorder_reincludes_missing_members() {
        let mut s = store(&["A", "B", "C", "D"]);
        let report = s.reorder(&ids(&["D", "B"]));
        assert_eq!(report.reincluded, 2);
        assert_eq!(s.ids(), ids(&["D", "B", "A", "C"]).as_slice());
    }

    #[test]
    fn reorder_ignores_strangers_and_repeats() {
        let mut s = store(&["A", "B"]);
        let report = s.reorder(&ids(&["B", "X", "B", "A"]));
        assert_eq!(report.ignored, 2);
        assert_eq!(report.reincluded, 0);
        assert_eq!(s.ids(), ids(&["B", "A"]).as_slice());
        assert!(!s.contains(&ItemId::new("X")));
    }

    #[test]
    fn identical_reorder_does_not_bump_version() {
        let mut s = store(&["A", "B"]);
        let version = s.version();
        assert!(!s.reorder(&ids(&["A", "B"])).changed);
        assert_eq!(s.version(), version);
    }

    // =======================================================================
    // clear / undo / replace
    // =======================================================================

    #[test]
    fn clear_then_undo_restores_exactly() {
        let mut s = store(&["C", "A", "B"]);
        assert!(s.clear());
        assert!(s.is_empty());
        assert!(s.can_undo());
        assert!(s.undo());
        assert_eq!(s.ids(), ids(&["C", "A", "B"]).as_slice());
        assert!(s.contains(&ItemId::new("A")));
    }

    #[test]
    fn undo_is_single_level() {
        let mut s = store(&["A"]);
        s.clear();
        assert!(s.undo());
        assert!(!s.undo());
        assert_eq!(s.ids(), ids(&["A"]).as_slice());
    }

    #[test]
    fn clearing_empty_store_keeps_snapshot() {
        let mut s = store(&["A"]);
        s.clear();
        assert!(!s.clear());
        assert!(s.undo());
        assert_eq!(s.ids(), ids(&["A"]).as_slice());
    }

    #[test]
    fn replace_is_wholesale_and_drops_snapshot() {
        let mut s = store(&["A"]);
        s.clear();
        s.replace(ids(&["Z", "Y", "Z"]));
        assert_eq!(s.ids(), ids(&["Z", "Y"]).as_slice());
        assert!(!s.can_undo());
    }

    #[test]
    fn position_reports_index() {
        let s = store(&["A", "B"]);
        assert_eq!(s.position(&ItemId::new("B")), Some(1));
        assert_eq!(s.position(&ItemId::new("Q")), None);
    }
}
