#![forbid(unsafe_code)]

//! Group toggle reconciliation.
//!
//! A group control never owns state. Its check state is derived from the
//! selection on every pass ([`compute_group_state`], [`annotate`]), and
//! toggling it fans out into leaf toggles ([`on_group_toggle`]).

use tagdeck_core::{HierarchyNode, ItemId, ToggleState};

use crate::selection::SelectionStore;

/// Toggle every leaf under `node`, in the node's leaf order.
///
/// Returns how many leaves changed state.
pub fn on_group_toggle(store: &mut SelectionStore, node: &HierarchyNode, checked: bool) -> usize {
    let leaves = node.leaf_ids();
    store.bulk_toggle(&leaves, checked)
}

/// Toggle the leaves of several nodes as one batch, in the given node order.
///
/// Used for the selected pane, where one group path can appear as several runs.
pub fn on_groups_toggle(
    store: &mut SelectionStore,
    nodes: &[&HierarchyNode],
    checked: bool,
) -> usize {
    let leaves: Vec<ItemId> = nodes.iter().flat_map(|node| node.leaf_ids()).collect();
    store.bulk_toggle(&leaves, checked)
}

/// Checked iff every leaf is selected, unchecked iff none is.
///
/// A group with no leaves is unchecked.
#[must_use]
pub fn compute_group_state(store: &SelectionStore, node: &HierarchyNode) -> ToggleState {
    let (selected, total) = count(store, node);
    state_of(selected, total)
}

/// Write derived toggle states onto every node of `root`.
pub fn annotate(store: &SelectionStore, root: &mut HierarchyNode) {
    annotate_node(store, root);
}

fn annotate_node(store: &SelectionStore, node: &mut HierarchyNode) -> (usize, usize) {
    let counts = match node.item_id() {
        Some(id) => (usize::from(store.contains(id)), 1),
        None => node
            .children_mut()
            .iter_mut()
            .map(|child| annotate_node(store, child))
            .fold((0, 0), |(s, t), (cs, ct)| (s + cs, t + ct)),
    };
    node.set_derived_toggle(state_of(counts.0, counts.1));
    counts
}

fn count(store: &SelectionStore, node: &HierarchyNode) -> (usize, usize) {
    match node.item_id() {
        Some(id) => (usize::from(store.contains(id)), 1),
        None => node
            .children()
            .iter()
            .map(|child| count(store, child))
            .fold((0, 0), |(s, t), (cs, ct)| (s + cs, t + ct)),
    }
}

fn state_of(selected: usize, total: usize) -> ToggleState {
    if total > 0 && selected == total {
        ToggleState::Checked
    } else if selected == 0 {
        ToggleState::Unchecked
    } else {
        ToggleState::Indeterminate
    }
}
