#![forbid(unsafe_code)]

//! Derived view state.
//!
//! A [`ViewModel`] is a pure function of (catalog, filter, selection). It is
//! rebuilt whenever the editor version moves and thrown away after the
//! render pass.

use serde::Serialize;
use tagdeck_core::{Catalog, FilterCriteria, FilterOptions, HierarchyNode, ItemRecord, hierarchy};

use crate::reconcile;
use crate::selection::SelectionStore;

/// Item counts shown next to the pane headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewCounts {
    /// Records in the loaded catalog.
    pub catalog: usize,
    /// Records passing the filter.
    pub filtered: usize,
    /// Leaves in the available pane.
    pub available: usize,
    /// Members of the selection.
    pub selected: usize,
}

/// Everything a render pass needs.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// Editor version this view was derived from.
    pub version: u64,
    /// Filtered, unselected items in canonical sort order.
    pub available: HierarchyNode,
    /// Every selected item in stored order, grouped by runs.
    pub selected: HierarchyNode,
    /// Filtered items in canonical order, with derived group toggle states.
    pub catalog: HierarchyNode,
    pub counts: ViewCounts,
    pub filter_options: FilterOptions,
}

impl ViewModel {
    /// Derive the view for the given state.
    #[must_use]
    pub fn derive(
        catalog: &Catalog,
        store: &SelectionStore,
        criteria: &FilterCriteria,
        version: u64,
    ) -> Self {
        Self::derive_with_selected(
            catalog,
            store,
            criteria,
            version,
            selected_pane(catalog, store),
        )
    }

    /// Derive the view around an already arranged selected pane.
    #[must_use]
    pub fn derive_with_selected(
        catalog: &Catalog,
        store: &SelectionStore,
        criteria: &FilterCriteria,
        version: u64,
        selected: HierarchyNode,
    ) -> Self {
        let filtered: Vec<&ItemRecord> = catalog
            .items()
            .iter()
            .filter(|item| criteria.matches(item))
            .collect();

        let available = hierarchy::build(
            filtered
                .iter()
                .copied()
                .filter(|item| !store.contains(&item.id)),
        );

        let mut catalog_tree = hierarchy::build(filtered.iter().copied());
        reconcile::annotate(store, &mut catalog_tree);

        Self {
            version,
            counts: ViewCounts {
                catalog: catalog.len(),
                filtered: filtered.len(),
                available: available.leaf_count(),
                selected: store.len(),
            },
            available,
            selected,
            catalog: catalog_tree,
            filter_options: FilterOptions::from_items(catalog.items()),
        }
    }
}

/// Build the selected pane from the stored order.
///
/// Ids without a catalog record are shown through a synthesized external
/// record so no member is ever hidden.
#[must_use]
pub fn selected_pane(catalog: &Catalog, store: &SelectionStore) -> HierarchyNode {
    let synthesized: Vec<ItemRecord> = store
        .ids()
        .iter()
        .filter(|id| !catalog.contains(id.as_str()))
        .map(|id| ItemRecord::external(id.clone()))
        .collect();

    let records = store.ids().iter().filter_map(|id| {
        catalog
            .get(id.as_str())
            .or_else(|| synthesized.iter().find(|record| record.id == *id))
    });
    hierarchy::build_ordered(records)
}
