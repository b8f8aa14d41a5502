//! Property-based invariant tests for filtering and hierarchy building.
//!
//! 1. Filtering is pure: the same criteria give the same result twice.
//! 2. Unconstrained criteria match every item.
//! 3. The sorted hierarchy holds one leaf per distinct name.
//! 4. Every leaf in the sorted hierarchy sits at full depth.
//! 5. A depth-first walk of the run-grouped hierarchy reproduces input order.
//! 6. Group keys are never empty.

use std::collections::HashSet;

use proptest::prelude::*;
use tagdeck_core::filter::FilterCriteria;
use tagdeck_core::hierarchy::{self, HierarchyNode, Level};
use tagdeck_core::item::{ItemId, ItemRecord};

// ── Helpers ─────────────────────────────────────────────────────────────

fn field() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("Acme".to_string()),
        Just("acme".to_string()),
        Just("Zeta".to_string()),
        Just("Flower".to_string()),
        Just("pre-roll".to_string()),
    ]
}

fn item_strategy() -> impl Strategy<Value = ItemRecord> {
    ("[a-e]{1,3}", field(), field(), field(), field(), prop::option::of(0u8..4)).prop_map(
        |(name, vendor, brand, product_type, lineage, weight)| {
            let record = ItemRecord::new(name.clone(), name)
                .with_vendor(vendor)
                .with_brand(brand)
                .with_product_type(product_type)
                .with_lineage(lineage);
            match weight {
                Some(w) => record.with_weight(w.to_string(), "g"),
                None => record,
            }
        },
    )
}

fn criteria_strategy() -> impl Strategy<Value = FilterCriteria> {
    (field(), field(), field(), field()).prop_map(|(vendor, brand, product_type, lineage)| {
        FilterCriteria::new()
            .with_vendor(vendor)
            .with_brand(brand)
            .with_product_type(product_type)
            .with_lineage(lineage)
    })
}

fn unique_ids(items: Vec<ItemRecord>) -> Vec<ItemRecord> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, mut item)| {
            item.id = ItemId::new(format!("{}#{i}", item.name));
            item
        })
        .collect()
}

fn leaf_depths(node: &HierarchyNode, depth: usize, out: &mut Vec<usize>) {
    if node.is_leaf() {
        out.push(depth);
        return;
    }
    for child in node.children() {
        leaf_depths(child, depth + 1, out);
    }
}

fn group_keys_nonempty(node: &HierarchyNode) -> bool {
    node.children().iter().all(|child| {
        (child.is_leaf() || !child.key().is_empty()) && group_keys_nonempty(child)
    })
}

// ═════════════════════════════════════════════════════════════════════════
// 1–2. Filtering
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn filtering_is_idempotent(
        items in prop::collection::vec(item_strategy(), 0..30),
        criteria in criteria_strategy(),
    ) {
        let first: Vec<_> = items.iter().filter(|i| criteria.matches(i)).collect();
        let second: Vec<_> = items.iter().filter(|i| criteria.matches(i)).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unconstrained_matches_everything(items in prop::collection::vec(item_strategy(), 0..30)) {
        let criteria = FilterCriteria::new().with_vendor("All");
        prop_assert!(items.iter().all(|i| criteria.matches(i)));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3–4, 6. Sorted hierarchy
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sorted_tree_has_one_leaf_per_name(items in prop::collection::vec(item_strategy(), 0..40)) {
        let items = unique_ids(items);
        let names: HashSet<String> = items.iter().map(|i| i.name.to_lowercase()).collect();
        let root = hierarchy::build(&items);
        prop_assert_eq!(root.leaf_count(), names.len());
    }

    #[test]
    fn leaves_sit_at_full_depth(items in prop::collection::vec(item_strategy(), 1..40)) {
        let root = hierarchy::build(&items);
        let mut depths = Vec::new();
        leaf_depths(&root, 0, &mut depths);
        prop_assert!(depths.iter().all(|&d| d == 5), "depths: {:?}", depths);
        prop_assert!(group_keys_nonempty(&root));
        prop_assert_eq!(root.level(), Level::Root);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Run-grouped hierarchy
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ordered_tree_flattens_to_input(items in prop::collection::vec(item_strategy(), 0..40)) {
        let items = unique_ids(items);
        let expected: Vec<ItemId> = items.iter().map(|i| i.id.clone()).collect();
        let root = hierarchy::build_ordered(&items);
        prop_assert_eq!(root.leaf_ids(), expected);
        prop_assert!(group_keys_nonempty(&root));
    }
}
