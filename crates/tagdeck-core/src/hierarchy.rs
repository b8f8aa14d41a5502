#![forbid(unsafe_code)]

//! Hierarchy builder: vendor → brand → product type → weight → item.
//!
//! Two constructions share one node type:
//!
//! - [`build`] produces the canonical sorted tree used by the available pane
//!   and the group-toggle controls. Group keys sort case-insensitively; leaves
//!   sort lexicographically by item name. Children are kept in order by
//!   sorted insertion, so iteration order is always the canonical sort.
//! - [`build_ordered`] produces the selected pane. It groups *runs* of
//!   consecutive items that share a key and keeps input order everywhere, so
//!   a depth-first walk of a fresh tree reproduces the input order exactly.
//!
//! Both are pure: the only inputs are the items and the static type
//! override table. Neither ever fails; empty group fields land in sentinel
//! buckets such as [`UNKNOWN_VENDOR`].
//!
//! # Invariants
//!
//! 1. [`build`] keeps the first item per name (case-insensitive) and drops
//!    later duplicates silently.
//! 2. Every leaf sits at depth 5 (root → vendor → brand → type → weight → leaf).
//! 3. Group keys compare case-insensitively; a bucket keeps the first
//!    spelling it saw.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::item::{ItemId, ItemRecord};

pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";
pub const UNKNOWN_BRAND: &str = "Unknown Brand";
pub const UNKNOWN_TYPE: &str = "Unknown Type";
pub const UNKNOWN_WEIGHT: &str = "Unknown Weight";

/// Known product type spellings mapped onto canonical type names.
///
/// Aliases are matched after lowercasing and collapsing whitespace.
const TYPE_OVERRIDES: &[(&str, &str)] = &[
    ("flower", "Flower"),
    ("bud", "Flower"),
    ("pre-roll", "Pre-Roll"),
    ("preroll", "Pre-Roll"),
    ("pre roll", "Pre-Roll"),
    ("infused pre-roll", "Infused Pre-Roll"),
    ("infused preroll", "Infused Pre-Roll"),
    ("vape", "Vape Cartridge"),
    ("vape cartridge", "Vape Cartridge"),
    ("cartridge", "Vape Cartridge"),
    ("cart", "Vape Cartridge"),
    ("edible", "Edible"),
    ("edibles", "Edible"),
    ("edible (solid)", "Edible"),
    ("edible (liquid)", "Beverage"),
    ("beverage", "Beverage"),
    ("drink", "Beverage"),
    ("concentrate", "Concentrate"),
    ("extract", "Concentrate"),
    ("rso", "Concentrate"),
    ("tincture", "Tincture"),
    ("topical", "Topical"),
    ("capsule", "Capsule"),
    ("capsules", "Capsule"),
    ("paraphernalia", "Paraphernalia"),
    ("accessory", "Paraphernalia"),
];

/// Map a raw product type onto its canonical bucket name.
///
/// Unrecognized or empty types fall back to [`UNKNOWN_TYPE`].
#[must_use]
pub fn normalize_product_type(raw: &str) -> &'static str {
    let key = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    TYPE_OVERRIDES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(UNKNOWN_TYPE)
}

// ---------------------------------------------------------------------------
// Level / ToggleState / ContainerKey
// ---------------------------------------------------------------------------

/// Depth of a node in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    Root,
    Vendor,
    Brand,
    ProductType,
    Weight,
    Leaf,
}

impl Level {
    /// The level directly below this one.
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::Root => Some(Self::Vendor),
            Self::Vendor => Some(Self::Brand),
            Self::Brand => Some(Self::ProductType),
            Self::ProductType => Some(Self::Weight),
            Self::Weight => Some(Self::Leaf),
            Self::Leaf => None,
        }
    }

    /// Sentinel bucket used when an item has no value for this level.
    #[must_use]
    pub const fn sentinel(self) -> &'static str {
        match self {
            Self::Vendor => UNKNOWN_VENDOR,
            Self::Brand => UNKNOWN_BRAND,
            Self::ProductType => UNKNOWN_TYPE,
            Self::Weight => UNKNOWN_WEIGHT,
            Self::Root | Self::Leaf => "",
        }
    }
}

/// Check state of a group control.
///
/// Derived from the selection; never set directly by a user action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleState {
    Checked,
    #[default]
    Unchecked,
    Indeterminate,
}

/// Identity of a leaf container (the immediate parent bucket of a leaf).
///
/// `path` is the group keys from vendor down to the container. `ordinal`
/// is the container's position among all leaf containers in visual order;
/// it disambiguates repeated runs of the same path in the selected pane.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ContainerKey {
    pub path: Vec<String>,
    pub ordinal: usize,
}

/// A leaf in visual order, with the container that holds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafSlot {
    pub id: ItemId,
    pub container: ContainerKey,
}

// ---------------------------------------------------------------------------
// HierarchyNode
// ---------------------------------------------------------------------------

/// A group bucket or a leaf wrapping one item.
///
/// Nodes are disposable: they are rebuilt from scratch on every render pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    level: Level,
    key: String,
    children: Vec<HierarchyNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item: Option<ItemId>,
    toggle: ToggleState,
}

impl HierarchyNode {
    /// An empty root.
    #[must_use]
    pub fn root() -> Self {
        Self::group(Level::Root, String::new())
    }

    fn group(level: Level, key: String) -> Self {
        Self {
            level,
            key,
            children: Vec::new(),
            item: None,
            toggle: ToggleState::Unchecked,
        }
    }

    /// A leaf keyed by the item's name.
    #[must_use]
    pub fn leaf(item: &ItemRecord) -> Self {
        Self {
            level: Level::Leaf,
            key: item.name.clone(),
            children: Vec::new(),
            item: Some(item.id.clone()),
            toggle: ToggleState::Unchecked,
        }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn children(&self) -> &[HierarchyNode] {
        &self.children
    }

    /// The wrapped item id, for leaves.
    #[must_use]
    pub fn item_id(&self) -> Option<&ItemId> {
        self.item.as_ref()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.level == Level::Leaf
    }

    #[must_use]
    pub fn toggle_state(&self) -> ToggleState {
        self.toggle
    }

    /// Record the derived toggle state. Only the reconciler should call this.
    pub fn set_derived_toggle(&mut self, state: ToggleState) {
        self.toggle = state;
    }

    /// Mutable access to children, for derived-state annotation.
    pub fn children_mut(&mut self) -> &mut [HierarchyNode] {
        &mut self.children
    }

    /// Whether this node has no leaves beneath it.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_leaf() && self.children.iter().all(HierarchyNode::is_empty)
    }

    /// Number of leaves under this node (1 for a leaf).
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            return 1;
        }
        self.children.iter().map(HierarchyNode::leaf_count).sum()
    }

    /// Leaf ids in depth-first (visual) order.
    #[must_use]
    pub fn leaf_ids(&self) -> Vec<ItemId> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.collect_leaf_ids(&mut out);
        out
    }

    fn collect_leaf_ids(&self, out: &mut Vec<ItemId>) {
        if let Some(id) = &self.item {
            out.push(id.clone());
            return;
        }
        for child in &self.children {
            child.collect_leaf_ids(out);
        }
    }

    /// Leaves in visual order, each tagged with its container.
    #[must_use]
    pub fn leaf_slots(&self) -> Vec<LeafSlot> {
        let mut out = Vec::with_capacity(self.leaf_count());
        let mut path = Vec::new();
        let mut ordinal = 0;
        self.collect_slots(&mut path, &mut ordinal, &mut out);
        out
    }

    fn collect_slots(&self, path: &mut Vec<String>, ordinal: &mut usize, out: &mut Vec<LeafSlot>) {
        let holds_leaves = self.children.iter().any(HierarchyNode::is_leaf);
        if holds_leaves {
            let container = ContainerKey {
                path: path.clone(),
                ordinal: *ordinal,
            };
            *ordinal += 1;
            for child in &self.children {
                if let Some(id) = &child.item {
                    out.push(LeafSlot {
                        id: id.clone(),
                        container: container.clone(),
                    });
                }
            }
            return;
        }
        for child in &self.children {
            path.push(child.key.clone());
            child.collect_slots(path, ordinal, out);
            path.pop();
        }
    }

    /// Find the first group at `path` (keys compared case-insensitively).
    #[must_use]
    pub fn find(&self, path: &[&str]) -> Option<&HierarchyNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        self.children
            .iter()
            .find(|child| !child.is_leaf() && keys_equal(&child.key, head))
            .and_then(|child| child.find(rest))
    }

    /// Every group at `path`. The selected pane can hold several runs of one path.
    #[must_use]
    pub fn find_all(&self, path: &[&str]) -> Vec<&HierarchyNode> {
        let mut out = Vec::new();
        self.find_all_into(path, &mut out);
        out
    }

    fn find_all_into<'a>(&'a self, path: &[&str], out: &mut Vec<&'a HierarchyNode>) {
        let Some((head, rest)) = path.split_first() else {
            out.push(self);
            return;
        };
        for child in &self.children {
            if !child.is_leaf() && keys_equal(&child.key, head) {
                child.find_all_into(rest, out);
            }
        }
    }

    // --- Structural edits (display order only) ----------------------------

    /// Remove the leaf for `id` and return it.
    pub fn detach_leaf(&mut self, id: &ItemId) -> Option<HierarchyNode> {
        if let Some(pos) = self
            .children
            .iter()
            .position(|child| child.item.as_ref() == Some(id))
        {
            return Some(self.children.remove(pos));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.detach_leaf(id))
    }

    /// Insert `leaf` directly before the leaf for `reference`, in the same container.
    ///
    /// Returns the leaf back if `reference` is not in the tree.
    pub fn insert_leaf_before(
        &mut self,
        reference: &ItemId,
        leaf: HierarchyNode,
    ) -> Result<(), HierarchyNode> {
        if let Some(pos) = self
            .children
            .iter()
            .position(|child| child.item.as_ref() == Some(reference))
        {
            self.children.insert(pos, leaf);
            return Ok(());
        }
        let mut leaf = leaf;
        for child in &mut self.children {
            match child.insert_leaf_before(reference, leaf) {
                Ok(()) => return Ok(()),
                Err(back) => leaf = back,
            }
        }
        Err(leaf)
    }

    /// Append `leaf` to the last leaf container in visual order.
    ///
    /// Returns the leaf back if the tree has no leaf container.
    pub fn append_to_last_container(&mut self, leaf: HierarchyNode) -> Result<(), HierarchyNode> {
        if self.children.iter().any(HierarchyNode::is_leaf) {
            self.children.push(leaf);
            return Ok(());
        }
        let mut leaf = leaf;
        for child in self.children.iter_mut().rev() {
            match child.append_to_last_container(leaf) {
                Ok(()) => return Ok(()),
                Err(back) => leaf = back,
            }
        }
        Err(leaf)
    }

    /// Drop groups that no longer hold any leaf.
    pub fn prune_empty(&mut self) {
        self.children.retain(|child| !child.is_empty());
        for child in &mut self.children {
            child.prune_empty();
        }
    }

    // --- Builder internals -------------------------------------------------

    fn sorted_child_mut(&mut self, level: Level, key: &str) -> &mut HierarchyNode {
        let pos = match self
            .children
            .binary_search_by(|child| compare_group_keys(&child.key, key))
        {
            Ok(pos) => pos,
            Err(pos) => {
                self.children
                    .insert(pos, HierarchyNode::group(level, key.to_string()));
                pos
            }
        };
        &mut self.children[pos]
    }

    fn insert_sorted_leaf(&mut self, leaf: HierarchyNode) {
        let pos = self
            .children
            .partition_point(|child| compare_leaves(child, &leaf) != Ordering::Greater);
        self.children.insert(pos, leaf);
    }

    fn run_child_mut(&mut self, level: Level, key: &str) -> &mut HierarchyNode {
        let reuse = self
            .children
            .last()
            .is_some_and(|last| !last.is_leaf() && keys_equal(&last.key, key));
        if !reuse {
            self.children
                .push(HierarchyNode::group(level, key.to_string()));
        }
        let last = self.children.len() - 1;
        &mut self.children[last]
    }
}

fn keys_equal(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn compare_group_keys(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn compare_leaves(a: &HierarchyNode, b: &HierarchyNode) -> Ordering {
    a.key.cmp(&b.key).then_with(|| a.item.cmp(&b.item))
}

/// Group keys for an item, vendor first.
#[must_use]
pub fn group_path(item: &ItemRecord) -> [String; 4] {
    [
        or_sentinel(&item.vendor, Level::Vendor),
        or_sentinel(&item.brand, Level::Brand),
        normalize_product_type(&item.product_type).to_string(),
        or_sentinel(&item.weight_label(), Level::Weight),
    ]
}

fn or_sentinel(value: &str, level: Level) -> String {
    let value = value.trim();
    if value.is_empty() {
        level.sentinel().to_string()
    } else {
        value.to_string()
    }
}

const GROUP_LEVELS: [Level; 4] = [Level::Vendor, Level::Brand, Level::ProductType, Level::Weight];

/// Build the canonical sorted hierarchy.
#[must_use]
pub fn build<'a>(items: impl IntoIterator<Item = &'a ItemRecord>) -> HierarchyNode {
    let mut root = HierarchyNode::root();
    let mut seen_names = HashSet::new();

    for item in items {
        if !seen_names.insert(item.name.to_lowercase()) {
            continue;
        }
        let path = group_path(item);
        let mut node = &mut root;
        for (level, key) in GROUP_LEVELS.iter().zip(path.iter()) {
            node = node.sorted_child_mut(*level, key);
        }
        node.insert_sorted_leaf(HierarchyNode::leaf(item));
    }
    root
}

/// Build a hierarchy that preserves input order by grouping runs.
///
/// Repeated ids are ignored after their first appearance.
#[must_use]
pub fn build_ordered<'a>(items: impl IntoIterator<Item = &'a ItemRecord>) -> HierarchyNode {
    let mut root = HierarchyNode::root();
    let mut seen_ids = HashSet::new();

    for item in items {
        if !seen_ids.insert(item.id.clone()) {
            continue;
        }
        let path = group_path(item);
        let mut node = &mut root;
        for (level, key) in GROUP_LEVELS.iter().zip(path.iter()) {
            node = node.run_child_mut(*level, key);
        }
        node.children.push(HierarchyNode::leaf(item));
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(id: &str, vendor: &str, brand: &str) -> ItemRecord {
        ItemRecord::new(id, id)
            .with_vendor(vendor)
            .with_brand(brand)
            .with_product_type("Flower")
            .with_weight("3.5", "g")
    }

    fn keys(node: &HierarchyNode) -> Vec<&str> {
        node.children().iter().map(HierarchyNode::key).collect()
    }

    #[test]
    fn groups_vendor_then_brand() {
        let items = vec![rec("C", "Zeta", "Z"), rec("B", "Acme", "Y"), rec("A", "Acme", "X")];
        let root = build(&items);
        assert_eq!(keys(&root), vec!["Acme", "Zeta"]);
        let acme = root.find(&["Acme"]).unwrap();
        assert_eq!(keys(acme), vec!["X", "Y"]);
        assert_eq!(root.leaf_ids(), vec![ItemId::new("A"), ItemId::new("B"), ItemId::new("C")]);
    }

    #[test]
    fn group_sort_is_case_insensitive() {
        let items = vec![rec("1", "beta", "x"), rec("2", "Alpha", "x"), rec("3", "Gamma", "x")];
        assert_eq!(keys(&build(&items)), vec!["Alpha", "beta", "Gamma"]);
    }

    #[test]
    fn buckets_merge_across_case() {
        let items = vec![rec("1", "Acme", "x"), rec("2", "ACME", "x")];
        let root = build(&items);
        assert_eq!(keys(&root), vec!["Acme"]);
        assert_eq!(root.leaf_count(), 2);
    }

    #[test]
    fn leaves_sort_by_name() {
        let items = vec![rec("b", "V", "B"), rec("C", "V", "B"), rec("a", "V", "B")];
        let root = build(&items);
        assert_eq!(
            root.leaf_ids(),
            vec![ItemId::new("C"), ItemId::new("a"), ItemId::new("b")]
        );
    }

    #[test]
    fn duplicate_names_keep_first() {
        let first = ItemRecord::new("1", "Same").with_vendor("A");
        let second = ItemRecord::new("2", "same").with_vendor("B");
        let root = build([&first, &second]);
        assert_eq!(root.leaf_ids(), vec![ItemId::new("1")]);
        assert_eq!(keys(&root), vec!["A"]);
    }

    #[test]
    fn empty_fields_fall_back_to_sentinels() {
        let bare = ItemRecord::new("x", "x");
        let root = build([&bare]);
        let path = [UNKNOWN_VENDOR, UNKNOWN_BRAND, UNKNOWN_TYPE, UNKNOWN_WEIGHT];
        let weight = root.find(&path).unwrap();
        assert_eq!(weight.level(), Level::Weight);
        assert_eq!(weight.leaf_ids(), vec![ItemId::new("x")]);
    }

    #[test]
    fn product_types_use_override_table() {
        assert_eq!(normalize_product_type("  Pre   Roll "), "Pre-Roll");
        assert_eq!(normalize_product_type("CART"), "Vape Cartridge");
        assert_eq!(normalize_product_type("moon rocks"), UNKNOWN_TYPE);
        assert_eq!(normalize_product_type(""), UNKNOWN_TYPE);
    }

    #[test]
    fn leaves_sit_at_full_depth() {
        let root = build(&[rec("A", "Acme", "X")]);
        let leaf_parent = root.find(&["Acme", "X", "Flower", "3.5g"]).unwrap();
        assert!(leaf_parent.children()[0].is_leaf());
    }

    #[test]
    fn ordered_build_reproduces_input_order() {
        let items = vec![rec("A", "Acme", "X"), rec("C", "Zeta", "Z"), rec("B", "Acme", "X")];
        let root = build_ordered(&items);
        assert_eq!(keys(&root), vec!["Acme", "Zeta", "Acme"]);
        assert_eq!(
            root.leaf_ids(),
            vec![ItemId::new("A"), ItemId::new("C"), ItemId::new("B")]
        );
        assert_eq!(root.find_all(&["Acme"]).len(), 2);
    }

    #[test]
    fn leaf_slots_number_containers_in_visual_order() {
        let items = vec![rec("A", "Acme", "X"), rec("B", "Acme", "X"), rec("C", "Zeta", "Z")];
        let slots = build_ordered(&items).leaf_slots();
        assert_eq!(slots[0].container, slots[1].container);
        assert_eq!(slots[2].container.ordinal, 1);
        assert_eq!(slots[2].container.path, vec!["Zeta", "Z", "Flower", "3.5g"]);
    }

    #[test]
    fn relocate_leaf_across_containers() {
        let items = vec![rec("A", "Acme", "X"), rec("B", "Acme", "X"), rec("C", "Zeta", "Z")];
        let mut root = build_ordered(&items);
        let leaf = root.detach_leaf(&ItemId::new("C")).unwrap();
        assert!(root.insert_leaf_before(&ItemId::new("A"), leaf).is_ok());
        root.prune_empty();
        assert_eq!(keys(&root), vec!["Acme"]);
        assert_eq!(
            root.leaf_ids(),
            vec![ItemId::new("C"), ItemId::new("A"), ItemId::new("B")]
        );
    }

    #[test]
    fn append_goes_to_last_container() {
        let items = vec![rec("A", "Acme", "X"), rec("C", "Zeta", "Z")];
        let mut root = build_ordered(&items);
        let leaf = root.detach_leaf(&ItemId::new("A")).unwrap();
        assert!(root.append_to_last_container(leaf).is_ok());
        root.prune_empty();
        assert_eq!(root.leaf_ids(), vec![ItemId::new("C"), ItemId::new("A")]);
        assert_eq!(keys(&root), vec!["Zeta"]);
    }

    #[test]
    fn insert_before_unknown_reference_returns_leaf() {
        let mut root = build_ordered(&[rec("A", "Acme", "X")]);
        let stray = HierarchyNode::leaf(&rec("Q", "Q", "Q"));
        assert!(root.insert_leaf_before(&ItemId::new("missing"), stray).is_err());
    }
}
