#![forbid(unsafe_code)]

//! Filter evaluation.
//!
//! [`FilterCriteria::matches`] is a pure predicate: it reads the item and the
//! criteria and nothing else, so the filter UI can re-run it on every
//! keystroke without accumulating state.
//!
//! Each text field is independently optional. An empty string or the
//! sentinel `"All"` (any casing) disables that field. Active fields compare
//! by exact, case-insensitive equality, and all of them must pass.
//! Compliance constraints are predicates over the item's flag set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::item::{ComplianceFlags, ItemRecord};

/// Wildcard value that disables a text field.
pub const ALL: &str = "All";

/// A predicate over an item's compliance flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "flag", rename_all = "lowercase")]
pub enum ComplianceFilter {
    /// The item carries every flag in the set.
    Has(ComplianceFlags),
    /// The item carries none of the flags in the set.
    Lacks(ComplianceFlags),
}

impl ComplianceFilter {
    #[must_use]
    pub fn matches(&self, flags: ComplianceFlags) -> bool {
        match self {
            Self::Has(required) => flags.contains(*required),
            Self::Lacks(forbidden) => !flags.intersects(*forbidden),
        }
    }
}

/// The active filter criteria.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub vendor: String,
    pub brand: String,
    pub product_type: String,
    pub lineage: String,
    /// Compared against both the raw weight and the composite weight label.
    pub weight: String,
    pub compliance: Vec<ComplianceFilter>,
}

impl FilterCriteria {
    /// Criteria that match every item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    #[must_use]
    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = product_type.into();
        self
    }

    #[must_use]
    pub fn with_lineage(mut self, lineage: impl Into<String>) -> Self {
        self.lineage = lineage.into();
        self
    }

    #[must_use]
    pub fn with_weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = weight.into();
        self
    }

    #[must_use]
    pub fn with_compliance(mut self, filter: ComplianceFilter) -> Self {
        self.compliance.push(filter);
        self
    }

    /// Whether every field is a wildcard.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        [
            &self.vendor,
            &self.brand,
            &self.product_type,
            &self.lineage,
            &self.weight,
        ]
        .into_iter()
        .all(|field| is_wildcard(field))
            && self.compliance.is_empty()
    }

    /// Whether `item` passes every active constraint.
    #[must_use]
    pub fn matches(&self, item: &ItemRecord) -> bool {
        field_matches(&self.vendor, &item.vendor)
            && field_matches(&self.brand, &item.brand)
            && field_matches(&self.product_type, &item.product_type)
            && field_matches(&self.lineage, &item.lineage)
            && (field_matches(&self.weight, &item.weight)
                || field_matches(&self.weight, &item.weight_label()))
            && self
                .compliance
                .iter()
                .all(|filter| filter.matches(item.compliance_flags))
    }
}

/// Free-function form of [`FilterCriteria::matches`].
#[must_use]
pub fn matches(item: &ItemRecord, criteria: &FilterCriteria) -> bool {
    criteria.matches(item)
}

fn is_wildcard(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}

fn field_matches(wanted: &str, actual: &str) -> bool {
    if is_wildcard(wanted) {
        return true;
    }
    wanted.trim().to_lowercase() == actual.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// FilterOptions
// ---------------------------------------------------------------------------

/// Distinct values per filterable field, for populating filter controls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub vendors: Vec<String>,
    pub brands: Vec<String>,
    pub product_types: Vec<String>,
    pub lineages: Vec<String>,
    pub weights: Vec<String>,
}

impl FilterOptions {
    /// Collect sorted distinct non-empty values from `items`.
    ///
    /// Values differing only in case collapse onto the first spelling seen.
    #[must_use]
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a ItemRecord>) -> Self {
        let mut vendors = BTreeMap::new();
        let mut brands = BTreeMap::new();
        let mut types = BTreeMap::new();
        let mut lineages = BTreeMap::new();
        let mut weights = BTreeMap::new();

        for item in items {
            collect(&mut vendors, &item.vendor);
            collect(&mut brands, &item.brand);
            collect(&mut types, &item.product_type);
            collect(&mut lineages, &item.lineage);
            collect(&mut weights, &item.weight_label());
        }

        Self {
            vendors: vendors.into_values().collect(),
            brands: brands.into_values().collect(),
            product_types: types.into_values().collect(),
            lineages: lineages.into_values().collect(),
            weights: weights.into_values().collect(),
        }
    }
}

fn collect(into: &mut BTreeMap<String, String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    into.entry(value.to_lowercase())
        .or_insert_with(|| value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ItemRecord {
        ItemRecord::new("a", "A")
            .with_vendor("Acme")
            .with_brand("X")
            .with_product_type("Flower")
            .with_lineage("SATIVA")
            .with_weight("3.5", "g")
            .with_flags(ComplianceFlags::LAB_TESTED)
    }

    #[test]
    fn empty_criteria_match_everything() {
        let criteria = FilterCriteria::new();
        assert!(criteria.is_unconstrained());
        assert!(criteria.matches(&item()));
    }

    #[test]
    fn all_sentinel_is_wildcard() {
        let criteria = FilterCriteria::new().with_vendor("all").with_brand(ALL);
        assert!(criteria.is_unconstrained());
        assert!(criteria.matches(&item()));
    }

    #[test]
    fn fields_compare_case_insensitively() {
        assert!(FilterCriteria::new().with_vendor("ACME").matches(&item()));
        assert!(!FilterCriteria::new().with_vendor("Acm").matches(&item()));
    }

    #[test]
    fn all_active_fields_must_pass() {
        let criteria = FilterCriteria::new().with_vendor("Acme").with_brand("Y");
        assert!(!criteria.matches(&item()));
    }

    #[test]
    fn weight_matches_raw_or_label() {
        assert!(FilterCriteria::new().with_weight("3.5").matches(&item()));
        assert!(FilterCriteria::new().with_weight("3.5G").matches(&item()));
        assert!(!FilterCriteria::new().with_weight("7g").matches(&item()));
    }

    #[test]
    fn compliance_has_and_lacks() {
        let has = FilterCriteria::new().with_compliance(ComplianceFilter::Has(
            ComplianceFlags::LAB_TESTED,
        ));
        let lacks = FilterCriteria::new().with_compliance(ComplianceFilter::Lacks(
            ComplianceFlags::LAB_TESTED | ComplianceFlags::RESTRICTED,
        ));
        assert!(has.matches(&item()));
        assert!(!lacks.matches(&item()));
        assert!(!has.is_unconstrained());
    }

    #[test]
    fn empty_item_fields_only_match_wildcards() {
        let bare = ItemRecord::new("b", "B");
        assert!(FilterCriteria::new().matches(&bare));
        assert!(!FilterCriteria::new().with_vendor("Acme").matches(&bare));
    }

    #[test]
    fn options_are_sorted_and_case_deduplicated() {
        let items = vec![
            item(),
            ItemRecord::new("b", "B").with_vendor("acme").with_brand("W"),
            ItemRecord::new("c", "C").with_vendor("Beta"),
        ];
        let options = FilterOptions::from_items(&items);
        assert_eq!(options.vendors, vec!["Acme", "Beta"]);
        assert_eq!(options.brands, vec!["W", "X"]);
        assert_eq!(options.weights, vec!["3.5g"]);
    }
}
