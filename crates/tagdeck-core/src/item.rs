#![forbid(unsafe_code)]

//! Catalog item records.
//!
//! An [`ItemRecord`] is one entry of the loaded dataset. Records are created
//! in bulk when a dataset load completes and are immutable until the next
//! load, with one exception: `lineage` may be patched in place by the lineage
//! editor (see [`crate::catalog::Catalog::patch_lineage`]).
//!
//! Every other component refers to records by [`ItemId`] only.

use std::borrow::Borrow;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// Identifier of one catalog item.
///
/// For backend rows without a stable id this is the item name, so it doubles
/// as the wire identifier in `update-selected-order`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an id from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ComplianceFlags
// ---------------------------------------------------------------------------

bitflags! {
    /// Compliance markers attached to an item.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ComplianceFlags: u8 {
        /// Only sold under a medical program.
        const MEDICAL_ONLY   = 0b0000_0001;
        /// Carries a lab test certificate.
        const LAB_TESTED     = 0b0000_0010;
        /// Requires an age check at sale.
        const AGE_RESTRICTED = 0b0000_0100;
        /// Subject to additional sale restrictions.
        const RESTRICTED     = 0b0000_1000;
        /// Part of a promotion.
        const PROMOTIONAL    = 0b0001_0000;
    }
}

impl ComplianceFlags {
    /// Parse a single flag name.
    ///
    /// Matching ignores case and treats `_`, `-`, and spaces alike, so
    /// `"lab tested"`, `"Lab-Tested"`, and `"LAB_TESTED"` are equivalent.
    #[must_use]
    pub fn parse_flag(name: &str) -> Option<Self> {
        let canonical: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        match canonical.as_str() {
            "MEDICAL_ONLY" | "MEDICAL" => Some(Self::MEDICAL_ONLY),
            "LAB_TESTED" => Some(Self::LAB_TESTED),
            "AGE_RESTRICTED" => Some(Self::AGE_RESTRICTED),
            "RESTRICTED" => Some(Self::RESTRICTED),
            "PROMOTIONAL" | "PROMO" => Some(Self::PROMOTIONAL),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ItemRecord
// ---------------------------------------------------------------------------

/// One catalog entry in canonical shape.
///
/// Every grouping field may be empty; the hierarchy builder maps empty
/// fields onto sentinel buckets rather than dropping the item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: ItemId,
    /// Display and match key. Matching is case-insensitive; this casing is canonical.
    pub name: String,
    pub vendor: String,
    pub brand: String,
    pub product_type: String,
    pub lineage: String,
    pub weight: String,
    pub weight_unit: String,
    pub compliance_flags: ComplianceFlags,
    /// Synthesized for a selection that does not exist in the local catalog.
    #[serde(default)]
    pub external: bool,
}

impl ItemRecord {
    /// Create a record with only an id and name set.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            vendor: String::new(),
            brand: String::new(),
            product_type: String::new(),
            lineage: String::new(),
            weight: String::new(),
            weight_unit: String::new(),
            compliance_flags: ComplianceFlags::empty(),
            external: false,
        }
    }

    /// Minimal record for an externally-sourced selection.
    #[must_use]
    pub fn external(id: impl Into<ItemId>) -> Self {
        let id = id.into();
        let name = id.as_str().to_string();
        Self {
            external: true,
            ..Self::new(id, name)
        }
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
    pub fn with_weight(mut self, weight: impl Into<String>, unit: impl Into<String>) -> Self {
        self.weight = weight.into();
        self.weight_unit = unit.into();
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ComplianceFlags) -> Self {
        self.compliance_flags = flags;
        self
    }

    /// Weight and unit as one composite label (`"3.5" + "g"` → `"3.5g"`).
    ///
    /// Returns an empty string when the weight is empty.
    #[must_use]
    pub fn weight_label(&self) -> String {
        let weight = self.weight.trim();
        if weight.is_empty() {
            return String::new();
        }
        format!("{weight}{}", self.weight_unit.trim())
    }
}
