#![forbid(unsafe_code)]

//! Catalog normalization.
//!
//! Backend rows arrive as loosely-typed JSON objects whose keys vary between
//! datasets (`"vendor"`, `"Vendor"`, `"Vendor/Supplier*"`, ...). This module
//! is the single place where those aliases are resolved; everything
//! downstream sees only canonical [`ItemRecord`]s.
//!
//! # Rules
//!
//! 1. Key lookup is exact first, then ASCII case-insensitive, in alias order.
//! 2. Strings are trimmed; numbers are rendered without a trailing `.0`;
//!    booleans render as `"true"`/`"false"`; `null` is empty.
//! 3. Rows without a name are skipped and counted.
//! 4. Ids: backend `id` if present, else the name; a taken id becomes
//!    `"{name}#{ingestion_index}"`.
//!
//! # Failure Modes
//!
//! | Input | Behavior |
//! |-------|----------|
//! | Row is not an object | Skipped, counted as unnamed |
//! | Unknown compliance flag name | Ignored |
//! | Nested object/array in a text field | Treated as empty |

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::item::{ComplianceFlags, ItemId, ItemRecord};

const NAME_KEYS: &[&str] = &["name", "Product Name*", "ProductName", "product_name"];
const VENDOR_KEYS: &[&str] = &["vendor", "Vendor", "Vendor/Supplier*", "Supplier"];
const BRAND_KEYS: &[&str] = &["brand", "Product Brand", "Brand"];
const TYPE_KEYS: &[&str] = &["productType", "product_type", "Product Type*", "Type"];
const LINEAGE_KEYS: &[&str] = &["lineage", "Lineage"];
const WEIGHT_KEYS: &[&str] = &["weight", "Weight*", "Weight"];
const UNIT_KEYS: &[&str] = &["units", "Units", "weight_unit"];
const ID_KEYS: &[&str] = &["id", "ID"];
const FLAG_LIST_KEYS: &[&str] = &["complianceFlags", "compliance_flags"];

/// Boolean columns that map onto a single compliance flag.
const FLAG_COLUMNS: &[(&str, ComplianceFlags)] = &[
    ("Medical Only", ComplianceFlags::MEDICAL_ONLY),
    ("Lab Tested", ComplianceFlags::LAB_TESTED),
    ("Age Restricted", ComplianceFlags::AGE_RESTRICTED),
    ("Restricted", ComplianceFlags::RESTRICTED),
    ("Promotional", ComplianceFlags::PROMOTIONAL),
];

/// Summary of one normalization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records produced.
    pub items: usize,
    /// Rows dropped because they had no usable name.
    pub skipped_unnamed: usize,
    /// Records whose name repeated an earlier record's name (case-insensitive).
    pub duplicate_names: usize,
}

/// Normalize a batch of backend rows into canonical records.
#[must_use]
pub fn normalize_rows(rows: &[Value]) -> (Vec<ItemRecord>, LoadReport) {
    let mut report = LoadReport::default();
    let mut taken: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut seen_names: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut items = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let Some(object) = row.as_object() else {
            report.skipped_unnamed += 1;
            continue;
        };
        let Some(mut record) = normalize_row(object) else {
            report.skipped_unnamed += 1;
            continue;
        };

        if !seen_names.insert(record.name.to_lowercase()) {
            report.duplicate_names += 1;
        }

        if taken.contains(record.id.as_str()) {
            record.id = ItemId::new(format!("{}#{index}", record.name));
        }
        taken.insert(record.id.as_str().to_string());
        items.push(record);
    }

    report.items = items.len();
    tracing::debug!(
        items = report.items,
        skipped_unnamed = report.skipped_unnamed,
        duplicate_names = report.duplicate_names,
        "normalized catalog rows"
    );
    (items, report)
}

/// Normalize one row. Returns `None` when the row has no name.
///
/// The id is provisional: [`normalize_rows`] disambiguates collisions.
#[must_use]
pub fn normalize_row(row: &Map<String, Value>) -> Option<ItemRecord> {
    let name = lookup_text(row, NAME_KEYS);
    if name.is_empty() {
        return None;
    }

    let id = match lookup_text(row, ID_KEYS) {
        id if id.is_empty() => name.clone(),
        id => id,
    };

    let mut record = ItemRecord::new(id, name)
        .with_vendor(lookup_text(row, VENDOR_KEYS))
        .with_brand(lookup_text(row, BRAND_KEYS))
        .with_product_type(lookup_text(row, TYPE_KEYS))
        .with_lineage(lookup_text(row, LINEAGE_KEYS))
        .with_weight(lookup_text(row, WEIGHT_KEYS), lookup_text(row, UNIT_KEYS));
    record.compliance_flags = lookup_flags(row);
    Some(record)
}

fn lookup<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    for key in keys {
        if let Some(value) = row.get(*key) {
            return Some(value);
        }
    }
    for key in keys {
        if let Some((_, value)) = row.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            return Some(value);
        }
    }
    None
}

fn lookup_text(row: &Map<String, Value>, keys: &[&str]) -> String {
    lookup(row, keys).map(value_text).unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "x"
        ),
        _ => false,
    }
}

fn lookup_flags(row: &Map<String, Value>) -> ComplianceFlags {
    let mut flags = ComplianceFlags::empty();

    match lookup(row, FLAG_LIST_KEYS) {
        Some(Value::Array(names)) => {
            for name in names.iter().filter_map(Value::as_str) {
                if let Some(flag) = ComplianceFlags::parse_flag(name) {
                    flags |= flag;
                }
            }
        }
        Some(Value::String(list)) => {
            for name in list.split([',', ';']) {
                if let Some(flag) = ComplianceFlags::parse_flag(name) {
                    flags |= flag;
                }
            }
        }
        _ => {}
    }

    for (column, flag) in FLAG_COLUMNS {
        if lookup(row, &[*column]).is_some_and(value_truthy) {
            flags |= *flag;
        }
    }
    flags
}
