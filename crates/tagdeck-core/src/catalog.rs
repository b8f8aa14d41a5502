#![forbid(unsafe_code)]

//! The item catalog: ground truth for which items exist in the current load.
//!
//! A [`Catalog`] is replaced wholesale on every dataset load. Between loads
//! the only in-place mutation is [`Catalog::patch_lineage`].
//!
//! Selections can name items the dataset does not carry. Those get a minimal
//! record from [`Catalog::ensure_external`], kept in a side table: they
//! resolve through [`Catalog::get`] but never appear in [`Catalog::items`],
//! so they are never offered as available or counted as catalog items.
//!
//! # Invariants
//!
//! 1. Ids are unique across loaded and external records.
//! 2. Record order is ingestion order.
//! 3. Name lookup is case-insensitive; the first record with a given name wins.
//! 4. External records only back selections; callers drop them with
//!    [`Catalog::retain_externals`] once deselected.

use std::collections::HashMap;

use serde_json::Value;

use crate::item::{ItemId, ItemRecord};
use crate::normalize::{LoadReport, normalize_rows};

/// Immutable-per-load list of item records with id and name indexes.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    items: Vec<ItemRecord>,
    by_id: HashMap<ItemId, usize>,
    by_name: HashMap<String, usize>,
    externals: HashMap<ItemId, ItemRecord>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from records that are already canonical.
    ///
    /// Later records whose id repeats an earlier one are dropped.
    #[must_use]
    pub fn from_records(records: Vec<ItemRecord>) -> Self {
        let mut catalog = Self {
            items: Vec::with_capacity(records.len()),
            by_id: HashMap::with_capacity(records.len()),
            by_name: HashMap::with_capacity(records.len()),
            externals: HashMap::new(),
        };
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Normalize backend rows and build a catalog from them.
    #[must_use]
    pub fn from_rows(rows: &[Value]) -> (Self, LoadReport) {
        let (records, report) = normalize_rows(rows);
        (Self::from_records(records), report)
    }

    fn insert(&mut self, record: ItemRecord) {
        if self.by_id.contains_key(&record.id) {
            return;
        }
        let index = self.items.len();
        self.by_id.insert(record.id.clone(), index);
        self.by_name
            .entry(record.name.to_lowercase())
            .or_insert(index);
        self.items.push(record);
    }

    /// Loaded records in ingestion order. External records are not included.
    #[must_use]
    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a record by id, loaded or external.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ItemRecord> {
        match self.by_id.get(id) {
            Some(&i) => Some(&self.items[i]),
            None => self.externals.get(id),
        }
    }

    /// Whether `id` resolves to a loaded or external record.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id) || self.externals.contains_key(id)
    }

    /// Whether `id` belongs to the loaded dataset.
    #[must_use]
    pub fn is_loaded(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Look up a record by name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&ItemRecord> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .map(|&i| &self.items[i])
    }

    /// Number of records synthesized for external selections.
    #[must_use]
    pub fn external_count(&self) -> usize {
        self.externals.len()
    }

    /// Make sure `id` resolves, synthesizing an external record if needed.
    ///
    /// Returns `true` when a record was synthesized.
    pub fn ensure_external(&mut self, id: &ItemId) -> bool {
        if self.contains(id.as_str()) {
            return false;
        }
        self.externals
            .insert(id.clone(), ItemRecord::external(id.clone()));
        true
    }

    /// Drop external records whose id fails `keep`.
    ///
    /// Returns how many were dropped.
    pub fn retain_externals(&mut self, mut keep: impl FnMut(&ItemId) -> bool) -> usize {
        let before = self.externals.len();
        self.externals.retain(|id, _| keep(id));
        before - self.externals.len()
    }

    /// The identifier sent to the backend for `id`.
    ///
    /// The wire contract identifies items by name; unknown ids are sent as-is.
    #[must_use]
    pub fn wire_name<'a>(&'a self, id: &'a ItemId) -> &'a str {
        self.get(id.as_str())
            .map(|item| item.name.as_str())
            .unwrap_or(id.as_str())
    }

    /// Map a name received from the backend back to a catalog id.
    ///
    /// Unknown names become external ids with the name as given.
    #[must_use]
    pub fn resolve_wire_name(&self, name: &str) -> ItemId {
        if let Some(item) = self.get(name) {
            return item.id.clone();
        }
        match self.find_by_name(name) {
            Some(item) => item.id.clone(),
            None => ItemId::new(name.trim()),
        }
    }

    /// Rewrite an item's lineage in place.
    ///
    /// Returns the id of the patched record, or `None` if no record has that name.
    pub fn patch_lineage(&mut self, item_name: &str, lineage: &str) -> Option<ItemId> {
        let index = *self.by_name.get(&item_name.trim().to_lowercase())?;
        let record = &mut self.items[index];
        record.lineage = lineage.to_string();
        Some(record.id.clone())
    }
}
