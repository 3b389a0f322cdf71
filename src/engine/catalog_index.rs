//! O(1) lookup from any platform variant id (or canonical id) to its catalog entry.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tracing::{debug, warn};

use super::model::CatalogEntry;

/// Separator between a base title id and an embedded sub-index (`NPWR123_00`).
pub const SUFFIX_DELIMITER: char = '_';

/// Strip any `_suffix` from a raw platform id.
pub fn base_id(raw: &str) -> &str {
    match raw.split_once(SUFFIX_DELIMITER) {
        Some((base, _)) => base,
        None => raw,
    }
}

/// Parse catalog documents one by one, skipping the malformed ones.
pub fn parse_entries(documents: Vec<Value>) -> Vec<CatalogEntry> {
    let total = documents.len();
    let entries: Vec<CatalogEntry> = documents
        .into_iter()
        .filter_map(|doc| match serde_json::from_value::<CatalogEntry>(doc) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping malformed catalog document");
                None
            }
        })
        .collect();
    debug!(parsed = entries.len(), total, "catalog documents parsed");
    entries
}

/// Immutable index over a catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Arc<Vec<CatalogEntry>>,
    by_id: HashMap<String, usize>,
}

impl CatalogIndex {
    /// Build the index over every variant (per-platform map and legacy flat
    /// list) and every canonical id. The first entry to claim an id wins.
    pub fn build(entries: Arc<Vec<CatalogEntry>>) -> Self {
        let mut by_id = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            if !entry.canonical_id.is_empty() {
                by_id
                    .entry(entry.canonical_id.clone())
                    .or_insert(position);
            }
            for variant in entry.all_variants() {
                if variant.id.is_empty() {
                    continue;
                }
                by_id.entry(variant.id.clone()).or_insert(position);
            }
        }
        Self { entries, by_id }
    }

    /// Resolve a raw id, retrying with the base id when the exact id misses.
    pub fn lookup(&self, raw_id: &str) -> Option<&CatalogEntry> {
        let raw_id = raw_id.trim();
        if raw_id.is_empty() {
            return None;
        }
        self.by_id
            .get(raw_id)
            .or_else(|| {
                let base = base_id(raw_id);
                (base != raw_id)
                    .then(|| self.by_id.get(base))
                    .flatten()
            })
            .and_then(|&position| self.entries.get(position))
    }

    /// Snapshot the index was built from.
    pub fn entries(&self) -> &Arc<Vec<CatalogEntry>> {
        &self.entries
    }

    /// Number of indexed ids.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Memoizes a [`CatalogIndex`] keyed on the identity of the catalog snapshot.
///
/// Rebuilds only when handed a different `Arc` than the one it last indexed,
/// so repeated polls over the same snapshot stay O(1).
#[derive(Debug, Default)]
pub struct CatalogIndexCache {
    current: Option<Arc<CatalogIndex>>,
    rebuilds: usize,
}

impl CatalogIndexCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index for `entries`, rebuilt only if the snapshot changed.
    pub fn get(&mut self, entries: &Arc<Vec<CatalogEntry>>) -> Arc<CatalogIndex> {
        if let Some(current) = self
            .current
            .as_ref()
            .filter(|current| Arc::ptr_eq(current.entries(), entries))
        {
            return Arc::clone(current);
        }
        let index = Arc::new(CatalogIndex::build(Arc::clone(entries)));
        self.rebuilds += 1;
        debug!(ids = index.len(), rebuilds = self.rebuilds, "catalog index rebuilt");
        self.current = Some(Arc::clone(&index));
        index
    }

    /// How many times the index was rebuilt.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }
}
