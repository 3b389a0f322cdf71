use serde::Deserialize;
use serde_json::Value;

/// Every catalog document id starts with this.
pub const CATALOG_PREFIX: &str = "catalog::";
/// Upper bound for `_all_docs` prefix scans.
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Drop CouchDB bookkeeping fields so documents look like catalog entries.
pub fn strip_metadata(mut doc: Value) -> Value {
    if let Some(object) = doc.as_object_mut() {
        object.remove("_id");
        object.remove("_rev");
    }
    doc
}
