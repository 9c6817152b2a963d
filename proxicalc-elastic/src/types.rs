//! Wire types for the search backend
//!
//! Only the parts of the scroll and bulk responses the pipeline reads are
//! modeled; everything else in the payload is ignored by serde.

use serde::Deserialize;
use std::collections::HashMap;

/// The three text fields scanned for numeric anchors.
pub const NEEDLE_FIELDS: [&str; 3] = ["description_cleaned", "claims_cleaned", "abstract_cleaned"];

/// One page of scroll results, plus the cursor for the next one.
#[derive(Debug, Clone)]
pub struct ScrollPage {
    pub scroll_id: String,
    pub total: u64,
    pub hits: Vec<DocumentHit>,
}

/// A single source document as returned in `hits.hits`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_source", default)]
    pub source: DocumentSource,
}

impl DocumentHit {
    pub fn new(id: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    /// Iterate the needle fields present on this document, with their
    /// language → text maps.
    pub fn needle_fields(&self) -> impl Iterator<Item = (&'static str, &HashMap<String, String>)> {
        [
            (NEEDLE_FIELDS[0], self.source.description_cleaned.as_ref()),
            (NEEDLE_FIELDS[1], self.source.claims_cleaned.as_ref()),
            (NEEDLE_FIELDS[2], self.source.abstract_cleaned.as_ref()),
        ]
        .into_iter()
        .filter_map(|(name, field)| field.map(|f| (name, f)))
    }
}

/// The needle-field subset of `_source`. Each field, when present, maps a
/// language code to the cleaned text in that language.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentSource {
    #[serde(default)]
    pub description_cleaned: Option<HashMap<String, String>>,
    #[serde(default)]
    pub claims_cleaned: Option<HashMap<String, String>>,
    #[serde(default)]
    pub abstract_cleaned: Option<HashMap<String, String>>,
}

/// Raw search/scroll response body.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: String,
    pub hits: SearchHits,
}

#[derive(Debug, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub total: HitsTotal,
    #[serde(default)]
    pub hits: Vec<DocumentHit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HitsTotal {
    #[serde(default)]
    pub value: u64,
}

impl SearchResponse {
    pub fn into_page(self) -> ScrollPage {
        ScrollPage {
            scroll_id: self.scroll_id,
            total: self.hits.total.value,
            hits: self.hits.hits,
        }
    }
}

/// Response to a `_bulk` request: one item per submitted action, each
/// acknowledged independently.
#[derive(Debug, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<BulkItem>,
}

/// One action result, keyed by the action name.
#[derive(Debug, Default, Deserialize)]
pub struct BulkItem {
    pub index: Option<BulkItemDetail>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItemDetail {
    #[serde(default)]
    pub status: u16,
    pub error: Option<BulkItemError>,
}

impl BulkItemDetail {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status < 300
    }
}

/// Structured error attached to a rejected bulk item.
#[derive(Debug, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_deserialization() {
        let raw = r#"{
            "_id": "EP1234567",
            "_source": {
                "abstract_cleaned": {"en": "heated to 37.5 degrees", "de": "auf 37,5 Grad"},
                "claims_cleaned": null
            }
        }"#;

        let hit: DocumentHit = serde_json::from_str(raw).unwrap();
        assert_eq!(hit.id, "EP1234567");

        let fields: Vec<_> = hit.needle_fields().collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "abstract_cleaned");
        assert_eq!(fields[0].1.len(), 2);
    }

    #[test]
    fn test_bulk_response_item_status() {
        let raw = r#"{
            "errors": true,
            "items": [
                {"index": {"_id": "1", "status": 201}},
                {"index": {"status": 400, "error": {"type": "mapper_parsing_exception", "reason": "failed to parse"}}}
            ]
        }"#;

        let response: BulkResponse = serde_json::from_str(raw).unwrap();
        assert!(response.errors);
        assert_eq!(response.items.len(), 2);
        assert!(response.items[0].index.as_ref().unwrap().is_success());

        let failed = response.items[1].index.as_ref().unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.error.as_ref().unwrap().kind, "mapper_parsing_exception");
    }

    #[test]
    fn test_scroll_page_conversion() {
        let raw = r#"{
            "_scroll_id": "cursor-1",
            "hits": {"total": {"value": 42}, "hits": []}
        }"#;

        let page = serde_json::from_str::<SearchResponse>(raw).unwrap().into_page();
        assert_eq!(page.scroll_id, "cursor-1");
        assert_eq!(page.total, 42);
        assert!(page.hits.is_empty());
    }
}
