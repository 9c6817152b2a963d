//! Search backend trait
//!
//! The seam between the pipeline and the concrete HTTP client. Tests run the
//! full pipeline against an in-memory implementation of this trait.

use crate::types::{BulkResponse, ScrollPage};
use async_trait::async_trait;
use proxicalc_core::IndexerResult;
use std::time::Duration;

/// Paginated reads and batched writes against a search backend.
///
/// Transient transport conditions are retried by the implementation; any
/// error returned here is final.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Open a scroll over `index`, sorted by `sort_key`, returning the first
    /// page together with the continuation cursor and the total hit count.
    async fn open_scroll(
        &self,
        index: &str,
        sort_key: &str,
        page_size: usize,
        keep_alive: Duration,
    ) -> IndexerResult<ScrollPage>;

    /// Fetch the next page for an open scroll cursor. The cursor is only
    /// valid within `keep_alive` of the previous fetch; an expired cursor
    /// surfaces as an error.
    async fn next_page(&self, scroll_id: &str, keep_alive: Duration) -> IndexerResult<ScrollPage>;

    /// Submit an NDJSON `_bulk` body against `index`. Items are acknowledged
    /// independently in the response; a transport-level failure fails the
    /// whole batch.
    async fn bulk(&self, index: &str, body: String) -> IndexerResult<BulkResponse>;
}
