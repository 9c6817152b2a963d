//! Scroll paginator over the search backend
//!
//! Wraps the cursor-based pull protocol: one initial search that opens the
//! scroll and reports the total hit count, then continuation fetches until a
//! page comes back empty. There is no retry at this layer; transient
//! conditions are handled inside the client, so every error here is fatal to
//! the run. A cursor that expires because processing outran the keep-alive
//! also surfaces as a fetch error.

use proxicalc_core::{IndexerResult, IndexingConfig};
use proxicalc_elastic::{ScrollPage, SearchBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Paginated access to the source index.
pub struct SourcePaginator {
    backend: Arc<dyn SearchBackend>,
    index: String,
    sort_key: String,
    page_size: usize,
    keep_alive: Duration,
}

impl SourcePaginator {
    pub fn new(backend: Arc<dyn SearchBackend>, config: &IndexingConfig) -> Self {
        Self {
            backend,
            index: config.source_index.clone(),
            sort_key: config.sort_key.clone(),
            page_size: config.page_size,
            keep_alive: config.keep_alive(),
        }
    }

    /// Open the scroll and fetch the first page.
    pub async fn open(&self) -> IndexerResult<ScrollPage> {
        let page = self
            .backend
            .open_scroll(&self.index, &self.sort_key, self.page_size, self.keep_alive)
            .await?;
        debug!(
            index = %self.index,
            total = page.total,
            first_page = page.hits.len(),
            "Scroll opened"
        );
        Ok(page)
    }

    /// Fetch the page after `scroll_id`. An empty `hits` means the scroll is
    /// exhausted.
    pub async fn next(&self, scroll_id: &str) -> IndexerResult<ScrollPage> {
        self.backend.next_page(scroll_id, self.keep_alive).await
    }
}
