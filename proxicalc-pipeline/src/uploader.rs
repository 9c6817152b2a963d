//! Upload stage: per-destination cache and cycle draining
//!
//! Destinations are keyed by `prefix + language + "_proximity_" + ambit` and
//! created lazily on first use; the cache lives for the whole run and every
//! cached handle is closed exactly once at shutdown. A drain cycle walks the
//! buffered languages sequentially, submitting records in buffer order and
//! reporting per-language throughput.

use crate::buffer::ProximityBuffer;
use proxicalc_core::{IndexerResult, RunCounters};
use proxicalc_elastic::{bulk, BulkIndexer, SearchBackend};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Cache of bulk destinations plus the drain logic.
pub struct IndexerPool {
    backend: Arc<dyn SearchBackend>,
    counters: Arc<RunCounters>,
    prefix: String,
    ambit: usize,
    batch_size: usize,
    flush_interval: Duration,
    destinations: Mutex<HashMap<String, Arc<BulkIndexer>>>,
}

impl IndexerPool {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        counters: Arc<RunCounters>,
        prefix: impl Into<String>,
        ambit: usize,
    ) -> Self {
        Self {
            backend,
            counters,
            prefix: prefix.into(),
            ambit,
            batch_size: bulk::DEFAULT_BATCH_SIZE,
            flush_interval: bulk::DEFAULT_FLUSH_INTERVAL,
            destinations: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn destination_key(&self, language: &str) -> String {
        format!("{}{}_proximity_{}", self.prefix, language, self.ambit)
    }

    /// Get or lazily create the destination for `language`. The cache lock
    /// guards concurrent first-creation of the same key.
    pub async fn destination_for(&self, language: &str) -> Arc<BulkIndexer> {
        let key = self.destination_key(language);
        let mut destinations = self.destinations.lock().await;
        destinations
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(BulkIndexer::new(
                    Arc::clone(&self.backend),
                    key,
                    Arc::clone(&self.counters),
                    self.batch_size,
                    self.flush_interval,
                ))
            })
            .clone()
    }

    /// Drain every buffered language, one at a time.
    ///
    /// Records leave the buffer when submission for their language starts;
    /// acknowledgment happens later, inside the destination's flushes. A
    /// record that fails to serialize aborts the run.
    pub async fn drain_cycle(&self, buffer: &ProximityBuffer) -> IndexerResult<()> {
        let mut languages = buffer.languages();
        languages.sort();

        for language in languages {
            let records = buffer.take(&language);
            let submitted = records.len();
            let destination = self.destination_for(&language).await;
            let start = Instant::now();

            for record in records {
                let line = serde_json::to_string(&record)?;
                destination.add(record.source_id, line).await;
            }

            let stats = destination.stats();
            let elapsed = start.elapsed();
            let docs_per_sec = stats.flushed as f64 / elapsed.as_secs_f64().max(1e-9);

            if stats.failed > 0 {
                warn!(
                    language = %language,
                    index = destination.index(),
                    submitted,
                    indexed = stats.flushed,
                    failed = stats.failed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    docs_per_sec = docs_per_sec as u64,
                    "Indexed documents with errors"
                );
            } else {
                info!(
                    language = %language,
                    index = destination.index(),
                    submitted,
                    indexed = stats.flushed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    docs_per_sec = docs_per_sec as u64,
                    "Indexed documents"
                );
            }
        }

        Ok(())
    }

    /// Flush and close every cached destination exactly once, returning how
    /// many were closed. A close failure is fatal.
    pub async fn close_all(&self) -> IndexerResult<usize> {
        let destinations = {
            let mut guard = self.destinations.lock().await;
            std::mem::take(&mut *guard)
        };

        let closed = destinations.len();
        for (key, destination) in destinations {
            destination.close().await?;
            info!(index = %key, "Destination closed");
        }

        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proxicalc_elastic::{BulkResponse, ScrollPage};

    struct NullBackend;

    #[async_trait]
    impl SearchBackend for NullBackend {
        async fn open_scroll(
            &self,
            _index: &str,
            _sort_key: &str,
            _page_size: usize,
            _keep_alive: Duration,
        ) -> IndexerResult<ScrollPage> {
            unimplemented!("not used by pool tests")
        }

        async fn next_page(
            &self,
            _scroll_id: &str,
            _keep_alive: Duration,
        ) -> IndexerResult<ScrollPage> {
            unimplemented!("not used by pool tests")
        }

        async fn bulk(&self, _index: &str, _body: String) -> IndexerResult<BulkResponse> {
            Ok(BulkResponse::default())
        }
    }

    #[tokio::test]
    async fn test_destination_cache_reuses_handles() {
        let pool = IndexerPool::new(
            Arc::new(NullBackend),
            Arc::new(RunCounters::new()),
            "nums_",
            15,
        );

        let first = pool.destination_for("en").await;
        let second = pool.destination_for("en").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.index(), "nums_en_proximity_15");

        pool.destination_for("de").await;
        assert_eq!(pool.close_all().await.unwrap(), 2);
        // the cache was drained, nothing left to close
        assert_eq!(pool.close_all().await.unwrap(), 0);
    }
}
