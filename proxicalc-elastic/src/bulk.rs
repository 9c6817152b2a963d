//! Batched bulk-write destination handle
//!
//! One `BulkIndexer` per target index. Submitted actions accumulate in an
//! internal buffer that is flushed when it reaches the batch size, on a fixed
//! timer, and finally on close. Every flushed item is acknowledged
//! independently by the backend; successes and failures feed the run
//! counters, failures are additionally logged with the source document id.

use crate::backend::SearchBackend;
use crate::types::BulkItemDetail;
use proxicalc_core::{IndexerError, IndexerResult, RunCounters};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

/// Default number of buffered actions that triggers a flush.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default interval of the background auto-flush.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// Point-in-time accounting for one destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkStats {
    /// Items acknowledged as indexed.
    pub flushed: u64,
    /// Items rejected by the backend or lost to a failed bulk request.
    pub failed: u64,
}

struct PendingAction {
    source_id: String,
    line: String,
}

struct BulkInner {
    index: String,
    backend: Arc<dyn SearchBackend>,
    counters: Arc<RunCounters>,
    buffer: Mutex<Vec<PendingAction>>,
    flushed: AtomicU64,
    failed: AtomicU64,
}

impl BulkInner {
    /// Send everything currently buffered as one `_bulk` request.
    ///
    /// Item-level and transport-level failures are both recoverable: they
    /// only move counters and emit warnings, the run continues.
    async fn flush(&self) {
        let actions = {
            let mut buffer = self.buffer.lock().await;
            if buffer.is_empty() {
                return;
            }
            std::mem::take(&mut *buffer)
        };

        let mut body = String::with_capacity(actions.iter().map(|a| a.line.len() + 16).sum());
        for action in &actions {
            body.push_str("{\"index\":{}}\n");
            body.push_str(&action.line);
            body.push('\n');
        }

        debug!(index = %self.index, actions = actions.len(), "Flushing bulk buffer");

        match self.backend.bulk(&self.index, body).await {
            Ok(response) => {
                let mut items = response.items.into_iter();
                for action in &actions {
                    let detail: Option<BulkItemDetail> = items.next().and_then(|item| item.index);
                    match detail {
                        Some(detail) if detail.is_success() => {
                            self.flushed.fetch_add(1, Ordering::Relaxed);
                            self.counters.add_succeeded(1);
                        }
                        Some(detail) => {
                            self.failed.fetch_add(1, Ordering::Relaxed);
                            self.counters.add_failed(1);
                            match detail.error {
                                Some(error) => warn!(
                                    source_id = %action.source_id,
                                    error_type = %error.kind,
                                    reason = %error.reason,
                                    "Bulk item rejected"
                                ),
                                None => warn!(
                                    source_id = %action.source_id,
                                    status = detail.status,
                                    "Bulk item rejected"
                                ),
                            }
                        }
                        None => {
                            self.failed.fetch_add(1, Ordering::Relaxed);
                            self.counters.add_failed(1);
                            warn!(
                                source_id = %action.source_id,
                                "Bulk item missing from acknowledgment"
                            );
                        }
                    }
                }
            }
            Err(e) => {
                self.failed
                    .fetch_add(actions.len() as u64, Ordering::Relaxed);
                self.counters.add_failed(actions.len() as u64);
                for action in &actions {
                    warn!(
                        source_id = %action.source_id,
                        error = %e,
                        "Bulk request failed"
                    );
                }
            }
        }
    }
}

/// Cached handle to one per-(language, ambit) target index.
pub struct BulkIndexer {
    inner: Arc<BulkInner>,
    batch_size: usize,
    shutdown: std::sync::Mutex<Option<oneshot::Sender<()>>>,
}

impl BulkIndexer {
    /// Create a handle and start its background auto-flush task.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        index: impl Into<String>,
        counters: Arc<RunCounters>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Self {
        let inner = Arc::new(BulkInner {
            index: index.into(),
            backend,
            counters,
            buffer: Mutex::new(Vec::new()),
            flushed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task_inner = Arc::clone(&inner);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(flush_interval);
            // the first tick completes immediately
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        task_inner.flush().await;
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }
        });

        Self {
            inner,
            batch_size,
            shutdown: std::sync::Mutex::new(Some(shutdown_tx)),
        }
    }

    /// Target index this handle writes to.
    pub fn index(&self) -> &str {
        &self.inner.index
    }

    /// Enqueue one pre-serialized record, flushing if the buffer is full.
    pub async fn add(&self, source_id: String, line: String) {
        let trigger_flush = {
            let mut buffer = self.inner.buffer.lock().await;
            buffer.push(PendingAction { source_id, line });
            buffer.len() >= self.batch_size
        };

        if trigger_flush {
            self.inner.flush().await;
        }
    }

    /// Point-in-time stats. Items buffered but not yet flushed are counted
    /// in neither field.
    pub fn stats(&self) -> BulkStats {
        BulkStats {
            flushed: self.inner.flushed.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
        }
    }

    /// Stop the auto-flush task and flush the remaining buffer.
    ///
    /// Valid exactly once per handle; a second call is an error.
    pub async fn close(&self) -> IndexerResult<()> {
        let shutdown_tx = {
            let mut guard = self
                .shutdown
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.take()
        };

        let shutdown_tx = shutdown_tx.ok_or_else(|| {
            IndexerError::Bulk(format!("Destination {} closed twice", self.inner.index))
        })?;
        // the task may already be gone; the final flush below still runs
        let _ = shutdown_tx.send(());

        self.inner.flush().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BulkResponse, ScrollPage};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    /// Backend that acknowledges every item, counting requests.
    struct AckAllBackend {
        requests: AtomicUsize,
    }

    #[async_trait]
    impl SearchBackend for AckAllBackend {
        async fn open_scroll(
            &self,
            _index: &str,
            _sort_key: &str,
            _page_size: usize,
            _keep_alive: Duration,
        ) -> IndexerResult<ScrollPage> {
            unimplemented!("not used by bulk tests")
        }

        async fn next_page(
            &self,
            _scroll_id: &str,
            _keep_alive: Duration,
        ) -> IndexerResult<ScrollPage> {
            unimplemented!("not used by bulk tests")
        }

        async fn bulk(&self, _index: &str, body: String) -> IndexerResult<BulkResponse> {
            self.requests.fetch_add(1, Ordering::Relaxed);
            let docs = body.lines().count() / 2;
            let items = (0..docs)
                .map(|_| r#"{"index": {"status": 201}}"#)
                .collect::<Vec<_>>()
                .join(",");
            Ok(serde_json::from_str(&format!(
                r#"{{"errors": false, "items": [{}]}}"#,
                items
            ))
            .expect("valid bulk response"))
        }
    }

    #[tokio::test]
    async fn test_batch_size_triggers_flush() {
        let backend = Arc::new(AckAllBackend {
            requests: AtomicUsize::new(0),
        });
        let counters = Arc::new(RunCounters::new());
        let indexer = BulkIndexer::new(
            backend.clone(),
            "prefix_en_proximity_2",
            counters.clone(),
            2,
            Duration::from_secs(3600),
        );

        indexer.add("doc-1".into(), r#"{"num":1.0}"#.into()).await;
        assert_eq!(backend.requests.load(Ordering::Relaxed), 0);

        indexer.add("doc-2".into(), r#"{"num":2.0}"#.into()).await;
        assert_eq!(backend.requests.load(Ordering::Relaxed), 1);
        assert_eq!(indexer.stats().flushed, 2);
        assert_eq!(counters.succeeded(), 2);

        indexer.close().await.unwrap();
        // nothing pending, no extra request
        assert_eq!(backend.requests.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_close_flushes_and_rejects_second_close() {
        let backend = Arc::new(AckAllBackend {
            requests: AtomicUsize::new(0),
        });
        let counters = Arc::new(RunCounters::new());
        let indexer = BulkIndexer::new(
            backend.clone(),
            "prefix_de_proximity_2",
            counters.clone(),
            100,
            Duration::from_secs(3600),
        );

        indexer.add("doc-1".into(), r#"{"num":1.0}"#.into()).await;
        indexer.close().await.unwrap();

        assert_eq!(backend.requests.load(Ordering::Relaxed), 1);
        assert_eq!(indexer.stats().flushed, 1);
        assert!(indexer.close().await.is_err());
    }

    /// Backend whose bulk endpoint always fails at the transport level.
    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        async fn open_scroll(
            &self,
            _index: &str,
            _sort_key: &str,
            _page_size: usize,
            _keep_alive: Duration,
        ) -> IndexerResult<ScrollPage> {
            unimplemented!("not used by bulk tests")
        }

        async fn next_page(
            &self,
            _scroll_id: &str,
            _keep_alive: Duration,
        ) -> IndexerResult<ScrollPage> {
            unimplemented!("not used by bulk tests")
        }

        async fn bulk(&self, _index: &str, _body: String) -> IndexerResult<BulkResponse> {
            Err(IndexerError::Backend("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_transport_failure_counts_every_item() {
        let counters = Arc::new(RunCounters::new());
        let indexer = BulkIndexer::new(
            Arc::new(FailingBackend),
            "prefix_fr_proximity_2",
            counters.clone(),
            100,
            Duration::from_secs(3600),
        );

        indexer.add("doc-1".into(), r#"{"num":1.0}"#.into()).await;
        indexer.add("doc-2".into(), r#"{"num":2.0}"#.into()).await;
        indexer.close().await.unwrap();

        assert_eq!(indexer.stats(), BulkStats { flushed: 0, failed: 2 });
        assert_eq!(counters.failed(), 2);
    }
}
