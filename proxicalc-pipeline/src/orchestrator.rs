//! Pipeline orchestrator
//!
//! Drives the run: open the scroll, spawn one extraction task per fetched
//! page, and at each join barrier (chunk threshold reached, or end of
//! stream) wait for every outstanding task before draining the buffer. Pages
//! are fetched strictly in sequence; extraction tasks for consecutive pages
//! overlap freely between barriers.

use crate::buffer::ProximityBuffer;
use crate::extract::Extractor;
use crate::scroll::SourcePaginator;
use crate::uploader::IndexerPool;
use proxicalc_core::{IndexerConfig, IndexerError, IndexerResult, RunCounters};
use proxicalc_elastic::{DocumentHit, SearchBackend};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::info;

/// Final tallies of one completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Expected document count from the initial search.
    pub total_docs: u64,
    /// Documents actually processed.
    pub processed_docs: u64,
    /// Records acknowledged by the backend.
    pub succeeded: u64,
    /// Records that failed to index.
    pub failed: u64,
    /// Flush cycles executed.
    pub cycles: u64,
    /// Destinations closed at shutdown.
    pub destinations_closed: usize,
    pub elapsed: Duration,
}

/// The fetch → process → flush state machine.
pub struct ProximityPipeline {
    config: IndexerConfig,
    backend: Arc<dyn SearchBackend>,
    buffer: Arc<ProximityBuffer>,
    counters: Arc<RunCounters>,
    extractor: Extractor,
    pool: IndexerPool,
}

impl ProximityPipeline {
    pub fn new(config: IndexerConfig, backend: Arc<dyn SearchBackend>) -> Self {
        let counters = Arc::new(RunCounters::new());
        let pool = IndexerPool::new(
            Arc::clone(&backend),
            Arc::clone(&counters),
            config.indexing.target_prefix.clone(),
            config.indexing.ambit,
        );
        let extractor = Extractor::new(config.indexing.source_index.clone(), config.indexing.ambit);

        Self {
            config,
            backend,
            buffer: Arc::new(ProximityBuffer::new()),
            counters,
            extractor,
            pool,
        }
    }

    /// Shared record buffer, exposed for inspection.
    pub fn buffer(&self) -> &Arc<ProximityBuffer> {
        &self.buffer
    }

    /// Run-wide counters, exposed for inspection.
    pub fn counters(&self) -> &Arc<RunCounters> {
        &self.counters
    }

    /// Run the pipeline to completion.
    pub async fn run(&self) -> IndexerResult<RunSummary> {
        let started = Instant::now();
        let paginator = SourcePaginator::new(Arc::clone(&self.backend), &self.config.indexing);

        let first = paginator.open().await?;
        self.counters.set_total_docs(first.total);
        info!(
            source_index = %self.config.indexing.source_index,
            expected_docs = first.total,
            ambit = self.config.indexing.ambit,
            "Run started"
        );

        let mut scroll_id = first.scroll_id;
        let mut tasks = vec![self.spawn_extraction(first.hits)];

        loop {
            // any fetch error here is fatal, including an expired cursor
            let page = paginator.next(&scroll_id).await?;
            scroll_id = page.scroll_id;

            if page.hits.is_empty() {
                Self::join_tasks(&mut tasks).await?;
                self.flush(started).await?;
                break;
            }

            tasks.push(self.spawn_extraction(page.hits));

            if self.buffer.reached(self.config.indexing.chunk_threshold) {
                Self::join_tasks(&mut tasks).await?;
                self.flush(started).await?;
            }
        }

        let destinations_closed = self.pool.close_all().await?;
        let elapsed = started.elapsed();

        let summary = RunSummary {
            total_docs: self.counters.total_docs(),
            processed_docs: self.counters.overall_docs(),
            succeeded: self.counters.succeeded(),
            failed: self.counters.failed(),
            cycles: self.counters.cycles(),
            destinations_closed,
            elapsed,
        };

        info!(
            processed_docs = summary.processed_docs,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cycles = summary.cycles,
            destinations_closed = summary.destinations_closed,
            elapsed_s = summary.elapsed.as_secs(),
            "Run finished"
        );

        Ok(summary)
    }

    fn spawn_extraction(&self, hits: Vec<DocumentHit>) -> JoinHandle<()> {
        let extractor = self.extractor.clone();
        let buffer = Arc::clone(&self.buffer);
        let counters = Arc::clone(&self.counters);

        tokio::spawn(async move {
            for hit in &hits {
                extractor.process_hit(hit, &buffer, &counters);
            }
        })
    }

    /// Join barrier: wait for every outstanding extraction task, so the
    /// buffer is quiescent before it is drained.
    async fn join_tasks(tasks: &mut Vec<JoinHandle<()>>) -> IndexerResult<()> {
        let results = futures::future::join_all(tasks.drain(..)).await;
        for result in results {
            result
                .map_err(|e| IndexerError::Pipeline(format!("Extraction task failed: {}", e)))?;
        }
        Ok(())
    }

    async fn flush(&self, started: Instant) -> IndexerResult<()> {
        let cycle = self.counters.next_cycle();
        info!(cycle, buffered = self.buffer.total_len(), "Flush cycle started");

        self.pool.drain_cycle(&self.buffer).await?;

        let cycle_docs = self.counters.take_cycle_docs();
        info!(
            cycle,
            docs_this_cycle = cycle_docs,
            docs_total = self.counters.overall_docs(),
            expected_docs = self.counters.total_docs(),
            percent = self.counters.percent_complete(),
            elapsed_s = started.elapsed().as_secs(),
            "Flush cycle finished"
        );

        Ok(())
    }
}
