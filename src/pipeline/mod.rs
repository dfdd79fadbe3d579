//! Concurrent ingestion: one poller task per source feeding a single writer.
//!
//! ```text
//! FeedPoller x N ──batches──▶ IngestionWriter ──▶ ArticleStore
//!        └────────errors────▶ error sink (log)
//! ```
//!
//! [`Pipeline`] owns both bounded channels and every task it spawns.

pub mod poller;
pub mod sink;
pub mod writer;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::app::NewswireError;
use crate::domain::{Article, SourceDescriptor};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::SharedStore;

pub use poller::FeedPoller;
pub use writer::{IngestionWriter, WriteOutcome};

/// Every article produced by one poll cycle of one source.
#[derive(Debug, Clone)]
pub struct Batch {
    pub source: String,
    pub articles: Vec<Article>,
}

#[derive(Debug)]
pub struct PollError {
    pub source: String,
    pub error: NewswireError,
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub batches_written: AtomicU64,
    pub articles_inserted: AtomicU64,
    pub duplicates_skipped: AtomicU64,
    pub write_errors: AtomicU64,
    pub poll_errors: AtomicU64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_written: self.batches_written.load(Ordering::Relaxed),
            articles_inserted: self.articles_inserted.load(Ordering::Relaxed),
            duplicates_skipped: self.duplicates_skipped.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            poll_errors: self.poll_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub batches_written: u64,
    pub articles_inserted: u64,
    pub duplicates_skipped: u64,
    pub write_errors: u64,
    pub poll_errors: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub batch_capacity: usize,
    pub error_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_capacity: 32,
            error_capacity: 64,
        }
    }
}

pub struct Pipeline {
    shutdown: watch::Sender<bool>,
    pollers: Vec<JoinHandle<()>>,
    writer: JoinHandle<()>,
    sink: JoinHandle<()>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    /// Spawn the writer, the error sink and one poller per source. Must run inside a Tokio runtime.
    pub fn start(
        sources: Vec<SourceDescriptor>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: SharedStore,
        config: PipelineConfig,
    ) -> Self {
        let (batch_tx, batch_rx) = mpsc::channel(config.batch_capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel(config.error_capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(PipelineStats::default());

        let writer = IngestionWriter::new(store, stats.clone());
        let writer = tokio::spawn(writer.run(batch_rx));
        let sink = tokio::spawn(sink::run(error_rx, stats.clone()));

        let normalizer = Normalizer::new();
        let pollers = sources
            .into_iter()
            .map(|source| {
                tracing::info!(source = %source.url, interval_secs = source.interval.as_secs(), "starting poller");
                let poller = FeedPoller::new(source, fetcher.clone(), normalizer.clone());
                tokio::spawn(poller.run(batch_tx.clone(), error_tx.clone(), shutdown_rx.clone()))
            })
            .collect();

        // Writer and sink finish once every poller has dropped its senders.
        drop(batch_tx);
        drop(error_tx);

        Self {
            shutdown,
            pollers,
            writer,
            sink,
            stats,
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    pub fn source_count(&self) -> usize {
        self.pollers.len()
    }

    /// Stop every poller, then let the writer and sink drain what is already queued.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);

        for handle in self.pollers {
            if let Err(e) = handle.await {
                tracing::error!("Poller join error: {}", e);
            }
        }
        if let Err(e) = self.writer.await {
            tracing::error!("Writer join error: {}", e);
        }
        if let Err(e) = self.sink.await {
            tracing::error!("Error sink join error: {}", e);
        }

        tracing::info!(stats = ?self.stats.snapshot(), "pipeline stopped");
    }
}
