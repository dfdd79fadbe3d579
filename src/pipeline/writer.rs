use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::app::Result;
use crate::pipeline::{Batch, PipelineStats};
use crate::store::SharedStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub inserted: usize,
    pub duplicates: usize,
}

/// The only component that writes articles. One instance drains the batch channel,
/// so inserts never run concurrently.
pub struct IngestionWriter {
    store: SharedStore,
    stats: Arc<PipelineStats>,
}

impl IngestionWriter {
    pub fn new(store: SharedStore, stats: Arc<PipelineStats>) -> Self {
        Self { store, stats }
    }

    /// Persist the batch in order, one insert per article, deriving each preview first.
    ///
    /// Stops at the first failed insert; articles before it stay written, the rest are dropped.
    pub fn write_batch(&self, batch: Batch) -> Result<WriteOutcome> {
        let mut outcome = WriteOutcome::default();

        for article in batch.articles {
            let article = article.with_preview();
            match self.store.insert(&article)? {
                Some(_) => outcome.inserted += 1,
                None => outcome.duplicates += 1,
            }
        }

        self.stats.batches_written.fetch_add(1, Ordering::Relaxed);
        self.stats
            .articles_inserted
            .fetch_add(outcome.inserted as u64, Ordering::Relaxed);
        self.stats
            .duplicates_skipped
            .fetch_add(outcome.duplicates as u64, Ordering::Relaxed);

        Ok(outcome)
    }

    /// Drain `batches` until every sender is dropped.
    pub async fn run(self, mut batches: mpsc::Receiver<Batch>) {
        while let Some(batch) = batches.recv().await {
            let source = batch.source.clone();
            let size = batch.articles.len();

            match self.write_batch(batch) {
                Ok(outcome) => {
                    tracing::info!(
                        source = %source,
                        inserted = outcome.inserted,
                        duplicates = outcome.duplicates,
                        "batch written"
                    );
                }
                Err(e) => {
                    self.stats.write_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(source = %source, size, error = %e, "failed to write batch");
                }
            }
        }
        tracing::debug!("ingestion writer closed");
    }
}
