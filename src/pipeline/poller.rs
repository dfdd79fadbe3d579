use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::app::Result;
use crate::domain::{Article, SourceDescriptor};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;
use crate::pipeline::{Batch, PollError};

/// Polls one source on a fixed interval. Holds no state shared with other pollers.
pub struct FeedPoller {
    source: SourceDescriptor,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    etag: Option<String>,
    last_modified: Option<String>,
}

impl FeedPoller {
    pub fn new(source: SourceDescriptor, fetcher: Arc<dyn Fetcher + Send + Sync>, normalizer: Normalizer) -> Self {
        Self {
            source,
            fetcher,
            normalizer,
            etag: None,
            last_modified: None,
        }
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    /// One fetch + normalize cycle. An unchanged feed (HTTP 304) yields an empty batch.
    pub async fn poll_once(&mut self) -> Result<Vec<Article>> {
        let result = self
            .fetcher
            .fetch(
                &self.source.url,
                self.etag.as_deref(),
                self.last_modified.as_deref(),
            )
            .await?;

        match result {
            FetchResult::NotModified => {
                tracing::debug!(source = %self.source.url, "feed not modified");
                Ok(Vec::new())
            }
            FetchResult::Content {
                body,
                etag,
                last_modified,
            } => {
                let normalized = self.normalizer.normalize(&self.source.url, &body)?;
                // Only remember validators once the body has been accepted.
                self.etag = etag;
                self.last_modified = last_modified;

                if normalized.skipped > 0 {
                    tracing::info!(source = %self.source.url, skipped = normalized.skipped, "entries skipped");
                }
                Ok(normalized.articles)
            }
        }
    }

    /// Poll until `shutdown` flips or its sender is dropped.
    ///
    /// Failures go to `errors` and the next attempt waits the same interval as after a success.
    pub async fn run(
        mut self,
        batches: mpsc::Sender<Batch>,
        errors: mpsc::Sender<PollError>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let interval = self.source.interval;

        while !*shutdown.borrow() {
            let outcome = tokio::select! {
                _ = shutdown.changed() => break,
                outcome = self.poll_once() => outcome,
            };

            match outcome {
                Ok(articles) if articles.is_empty() => {}
                Ok(articles) => {
                    tracing::debug!(source = %self.source.url, count = articles.len(), "batch ready");
                    let batch = Batch {
                        source: self.source.url.clone(),
                        articles,
                    };
                    if batches.send(batch).await.is_err() {
                        tracing::warn!(source = %self.source.url, "writer gone, stopping poller");
                        break;
                    }
                }
                Err(error) => {
                    let report = PollError {
                        source: self.source.url.clone(),
                        error,
                    };
                    if errors.send(report).await.is_err() {
                        break;
                    }
                }
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        tracing::debug!(source = %self.source.url, "poller stopped");
    }
}
