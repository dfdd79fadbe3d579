use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::pipeline::{PipelineStats, PollError};

/// Log every poller failure until all senders are gone. Never stops the process.
pub async fn run(mut errors: mpsc::Receiver<PollError>, stats: Arc<PipelineStats>) {
    while let Some(PollError { source, error }) = errors.recv().await {
        stats.poll_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(source = %source, error = %error, "poll failed");
    }
    tracing::debug!("error sink closed");
}
