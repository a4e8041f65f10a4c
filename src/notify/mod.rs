//! Per-record asynchronous acknowledgment
//!
//! After a record's analysis completes, the pipeline acknowledges it through
//! a [`Notifier`]. The shipped implementation simulates a remote API call:
//! it suspends for a configurable latency on the async timer, then emits the
//! correlation id and the analysis result as a structured log event. The
//! suspension never blocks sibling records' analyses.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::analysis::AnalysisResult;

/// Acknowledgment seam of the pipeline. Implementations must tolerate
/// concurrent calls; failures propagate to the orchestrator for the affected
/// record only.
pub trait Notifier: Send + Sync + 'static {
    fn notify(
        &self,
        record_id: &str,
        result: &AnalysisResult,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Simulated remote acknowledgment with a fixed network round-trip latency.
pub struct ApiNotifier {
    latency: Duration,
}

impl ApiNotifier {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Notifier for ApiNotifier {
    fn notify(
        &self,
        record_id: &str,
        result: &AnalysisResult,
    ) -> impl Future<Output = Result<()>> + Send {
        let latency = self.latency;
        async move {
            tokio::time::sleep(latency).await;
            info!(
                target: "wordmill::notify",
                id = %record_id,
                words = result.stats.word_count,
                rare_score = result.stats.rare_score,
                worker = result.worker,
                "record acknowledged"
            );
            Ok(())
        }
    }
}
