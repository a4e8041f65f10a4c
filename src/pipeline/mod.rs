//! Fan-out/fan-in orchestration
//!
//! The pipeline launches one task per record, in input order: submit the
//! record's text to the worker pool, await the analysis result, then await
//! the notifier's acknowledgment. Tasks run concurrently and complete in any
//! order; the concurrency of the analysis stage is bounded by the pool size.
//!
//! Fan-in uses collect-all semantics: a failing task never aborts its
//! siblings, and every launched task is reported with exactly one terminal
//! outcome. Each stage runs under the configured timeout, so a hung analysis
//! or acknowledgment cannot stall the batch. Outcomes are logged and
//! aggregated in completion order.
//!
//! Cancelling the batch (via the shutdown future handed to
//! [`Pipeline::run_until`]) aborts the remaining tasks, reports them as
//! cancelled, and releases the worker pool without waiting for queued work.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{AnalysisResult, analyze_content};
use crate::notify::Notifier;
use crate::pool::{PoolError, WorkerPool};
use crate::source::Record;

/// The pipeline stage a record's task was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analysis,
    Notify,
}

/// Terminal error of one record's task, tagged with the stage that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskError {
    #[error("analysis failed: {0}")]
    Analysis(String),
    #[error("notification failed: {0}")]
    Notify(String),
    #[error("{stage:?} stage timed out")]
    Timeout { stage: Stage },
    #[error("task cancelled before completion")]
    Cancelled,
}

/// One record's terminal outcome.
#[derive(Debug, Serialize)]
pub struct TaskOutcome {
    pub record_id: String,
    pub outcome: Result<AnalysisResult, TaskError>,
}

impl TaskOutcome {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Aggregated result of one batch run. `outcomes` is in completion order and
/// always holds exactly one entry per launched record.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub run_id: String,
    pub records: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total_words: u64,
    pub total_rare_score: u64,
    pub peak_parallelism: usize,
    pub duration_ms: u64,
    pub outcomes: Vec<TaskOutcome>,
}

/// Orchestrator owning the worker pool and the notifier for one batch.
pub struct Pipeline<N: Notifier> {
    pool: Arc<WorkerPool<Record, AnalysisResult>>,
    notifier: Arc<N>,
    task_timeout: Duration,
}

impl<N: Notifier> Pipeline<N> {
    /// Build a pipeline running the standard content analysis on `workers`
    /// pool threads.
    pub fn new(workers: usize, notifier: N, task_timeout: Duration) -> Self {
        let pool = WorkerPool::new(workers, |worker, record: Record| {
            Ok(AnalysisResult {
                stats: analyze_content(&record.text),
                worker,
            })
        });
        Self::with_pool(pool, notifier, task_timeout)
    }

    /// Build a pipeline around a caller-supplied pool. Lets tests inject
    /// failing or slow analysis functions.
    pub fn with_pool(
        pool: WorkerPool<Record, AnalysisResult>,
        notifier: N,
        task_timeout: Duration,
    ) -> Self {
        Self {
            pool: Arc::new(pool),
            notifier: Arc::new(notifier),
            task_timeout,
        }
    }

    /// Run the batch to completion.
    pub async fn run(self, records: Vec<Record>) -> BatchSummary {
        self.run_until(records, std::future::pending()).await
    }

    /// Run the batch, cancelling cooperatively when `shutdown` resolves:
    /// unfinished tasks are aborted and reported as cancelled, and the pool
    /// discards work that has not been dispatched yet.
    pub async fn run_until(
        self,
        records: Vec<Record>,
        shutdown: impl Future<Output = ()>,
    ) -> BatchSummary {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let total = records.len();

        info!(
            run_id = %run_id,
            records = total,
            workers = self.pool.size(),
            "starting batch"
        );

        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        let mut id_by_task: HashMap<tokio::task::Id, String> = HashMap::with_capacity(total);

        for record in records {
            let pool = Arc::clone(&self.pool);
            let notifier = Arc::clone(&self.notifier);
            let task_timeout = self.task_timeout;
            let record_id = record.id.clone();

            let handle = tasks.spawn(async move {
                let record_id = record.id.clone();
                let outcome = Self::process_record(pool, notifier, task_timeout, record).await;
                TaskOutcome { record_id, outcome }
            });
            id_by_task.insert(handle.id(), record_id);
        }

        let mut outcomes: Vec<TaskOutcome> = Vec::with_capacity(total);
        let mut cancelled = false;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                joined = tasks.join_next_with_id() => {
                    let Some(joined) = joined else { break };
                    let outcome = match joined {
                        Ok((task_id, outcome)) => {
                            id_by_task.remove(&task_id);
                            outcome
                        }
                        Err(join_err) => {
                            let record_id =
                                id_by_task.remove(&join_err.id()).unwrap_or_default();
                            let error = if join_err.is_cancelled() {
                                TaskError::Cancelled
                            } else {
                                TaskError::Analysis(join_err.to_string())
                            };
                            TaskOutcome { record_id, outcome: Err(error) }
                        }
                    };

                    match &outcome.outcome {
                        Ok(result) => info!(
                            run_id = %run_id,
                            id = %outcome.record_id,
                            words = result.stats.word_count,
                            rare_score = result.stats.rare_score,
                            worker = result.worker,
                            "record complete"
                        ),
                        Err(e) => warn!(
                            run_id = %run_id,
                            id = %outcome.record_id,
                            error = %e,
                            "record failed"
                        ),
                    }
                    outcomes.push(outcome);
                }
                _ = &mut shutdown, if !cancelled => {
                    cancelled = true;
                    warn!(run_id = %run_id, "shutdown requested, cancelling remaining tasks");
                    tasks.abort_all();
                }
            }
        }

        let peak_parallelism = self.pool.peak_in_flight();
        if let Ok(pool) = Arc::try_unwrap(self.pool) {
            // Joining worker threads can block; keep it off the scheduler.
            let _ = tokio::task::spawn_blocking(move || {
                if cancelled {
                    pool.shutdown_now()
                } else {
                    pool.shutdown()
                }
            })
            .await;
        }

        let summary = Self::summarize(run_id, started, outcomes, peak_parallelism);
        info!(
            run_id = %summary.run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            duration_ms = summary.duration_ms,
            "batch finished"
        );
        summary
    }

    async fn process_record(
        pool: Arc<WorkerPool<Record, AnalysisResult>>,
        notifier: Arc<N>,
        task_timeout: Duration,
        record: Record,
    ) -> Result<AnalysisResult, TaskError> {
        let record_id = record.id.clone();

        let handle = pool.submit(record);
        let result = match timeout(task_timeout, handle.result()).await {
            Err(_) => return Err(TaskError::Timeout { stage: Stage::Analysis }),
            Ok(Err(PoolError::Cancelled)) => return Err(TaskError::Cancelled),
            Ok(Err(e)) => return Err(TaskError::Analysis(e.to_string())),
            Ok(Ok(result)) => result,
        };

        match timeout(task_timeout, notifier.notify(&record_id, &result)).await {
            Err(_) => Err(TaskError::Timeout { stage: Stage::Notify }),
            Ok(Err(e)) => Err(TaskError::Notify(e.to_string())),
            Ok(Ok(())) => Ok(result),
        }
    }

    fn summarize(
        run_id: String,
        started: Instant,
        outcomes: Vec<TaskOutcome>,
        peak_parallelism: usize,
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            run_id,
            records: outcomes.len(),
            succeeded: 0,
            failed: 0,
            cancelled: 0,
            total_words: 0,
            total_rare_score: 0,
            peak_parallelism,
            duration_ms: started.elapsed().as_millis() as u64,
            outcomes: Vec::new(),
        };

        for outcome in &outcomes {
            match &outcome.outcome {
                Ok(result) => {
                    summary.succeeded += 1;
                    summary.total_words += result.stats.word_count as u64;
                    summary.total_rare_score += result.stats.rare_score;
                }
                Err(TaskError::Cancelled) => summary.cancelled += 1,
                Err(_) => summary.failed += 1,
            }
        }

        summary.outcomes = outcomes;
        summary
    }
}
