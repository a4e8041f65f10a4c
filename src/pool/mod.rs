//! Fixed-size worker pool for CPU-bound jobs
//!
//! A set of dedicated OS threads pulls jobs from a shared FIFO channel and
//! delivers each result through a oneshot handle, so callers on the async
//! runtime can await individual jobs without blocking the scheduler.
//!
//! Jobs cross the pool boundary by value in both directions: the item moves
//! into the worker thread and the result moves back through the handle.
//! Nothing is aliased across threads, so the work function needs no locks.
//!
//! At most `size` jobs execute simultaneously; additional submissions queue
//! in arrival order and are dispatched as workers free up. An error or panic
//! inside the work function resolves only that job's handle; the worker
//! thread itself survives.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use anyhow::Result;
use crossbeam::channel::{Receiver, Sender, unbounded};
use thiserror::Error;
use tokio::sync::oneshot;

/// Why a submitted job did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The work function returned an error or panicked for this job.
    #[error("job failed: {0}")]
    Job(String),
    /// The job was discarded before dispatch by a hard shutdown.
    #[error("job cancelled before dispatch")]
    Cancelled,
    /// The pool was released before the job could run.
    #[error("worker pool is no longer running")]
    PoolClosed,
}

struct Job<T, R> {
    item: T,
    reply: oneshot::Sender<Result<R, PoolError>>,
}

/// Handle to one in-flight job. Awaiting it suspends the caller until the
/// worker finishes; other tasks keep running in the meantime.
pub struct JobHandle<R> {
    rx: oneshot::Receiver<Result<R, PoolError>>,
}

impl<R> JobHandle<R> {
    /// Resolves to the job's result once a worker has executed it.
    pub async fn result(self) -> Result<R, PoolError> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(PoolError::PoolClosed),
        }
    }
}

/// Fixed-size pool of worker threads executing one work function.
pub struct WorkerPool<T, R> {
    job_tx: Option<Sender<Job<T, R>>>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
    cancel: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl<T, R> WorkerPool<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Spawn `size` worker threads running `work_fn`. The work function
    /// receives the id of the worker executing it alongside the item.
    pub fn new<F>(size: usize, work_fn: F) -> Self
    where
        F: Fn(usize, T) -> Result<R> + Send + Sync + 'static,
    {
        let size = size.max(1);
        let (job_tx, job_rx) = unbounded::<Job<T, R>>();
        let work_fn = Arc::new(work_fn);
        let cancel = Arc::new(AtomicBool::new(false));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak_in_flight = Arc::new(AtomicUsize::new(0));

        let workers = (0..size)
            .map(|worker_id| {
                let job_rx = job_rx.clone();
                let work_fn = work_fn.clone();
                let cancel = cancel.clone();
                let in_flight = in_flight.clone();
                let peak_in_flight = peak_in_flight.clone();

                std::thread::spawn(move || {
                    Self::worker_loop(worker_id, job_rx, work_fn, cancel, in_flight, peak_in_flight)
                })
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            workers,
            size,
            cancel,
            in_flight,
            peak_in_flight,
        }
    }

    fn worker_loop(
        worker_id: usize,
        job_rx: Receiver<Job<T, R>>,
        work_fn: Arc<dyn Fn(usize, T) -> Result<R> + Send + Sync>,
        cancel: Arc<AtomicBool>,
        in_flight: Arc<AtomicUsize>,
        peak_in_flight: Arc<AtomicUsize>,
    ) {
        while let Ok(job) = job_rx.recv() {
            if cancel.load(Ordering::SeqCst) {
                let _ = job.reply.send(Err(PoolError::Cancelled));
                continue;
            }

            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak_in_flight.fetch_max(current, Ordering::SeqCst);

            let item = job.item;
            let outcome = catch_unwind(AssertUnwindSafe(|| work_fn(worker_id, item)));

            in_flight.fetch_sub(1, Ordering::SeqCst);

            let result = match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(PoolError::Job(e.to_string())),
                Err(_) => Err(PoolError::Job(format!("panic on worker {worker_id}"))),
            };

            // The submitter may have stopped waiting (timeout, cancellation)
            let _ = job.reply.send(result);
        }
    }

    /// Enqueue one job. Returns immediately; dispatch order equals arrival
    /// order. The handle resolves once a worker has executed the job.
    pub fn submit(&self, item: T) -> JobHandle<R> {
        let (reply_tx, reply_rx) = oneshot::channel();

        if let Some(tx) = &self.job_tx {
            // A failed send drops the reply sender, resolving the handle to
            // PoolClosed.
            let _ = tx.send(Job { item, reply: reply_tx });
        }

        JobHandle { rx: reply_rx }
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Highest number of jobs observed executing simultaneously. Never
    /// exceeds `size()`.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Jobs currently executing on worker threads.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Release the pool after draining all queued and in-flight jobs.
    pub fn shutdown(mut self) {
        self.release();
    }

    /// Hard cancellation: jobs still queued resolve to [`PoolError::Cancelled`];
    /// jobs already executing run to completion before workers exit.
    pub fn shutdown_now(mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.release();
    }

}

impl<T, R> WorkerPool<T, R> {
    fn release(&mut self) {
        self.job_tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl<T, R> Drop for WorkerPool<T, R> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn doubling_pool(size: usize) -> WorkerPool<u64, u64> {
        WorkerPool::new(size, |_, x: u64| Ok(x * 2))
    }

    #[tokio::test]
    async fn executes_submitted_jobs() {
        let pool = doubling_pool(2);
        let handles: Vec<_> = (1..=5).map(|x| pool.submit(x)).collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.result().await.unwrap());
        }
        results.sort_unstable();
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[tokio::test]
    async fn job_error_is_isolated() {
        let pool = WorkerPool::new(2, |_, x: u64| {
            if x == 3 {
                Err(anyhow::anyhow!("bad item"))
            } else {
                Ok(x * 2)
            }
        });

        let handles: Vec<_> = (1..=5).map(|x| pool.submit(x)).collect();
        let mut ok = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.result().await {
                Ok(_) => ok += 1,
                Err(PoolError::Job(msg)) => {
                    assert!(msg.contains("bad item"));
                    failed += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((ok, failed), (4, 1));
    }

    #[tokio::test]
    async fn panic_does_not_kill_the_worker() {
        let pool = WorkerPool::new(1, |_, x: u64| {
            if x == 1 {
                panic!("boom");
            }
            Ok(x)
        });

        let first = pool.submit(1);
        let second = pool.submit(2);

        assert!(matches!(first.result().await, Err(PoolError::Job(_))));
        // The single worker survived the panic and still serves the queue
        assert_eq!(second.result().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_pool_size() {
        let pool: WorkerPool<u64, u64> = WorkerPool::new(2, |_, x: u64| {
            std::thread::sleep(Duration::from_millis(20));
            Ok(x)
        });

        let handles: Vec<_> = (0..8).map(|x| pool.submit(x)).collect();
        for handle in handles {
            handle.result().await.unwrap();
        }

        assert!(pool.peak_in_flight() <= 2);
        assert!(pool.peak_in_flight() >= 1);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn graceful_shutdown_drains_queued_jobs() {
        let pool = doubling_pool(1);
        let handles: Vec<_> = (1..=4).map(|x| pool.submit(x)).collect();

        tokio::task::spawn_blocking(move || pool.shutdown())
            .await
            .unwrap();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.result().await.unwrap(), (i as u64 + 1) * 2);
        }
    }

    #[tokio::test]
    async fn hard_shutdown_cancels_undispatched_jobs() {
        let pool: WorkerPool<u64, u64> = WorkerPool::new(1, |_, x: u64| {
            std::thread::sleep(Duration::from_millis(100));
            Ok(x)
        });

        let first = pool.submit(1);
        let rest: Vec<_> = (2..=4).map(|x| pool.submit(x)).collect();

        // Give the worker time to pick up the first job before cancelling
        tokio::time::sleep(Duration::from_millis(30)).await;
        tokio::task::spawn_blocking(move || pool.shutdown_now())
            .await
            .unwrap();

        assert_eq!(first.result().await.unwrap(), 1);
        for handle in rest {
            assert_eq!(handle.result().await, Err(PoolError::Cancelled));
        }
    }

    #[tokio::test]
    async fn zero_size_is_clamped_to_one_worker() {
        let pool = doubling_pool(0);
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.submit(21).result().await.unwrap(), 42);
    }
}
