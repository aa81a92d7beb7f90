//! Bounded fan-out/fan-in over a batch of keys.
//!
//! A dispatch fills a job queue with every key and closes it, starts at most
//! `workers` tasks that pull keys and push one outcome per key onto a results
//! queue, and merges outcomes in completion order. The first error ends the
//! merge; the dispatch's cancellation token is fired on every exit path so
//! in-flight workers drop their provider calls instead of running on.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

pub const DEFAULT_WORKERS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl Dispatcher {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `op` once per key and concatenates the successful outputs.
    ///
    /// Returns after exactly one outcome per key has been received, or on the
    /// first error. Output order follows completion, not input.
    pub async fn dispatch<K, T, F, Fut>(&self, keys: Vec<K>, op: F) -> AppResult<Vec<T>>
    where
        K: Send + 'static,
        T: Send + 'static,
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Vec<T>>> + Send + 'static,
    {
        let total = keys.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (job_tx, job_rx) = mpsc::channel(total);
        for key in keys {
            job_tx
                .send(key)
                .await
                .map_err(|_| AppError::Internal("dispatch job queue closed".to_string()))?;
        }
        drop(job_tx);

        let jobs = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel(total);
        let cancel = CancellationToken::new();
        // Fires on every return path, including the caller dropping this future.
        let _abort_on_exit = cancel.clone().drop_guard();
        let op = Arc::new(op);

        let pool_size = self.workers.min(total);
        for worker in 0..pool_size {
            tokio::spawn(run_worker(
                worker,
                jobs.clone(),
                result_tx.clone(),
                op.clone(),
                cancel.child_token(),
            ));
        }
        drop(result_tx);

        tracing::debug!(keys = total, workers = pool_size, "Dispatch started");

        let mut merged = Vec::new();
        for received in 0..total {
            match result_rx.recv().await {
                Some(Ok(items)) => merged.extend(items),
                Some(Err(e)) => {
                    tracing::warn!(
                        error = %e,
                        received = received + 1,
                        keys = total,
                        "Dispatch aborted on first error"
                    );
                    return Err(e);
                }
                None => {
                    return Err(AppError::Internal(format!(
                        "dispatch workers exited after {} of {} results",
                        received, total
                    )));
                }
            }
        }

        tracing::debug!(keys = total, items = merged.len(), "Dispatch completed");
        Ok(merged)
    }
}

async fn run_worker<K, T, F, Fut>(
    worker: usize,
    jobs: Arc<Mutex<mpsc::Receiver<K>>>,
    results: mpsc::Sender<AppResult<Vec<T>>>,
    op: Arc<F>,
    cancel: CancellationToken,
) where
    F: Fn(K) -> Fut,
    Fut: Future<Output = AppResult<Vec<T>>>,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            job = async { jobs.lock().await.recv().await } => job,
        };
        let Some(key) = next else { break };

        let outcome = tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = op(key) => outcome,
        };

        if results.send(outcome).await.is_err() {
            break;
        }
    }

    tracing::trace!(worker, cancelled = cancel.is_cancelled(), "Dispatch worker stopped");
}
