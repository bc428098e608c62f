//! Single-lane outbound request queue.
//!
//! Tasks run one at a time in the order they were added, and the worker
//! waits a fixed delay after every task (whatever its outcome) before it
//! starts the next one. A task keeps running even if its caller stops
//! waiting for the result.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::metrics::RATE_LIMITER_QUEUED;

/// Default spacing between outbound calls.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Errors returned to the caller of [`RateLimiter::add`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimiterError {
    /// The worker is gone and no longer accepts tasks.
    #[error("Rate limiter is closed")]
    Closed,

    /// The task panicked before producing a result.
    #[error("Rate-limited task failed before completing")]
    TaskFailed,
}

/// Handle for scheduling rate-limited tasks.
///
/// Cheap to clone; all clones feed the same worker.
#[derive(Clone)]
pub struct RateLimiter {
    tx: mpsc::UnboundedSender<Job>,
    delay: Duration,
}

impl RateLimiter {
    /// Create a limiter and spawn its worker on the current Tokio runtime.
    pub fn new(delay: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(RateLimitWorker { rx, delay }.run());
        Self { tx, delay }
    }

    /// Minimum delay enforced between tasks.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Enqueue a task and wait for its output.
    pub async fn add<F, T>(&self, task: F) -> Result<T, RateLimiterError>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let output = task.await;
            // The caller may have gone away; the task still ran.
            let _ = reply_tx.send(output);
        });

        RATE_LIMITER_QUEUED.inc();
        if self.tx.send(job).is_err() {
            RATE_LIMITER_QUEUED.dec();
            return Err(RateLimiterError::Closed);
        }

        reply_rx.await.map_err(|_| RateLimiterError::TaskFailed)
    }
}

/// Background task draining the queue.
struct RateLimitWorker {
    rx: mpsc::UnboundedReceiver<Job>,
    delay: Duration,
}

impl RateLimitWorker {
    async fn run(mut self) {
        debug!("Rate limiter started (delay {:?})", self.delay);

        while let Some(job) = self.rx.recv().await {
            RATE_LIMITER_QUEUED.dec();

            // Run on its own task so a panic only fails this job.
            if let Err(e) = tokio::spawn(job).await {
                warn!("Rate-limited task failed: {}", e);
            }

            sleep(self.delay).await;
        }

        debug!("Rate limiter shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_tasks_are_spaced_by_delay() {
        let limiter = RateLimiter::new(Duration::from_millis(500));
        let starts = Arc::new(Mutex::new(Vec::new()));

        let tasks = (0..5).map(|i| {
            let starts = starts.clone();
            limiter.add(async move {
                starts.lock().unwrap().push(Instant::now());
                i
            })
        });
        let results = futures::future::join_all(tasks).await;

        let results: Vec<i32> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(results, vec![0, 1, 2, 3, 4]);

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 5);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_order() {
        let limiter = RateLimiter::new(Duration::from_millis(10));
        let order = Arc::new(Mutex::new(Vec::new()));

        let tasks = ["a", "b", "c", "d"].into_iter().map(|name| {
            let order = order.clone();
            limiter.add(async move {
                order.lock().unwrap().push(name);
            })
        });
        futures::future::join_all(tasks).await;

        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_goes_only_to_its_caller() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let failing = limiter.add(async { Err::<u32, String>("boom".to_string()) });
        let ok = limiter.add(async { Ok::<u32, String>(7) });
        let (failing, ok) = tokio::join!(failing, ok);

        assert_eq!(failing.unwrap(), Err("boom".to_string()));
        assert_eq!(ok.unwrap(), Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_does_not_stop_worker() {
        let limiter = RateLimiter::new(Duration::from_millis(100));

        let panicking = limiter.add(async {
            if true {
                panic!("task blew up");
            }
            1u32
        });
        let next = limiter.add(async { 2u32 });
        let (panicking, next) = tokio::join!(panicking, next);

        assert_eq!(panicking, Err(RateLimiterError::TaskFailed));
        assert_eq!(next, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_worker_resumes_on_enqueue() {
        let limiter = RateLimiter::new(Duration::from_millis(500));

        assert_eq!(limiter.add(async { 1 }).await, Ok(1));
        tokio::time::sleep(Duration::from_secs(10)).await;

        let before = Instant::now();
        assert_eq!(limiter.add(async { 2 }).await, Ok(2));
        assert!(Instant::now() - before < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_task_still_runs() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let ran = Arc::new(Mutex::new(false));

        let flag = ran.clone();
        let abandoned = tokio::spawn({
            let limiter = limiter.clone();
            async move {
                limiter
                    .add(async move {
                        *flag.lock().unwrap() = true;
                    })
                    .await
            }
        });
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        abandoned.abort();

        // A later task can only finish after the earlier one ran.
        limiter.add(async {}).await.unwrap();
        assert!(*ran.lock().unwrap());
    }
}
