use std::cell::Cell;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

type Job<S> = Box<dyn FnOnce(&mut S) -> Result<()> + Send>;

thread_local! {
    static RUNNING_JOB: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running a job until dropped, including when
/// the job unwinds.
struct RunningJobGuard;

impl RunningJobGuard {
    fn enter() -> Self {
        RUNNING_JOB.with(|running| running.set(true));
        Self
    }
}

impl Drop for RunningJobGuard {
    fn drop(&mut self) {
        RUNNING_JOB.with(|running| running.set(false));
    }
}

fn run_job<S>(job: Job<S>, state: &mut S) -> Result<()> {
    let _running = RunningJobGuard::enter();
    job(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("the coordinator queue has shut down")]
    Stopped,
}

/// Serializes all access to a piece of state behind a single background task.
///
/// Jobs run one at a time, in submission order, with exclusive access to the
/// state. The state never leaves the task, so nothing else can reach it.
pub struct Queue<S> {
    inner: Arc<QueueInner<S>>,
}

struct QueueInner<S> {
    sender: mpsc::Sender<Job<S>>,
    shutdown_sender: Option<oneshot::Sender<()>>,
}

impl<S: Send + 'static> Queue<S> {
    /// Move `state` into a new worker task.
    ///
    /// `capacity` bounds the number of pending jobs; submitters wait once it is
    /// reached. Must be called from within a tokio runtime.
    pub fn new(mut state: S, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Job<S>>(capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(job) = receiver.recv() => {
                        if let Err(e) = run_job(job, &mut state) {
                            tracing::error!("Job failed: {e}");
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Queue shutting down");
                        break;
                    }
                    else => break,
                }
            }
        });

        Self {
            inner: Arc::new(QueueInner {
                sender,
                shutdown_sender: Some(shutdown_tx),
            }),
        }
    }

    /// Enqueue `job` without waiting for it to run, waiting only if the
    /// channel is full. A failing job is logged and does not stop the queue.
    pub async fn submit<F>(&self, job: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut S) -> Result<()> + Send + 'static,
    {
        self.inner
            .sender
            .send(Box::new(job))
            .await
            .map_err(|_| ServiceError::Stopped)
    }

    /// Run `job` against the state and wait for its result.
    ///
    /// ## Panics
    ///
    /// Panics when awaited from inside a job running on a queue, which would
    /// otherwise wait on itself forever.
    pub async fn execute<F, R>(&self, job: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        assert!(
            !RUNNING_JOB.with(Cell::get),
            "Queue::execute called from inside a queued job"
        );
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(move |state| {
            reply_tx.send(job(state)).ok();
            Ok(())
        })
        .await?;
        reply_rx.await.map_err(|_| ServiceError::Stopped)
    }
}

impl<S> Clone for Queue<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Drop for QueueInner<S> {
    fn drop(&mut self) {
        if let Some(sender) = self.shutdown_sender.take() {
            sender.send(()).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;
    use tokio::time::sleep;

    use super::*;

    #[tokio::test]
    async fn test_jobs_run_in_order() {
        let queue = Queue::new(Vec::new(), 32);
        for i in 0..5 {
            queue
                .submit(move |seen: &mut Vec<i32>| {
                    seen.push(i);
                    Ok(())
                })
                .await
                .unwrap();
        }
        let seen = queue.execute(|seen| seen.clone()).await.unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_error_job_does_not_stop_queue() {
        let queue = Queue::new(0_i32, 32);

        queue
            .submit(|_| Err(anyhow!("Job failed intentionally")))
            .await
            .unwrap();
        queue
            .submit(|count| {
                *count += 1;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(queue.execute(|count| *count).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_channel_backpressure_submit() {
        let queue = Queue::new(0_usize, 4);

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let queue = queue.clone();
            tasks.push(tokio::spawn(async move {
                queue
                    .submit(|count| {
                        std::thread::sleep(Duration::from_millis(1));
                        *count += 1;
                        Ok(())
                    })
                    .await
                    .expect("Submit should succeed");
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let count = tokio::time::timeout(Duration::from_secs(5), queue.execute(|count| *count))
            .await
            .expect("Queue should drain once slots free up")
            .unwrap();
        assert_eq!(count, 16);
    }

    #[tokio::test]
    async fn test_queue_cloning() {
        let first = Queue::new(0_i32, 32);
        let second = first.clone();

        let a = first.execute(|n| {
            *n += 10;
            *n
        });
        let b = second.execute(|n| {
            *n += 20;
            *n
        });
        let (a, b) = tokio::try_join!(a, b).unwrap();
        assert_eq!(a.max(b), 30);
    }

    #[tokio::test]
    async fn test_execute_from_inside_job_panics() {
        let queue = Queue::new(0_i32, 32);
        let inner = queue.clone();
        let outcome = queue
            .execute(move |_| {
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    let nested = inner.execute(|n| *n);
                    poll_once(nested);
                }))
                .is_err()
            })
            .await
            .unwrap();
        assert!(outcome);
    }

    fn poll_once<F: std::future::Future>(future: F) {
        let waker = std::task::Waker::noop();
        let mut context = std::task::Context::from_waker(waker);
        let mut future = std::pin::pin!(future);
        let _ = future.as_mut().poll(&mut context);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_poison_other_queues() {
        let failing = Queue::new(0_i32, 4);
        let result = failing
            .execute(|_| -> i32 { panic!("job blew up") })
            .await;
        assert!(matches!(result, Err(ServiceError::Stopped)));
        assert!(!RUNNING_JOB.with(Cell::get));

        let healthy = Queue::new(5_i32, 4);
        assert_eq!(healthy.execute(|n| *n).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_shutdown_drops_state() {
        let marker = Arc::new(());
        let queue = Queue::new(Arc::clone(&marker), 32);
        queue.execute(|_| ()).await.unwrap();

        drop(queue);
        for _ in 0..50 {
            if Arc::strong_count(&marker) == 1 {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("worker task kept its state after the queue was dropped");
    }
}
