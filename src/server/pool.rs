//! Fixed-size pool of long-lived workers fed through a channel.

use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

type Handler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

/// A fixed set of workers draining a shared queue of tasks.
///
/// Each task is handled start to finish by exactly one worker. When every worker is
/// busy, dispatched tasks wait in the queue.
pub struct WorkerPool<T> {
    sender: mpsc::UnboundedSender<T>,
    workers: Vec<JoinHandle<()>>,
}

impl<T> std::fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.workers.len())
            .finish()
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `size` workers that each run `handler` on the tasks they receive.
    ///
    /// # Panics
    /// If `size` is zero.
    pub fn new<F, Fut>(size: usize, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        assert!(size > 0, "WorkerPool needs at least one worker");

        let handler: Handler<T> = Arc::new(move |task| handler(task).boxed());
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| {
                let receiver = Arc::clone(&receiver);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move { worker_loop(id, &receiver, &handler).await })
            })
            .collect();

        tracing::debug!("Started worker pool with {} workers", size);
        Self { sender, workers }
    }

    /// Queue a task for the next idle worker.
    ///
    /// Returns `false` if every worker has exited and the task was dropped.
    pub fn dispatch(&self, task: T) -> bool {
        self.sender.send(task).is_ok()
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting tasks and wait for the workers to finish what is queued.
    pub async fn shutdown(self) {
        drop(self.sender);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn worker_loop<T>(id: usize, receiver: &Mutex<mpsc::UnboundedReceiver<T>>, handler: &Handler<T>) {
    loop {
        // The lock is only held while waiting for the next task, never while running it.
        let next = receiver.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        if AssertUnwindSafe(handler(task)).catch_unwind().await.is_err() {
            tracing::error!("Worker {} task panicked", id);
        }
    }
    tracing::trace!("Worker {} exiting", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Barrier, oneshot};

    #[tokio::test]
    async fn every_task_runs_once() {
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let pool = WorkerPool::new(4, move |n: usize| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(n, Ordering::SeqCst);
            }
        });

        for _ in 0..100 {
            check!(pool.dispatch(1));
        }
        pool.shutdown().await;
        check!(done.load(Ordering::SeqCst) == 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn workers_run_concurrently() {
        // Three tasks that can only finish once all three are running at the same time.
        let barrier = Arc::new(Barrier::new(3));
        let gate = Arc::clone(&barrier);
        let pool = WorkerPool::new(3, move |reply: oneshot::Sender<()>| {
            let gate = Arc::clone(&gate);
            async move {
                gate.wait().await;
                let _ = reply.send(());
            }
        });

        let mut replies = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = oneshot::channel();
            pool.dispatch(tx);
            replies.push(rx);
        }
        for reply in replies {
            check!(reply.await.is_ok());
        }
        check!(pool.size() == 3);
    }

    #[tokio::test]
    async fn panicking_task_does_not_kill_worker() {
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let pool = WorkerPool::new(1, move |fail: bool| {
            let counter = Arc::clone(&counter);
            async move {
                assert!(!fail, "task asked to fail");
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        pool.dispatch(true);
        pool.dispatch(false);
        pool.shutdown().await;
        check!(done.load(Ordering::SeqCst) == 1);
    }
}
