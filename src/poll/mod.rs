//! Interval polling fallback for clients without a WebSocket.
//!
//! A [`Poller`] runs the refetch loop every polling screen used to
//! hand-roll: one fetch immediately on spawn, then one per fixed interval,
//! each successful snapshot replacing the previous one through a
//! [`tokio::sync::watch`] channel. The watch channel is last-write-wins by
//! construction — a consumer that misses three ticks sees only the newest
//! snapshot, never a backlog.
//!
//! A failed fetch keeps the cadence: it is logged and the last delivered
//! snapshot stays in place until a later fetch succeeds. Dropping the
//! [`PollHandle`] aborts the loop, so teardown is tied to the observer's
//! lifetime the way clearing a timer was tied to screen unmount.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::WorkflowError;

/// Handle to a running poll loop.
///
/// The loop stops when the handle is dropped.
pub struct PollHandle<T> {
    rx: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> fmt::Debug for PollHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollHandle")
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

impl<T: Clone> PollHandle<T> {
    /// Returns the most recent snapshot, or `None` before the first
    /// successful fetch.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Waits until a new snapshot replaces the current one. Returns
    /// `false` if the loop has stopped.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Waits for the next snapshot and returns it.
    pub async fn next_snapshot(&mut self) -> Option<T> {
        if self.changed().await {
            self.latest()
        } else {
            None
        }
    }
}

impl<T> Drop for PollHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawner for poll loops.
#[derive(Debug)]
pub struct Poller;

impl Poller {
    /// Spawns a poll loop: fetch immediately, then once per `interval`.
    ///
    /// Each `Ok` snapshot is published to the handle; each `Err` is logged
    /// at warn and the previous snapshot is retained. There is no backoff
    /// and no retry inside a tick — the next fetch happens at the next
    /// tick regardless of the outcome.
    #[must_use]
    pub fn spawn<T, F, Fut>(interval: Duration, mut fetch: F) -> PollHandle<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, WorkflowError>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match fetch().await {
                    Ok(snapshot) => {
                        if tx.send(Some(snapshot)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "poll fetch failed; keeping last snapshot");
                    }
                }
            }
        });
        PollHandle { rx, task }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const TICK: Duration = Duration::from_millis(20);
    const WAIT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn initial_fetch_happens_on_spawn() {
        let mut handle = Poller::spawn(TICK, || async { Ok(42u32) });

        let first = tokio::time::timeout(WAIT, handle.next_snapshot()).await;
        let Ok(Some(value)) = first else {
            panic!("expected initial snapshot");
        };
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn interval_refetch_replaces_snapshot() {
        let counter = Arc::new(AtomicUsize::new(0));
        let fetch_counter = Arc::clone(&counter);
        let mut handle = Poller::spawn(TICK, move || {
            let fetch_counter = Arc::clone(&fetch_counter);
            async move { Ok(fetch_counter.fetch_add(1, Ordering::SeqCst) + 1) }
        });

        let Ok(Some(first)) = tokio::time::timeout(WAIT, handle.next_snapshot()).await else {
            panic!("expected first snapshot");
        };
        let Ok(Some(second)) = tokio::time::timeout(WAIT, handle.next_snapshot()).await else {
            panic!("expected second snapshot");
        };
        assert!(second > first);
    }

    #[tokio::test]
    async fn fetch_error_retains_last_snapshot() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch_calls = Arc::clone(&calls);
        let mut handle = Poller::spawn(TICK, move || {
            let fetch_calls = Arc::clone(&fetch_calls);
            async move {
                if fetch_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(7u32)
                } else {
                    Err(WorkflowError::Store("connection refused".to_string()))
                }
            }
        });

        let Ok(Some(value)) = tokio::time::timeout(WAIT, handle.next_snapshot()).await else {
            panic!("expected initial snapshot");
        };
        assert_eq!(value, 7);

        // Several failing ticks later the snapshot is still the last good one.
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(handle.latest(), Some(7));
        assert!(calls.load(Ordering::SeqCst) > 2, "loop kept its cadence");
    }

    #[tokio::test]
    async fn drop_stops_the_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch_calls = Arc::clone(&calls);
        let handle = Poller::spawn(TICK, move || {
            let fetch_calls = Arc::clone(&fetch_calls);
            async move {
                fetch_calls.fetch_add(1, Ordering::SeqCst);
                Ok(0u32)
            }
        });

        tokio::time::sleep(TICK * 3).await;
        drop(handle);
        tokio::time::sleep(TICK).await;
        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(TICK * 5).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }
}
