// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serialized, rate-limited execution of outbound device operations.
//!
//! Every outbound request (state polls, power polls, commands) passes
//! through one [`CommandQueue`] per device. A single worker task executes
//! submissions one at a time, spacing task starts so the device is never
//! driven faster than it can answer, and bounding each task with a hard
//! timeout so a hung request cannot stall the queue.
//!
//! The queue is the device's only mutual-exclusion mechanism: because one
//! task runs at a time, poll loops and commands never overlap in wall-clock
//! device I/O even when their timers fire together.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::error::{Error, ProtocolError, Result};

/// A boxed device operation, ready for the worker to drive.
pub type CommandFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>;

type TaskFn = Box<dyn FnOnce() -> CommandFuture + Send>;

struct QueuedTask {
    run: TaskFn,
    reply: oneshot::Sender<Result<serde_json::Value>>,
}

/// Single-worker command queue with rate limiting and per-task timeouts.
///
/// # Examples
///
/// ```no_run
/// use merosync::queue::CommandQueue;
///
/// # async fn example() -> merosync::Result<()> {
/// let queue = CommandQueue::new();
/// let payload = queue
///     .submit(|| async { Ok(serde_json::json!({"ack": 1})) })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<QueuedTask>,
    outstanding: watch::Sender<usize>,
}

impl CommandQueue {
    /// Minimum spacing between task starts.
    pub const SPACING: Duration = Duration::from_millis(250);

    /// Hard execution timeout per task.
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a queue and spawns its worker task.
    ///
    /// Must be called from within a tokio runtime. The worker exits when
    /// the queue is dropped.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (outstanding, _) = watch::channel(0_usize);

        tokio::spawn(Self::worker(rx, outstanding.clone()));

        Self { tx, outstanding }
    }

    /// Submits an operation and waits for its outcome.
    ///
    /// The operation's error is propagated to the caller unchanged; a task
    /// exceeding [`TIMEOUT`](Self::TIMEOUT) fails with
    /// [`ProtocolError::Timeout`] and the queue proceeds to the next task.
    ///
    /// # Errors
    ///
    /// Returns the task's own error, a `Timeout`, or `ChannelClosed` if the
    /// queue worker is gone.
    pub async fn submit<F, Fut>(&self, op: F) -> Result<serde_json::Value>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let task = QueuedTask {
            run: Box::new(move || Box::pin(op()) as CommandFuture),
            reply: reply_tx,
        };

        self.outstanding.send_modify(|n| *n += 1);
        if self.tx.send(task).is_err() {
            self.outstanding.send_modify(|n| *n -= 1);
            return Err(Error::Protocol(ProtocolError::ChannelClosed(
                "command queue worker stopped".to_string(),
            )));
        }

        reply_rx.await.map_err(|_| {
            Error::Protocol(ProtocolError::ChannelClosed(
                "command queue dropped the reply".to_string(),
            ))
        })?
    }

    /// Returns `true` while any task is pending or running.
    ///
    /// This is the `updateInProgress` signal: the poll scheduler skips a
    /// tick while it is set, so polls do not pile up behind a slow command.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        *self.outstanding.borrow() > 0
    }

    /// Waits until no task is pending or running.
    pub async fn idle(&self) {
        let mut rx = self.outstanding.subscribe();
        // wait_for checks the current value first, so an already idle
        // queue returns immediately.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    async fn worker(mut rx: mpsc::UnboundedReceiver<QueuedTask>, outstanding: watch::Sender<usize>) {
        let mut next_start = Instant::now();

        while let Some(task) = rx.recv().await {
            tokio::time::sleep_until(next_start).await;
            next_start = Instant::now() + Self::SPACING;

            let result = match tokio::time::timeout(Self::TIMEOUT, (task.run)()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(timeout = ?Self::TIMEOUT, "queued operation timed out");
                    Err(Error::Protocol(ProtocolError::Timeout(
                        u64::try_from(Self::TIMEOUT.as_millis()).unwrap_or(u64::MAX),
                    )))
                }
            };

            // The submitter may have given up; its loss, not an error.
            let _ = task.reply.send(result);
            outstanding.send_modify(|n| *n -= 1);
        }
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("outstanding", &*self.outstanding.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn tasks_run_in_order_without_overlap() {
        let queue = CommandQueue::new();
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let log_a = log.clone();
        let first = queue.submit(move || async move {
            log_a.lock().push("a-start");
            tokio::time::sleep(Duration::from_millis(50)).await;
            log_a.lock().push("a-end");
            Ok(json!(1))
        });

        let log_b = log.clone();
        let second = queue.submit(move || async move {
            log_b.lock().push("b-start");
            Ok(json!(2))
        });

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap(), json!(1));
        assert_eq!(second.unwrap(), json!(2));
        assert_eq!(*log.lock(), vec!["a-start", "a-end", "b-start"]);
    }

    #[tokio::test(start_paused = true)]
    async fn task_starts_are_spaced() {
        let queue = CommandQueue::new();
        let starts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let mut submissions = Vec::new();
        for _ in 0..3 {
            let starts = starts.clone();
            submissions.push(queue.submit(move || async move {
                starts.lock().push(Instant::now());
                Ok(json!(null))
            }));
        }
        for submission in submissions {
            submission.await.unwrap();
        }

        let starts = starts.lock();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= CommandQueue::SPACING);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_task_and_queue_proceeds() {
        let queue = CommandQueue::new();

        let stuck = queue.submit(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(json!("never"))
        });
        let err = stuck.await.unwrap_err();
        assert!(err.is_timeout());

        let next = queue.submit(|| async { Ok(json!("alive")) }).await;
        assert_eq!(next.unwrap(), json!("alive"));
    }

    #[tokio::test(start_paused = true)]
    async fn task_error_propagates_unchanged() {
        let queue = CommandQueue::new();

        let err = queue
            .submit(|| async {
                Err(Error::Protocol(ProtocolError::Transport(
                    "broken pipe".to_string(),
                )))
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::Transport(message)) if message == "broken pipe"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn busy_flag_clears_when_idle() {
        let queue = Arc::new(CommandQueue::new());
        assert!(!queue.is_busy());

        let inner = queue.clone();
        let submission = tokio::spawn(async move {
            inner
                .submit(|| async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(json!(null))
                })
                .await
        });

        // Let the submission enqueue, then observe the busy window.
        tokio::task::yield_now().await;
        assert!(queue.is_busy());

        submission.await.unwrap().unwrap();
        queue.idle().await;
        assert!(!queue.is_busy());
    }
}
