use std::sync::Arc;
use std::time::Duration;

use crate::worker::queue::QueueState;

/// Runs simulated tasks as detached execution records.
///
/// Each submitted task bumps the queue length immediately, then a spawned
/// tokio task sleeps for the task's duration and drops the length again.
/// Nothing ever joins or cancels these tasks.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    queue: Arc<QueueState>,
}

impl TaskExecutor {
    pub fn new(queue: Arc<QueueState>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<QueueState> {
        &self.queue
    }

    /// Accept a task of `duration_ms`. Returns the queue length right after
    /// the increment. Must be called from within a tokio runtime.
    pub fn submit(&self, duration_ms: u64) -> u64 {
        let queue_len = self.queue.increment();
        tracing::debug!(duration_ms, queue_len, "Execution record started");

        let queue = self.queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            let queue_len = queue.decrement();
            tracing::debug!(duration_ms, queue_len, "Execution record finished");
        });

        queue_len
    }
}
