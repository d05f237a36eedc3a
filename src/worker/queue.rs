use std::sync::atomic::{AtomicU64, Ordering};

/// The worker's only shared mutable state: how many execution records it
/// currently owns.
///
/// Connection handlers increment and execution records decrement from any
/// number of tasks. Reads are unsynchronized with in-flight handlers, so a
/// probe may observe a value that is already stale.
#[derive(Debug, Default)]
pub struct QueueState {
    len: AtomicU64,
}

impl QueueState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u64 {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the new length.
    pub fn increment(&self) -> u64 {
        self.len.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the new length. Saturates at zero.
    pub fn decrement(&self) -> u64 {
        let prev = self
            .len
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        prev.saturating_sub(1)
    }
}
