use serde::{Deserialize, Serialize};

/// Cumulative queue counters plus the current backlog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub submitted: u64,
    /// Dropped without running (capacity eviction or `clear`).
    pub evicted: u64,
    pub executed: u64,
    pub pending: usize,
}
