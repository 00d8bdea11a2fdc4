//! Arena usage snapshots.

use serde::{Deserialize, Serialize};

/// Point-in-time usage of an [`Arena`](super::Arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArenaStats {
    /// The watermark.
    pub total_used_size: usize,
    /// Blocks owned, spares included.
    pub block_count: usize,
    /// Index of the block receiving allocations, oldest block is 0.
    pub current_block: usize,
    /// Bytes used in the current block, padding included.
    pub current_block_used: usize,
    /// Logical capacity of the current block.
    pub current_block_capacity: usize,
    /// Sum of logical block capacities.
    pub committed_bytes: usize,
    /// Sum of mapped region sizes, rounded to the provider granularity.
    pub reserved_bytes: usize,
}

impl ArenaStats {
    /// Fraction of the current block in use, between 0 and 1.
    #[allow(clippy::cast_precision_loss)]
    pub fn current_block_fill(&self) -> f64 {
        if self.current_block_capacity == 0 {
            return 0.0;
        }
        self.current_block_used as f64 / self.current_block_capacity as f64
    }
}
