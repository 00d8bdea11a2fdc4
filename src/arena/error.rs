//! Recoverable arena errors.

use core::fmt;

/// Recoverable arena failures.
///
/// Contract violations (zero sizes, bad alignment, popping past the
/// watermark, exhausting a fixed-size arena) are not represented here; they
/// are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// The memory provider could not supply a block of `requested` bytes.
    OutOfMemory {
        /// Capacity of the block that was being created.
        requested: usize,
    },
    /// A size computation overflowed `usize`.
    CapacityOverflow,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "platform memory exhausted allocating a {requested} byte arena block")
            }
            Self::CapacityOverflow => f.write_str("arena allocation size overflowed"),
        }
    }
}

impl std::error::Error for ArenaError {}
