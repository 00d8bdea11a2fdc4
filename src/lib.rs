//! # `blockarena` - Block-Chained Arena Allocator
//!
//! A growable bump allocator for programs that allocate in phases: state that
//! lives for the whole process goes in a *permanent* arena, scratch data for
//! one iteration of a loop goes in a *transient* arena that is cleared at the
//! end of the iteration.
//!
//! ## Design
//!
//! - **Bump allocation**: a push advances a cursor in the current block. No
//!   per-allocation header, no free list.
//! - **Block chaining**: when a block is exhausted the arena moves to another
//!   one instead of reallocating, so returned pointers never move.
//! - **Watermarks**: [`Arena::total_used_size`] is a rollback point.
//!   [`Arena::pop`] rewinds to it, [`Arena::clear`] rewinds to zero; blocks
//!   are kept and reused.
//! - **Platform memory**: blocks come straight from anonymous virtual-memory
//!   mappings through a [`MemoryProvider`], not from the general heap.
//!
//! ## Failure model
//!
//! Misuse (zero sizes, non power-of-two alignment, popping past the
//! watermark, overflowing a fixed-size arena, pushing after `destroy`) is a
//! bug and panics after emitting a `tracing` error event with the condition
//! and call site. The release profile aborts on panic. Running out of
//! platform memory is reported as [`ArenaError::OutOfMemory`].
//!
//! ## Example
//!
//! ```rust
//! use blockarena::{Arena, ArenaConfig};
//!
//! #[derive(Default)]
//! struct Frame {
//!     ticks: u64,
//! }
//!
//! let mut permanent = Arena::from_config(&ArenaConfig::default()).unwrap();
//! let frame = permanent.push_struct::<Frame>().unwrap();
//!
//! let mut transient = Arena::new(4096, true).unwrap();
//! for _ in 0..3 {
//!     let scratch = transient.push_array_zero::<f32>(256).unwrap();
//!     unsafe {
//!         *scratch.as_ptr() = 1.0;
//!         (*frame.as_ptr()).ticks += 1;
//!     }
//!     transient.clear();
//! }
//!
//! assert_eq!(unsafe { frame.as_ref().ticks }, 3);
//! assert_eq!(transient.total_used_size(), 0);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod allocator;
pub mod arena;
pub mod fs;

pub use allocator::{HeapProvider, MemoryProvider, SystemProvider};
pub use arena::{Arena, ArenaConfig, ArenaError, ArenaScope, ArenaStats, ConfigError};
pub use fs::FileError;

// Compile-time assertions for layout claims.
const _: () = {
    use core::mem;

    // Providers are ZSTs, so the default arena carries no provider state.
    assert!(mem::size_of::<SystemProvider>() == 0);
    assert!(mem::size_of::<HeapProvider>() == 0);

    assert!(allocator::constants::PAGE_SIZE.is_power_of_two());
};
