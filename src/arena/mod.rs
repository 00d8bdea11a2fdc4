//! Block-chained bump allocator with watermark rollback.
//!
//! An [`Arena`] hands out raw memory by advancing a cursor inside its current
//! block. When the block is exhausted a growable arena moves on to another
//! block; memory is never moved, so earlier pointers stay valid. Allocations
//! are released in bulk: [`Arena::pop`] rewinds to a previously observed
//! [`total_used_size`](Arena::total_used_size), [`Arena::clear`] rewinds to
//! zero and [`Arena::destroy`] gives every block back to the platform.
//!
//! Pointers returned by `push*` remain valid until the arena is popped past
//! them, cleared, destroyed or dropped. The arena never reads what it hands
//! out and never runs destructors.
//!
//! # Example
//!
//! ```rust
//! use blockarena::Arena;
//!
//! let mut arena = Arena::new(4096, true).unwrap();
//! let mark = arena.total_used_size();
//!
//! let ptr = arena.push(10, 8).unwrap();
//! assert_eq!(ptr.as_ptr() as usize % 8, 0);
//!
//! arena.pop(mark);
//! assert_eq!(arena.total_used_size(), mark);
//! ```

pub(crate) mod block;
pub mod config;
pub(crate) mod contract;
pub mod error;
pub mod scope;
pub mod stats;

use core::mem::{align_of, size_of};
use core::ptr::{self, NonNull};

use tracing::{debug, trace};
use zerocopy::FromZeroes;

use crate::allocator::provider::{MemoryProvider, SystemProvider};
use block::MemoryBlock;
use contract::contract;

pub use config::{ArenaConfig, ConfigError};
pub use error::ArenaError;
pub use scope::ArenaScope;
pub use stats::ArenaStats;

/// A growable bump allocator over a chain of memory blocks.
///
/// Blocks are kept oldest first. `current` indexes the block receiving
/// allocations; blocks after it are spares left behind by `pop` or `clear`
/// and are reused before any new block is requested from the provider.
pub struct Arena<P: MemoryProvider = SystemProvider> {
    blocks: Vec<MemoryBlock>,
    current: usize,
    total_used_size: usize,
    initial_block_capacity: usize,
    can_grow: bool,
    provider: P,
}

// Blocks are exclusively owned; the arena may move between threads but is
// never shared.
unsafe impl<P: MemoryProvider + Send> Send for Arena<P> {}

impl Arena<SystemProvider> {
    /// Creates an arena backed by anonymous memory mappings and allocates its
    /// first block.
    ///
    /// # Panics
    /// If `initial_block_capacity` is zero.
    ///
    /// # Errors
    /// Returns [`ArenaError::OutOfMemory`] if the first block cannot be mapped.
    #[track_caller]
    pub fn new(initial_block_capacity: usize, can_grow: bool) -> Result<Self, ArenaError> {
        Self::with_provider(initial_block_capacity, can_grow, SystemProvider)
    }

    /// Creates an arena from a validated configuration.
    ///
    /// # Errors
    /// Returns [`ArenaError::OutOfMemory`] if the first block cannot be mapped.
    #[track_caller]
    pub fn from_config(config: &ArenaConfig) -> Result<Self, ArenaError> {
        Self::new(config.initial_block_capacity, config.can_grow)
    }
}

impl<P: MemoryProvider> Arena<P> {
    /// Creates an arena whose blocks come from `provider`.
    ///
    /// # Panics
    /// If `initial_block_capacity` is zero.
    ///
    /// # Errors
    /// Returns [`ArenaError::OutOfMemory`] if the first block cannot be allocated.
    #[track_caller]
    pub fn with_provider(
        initial_block_capacity: usize,
        can_grow: bool,
        provider: P,
    ) -> Result<Self, ArenaError> {
        contract!(initial_block_capacity != 0, "initial block capacity cannot be zero");

        let mut arena = Self {
            blocks: Vec::new(),
            current: 0,
            total_used_size: 0,
            initial_block_capacity,
            can_grow,
            provider,
        };
        let block = arena.allocate_block(initial_block_capacity)?;
        arena.blocks.push(block);
        Ok(arena)
    }

    /// Allocates `size` bytes aligned to `alignment` and returns a pointer to
    /// the uninitialised region.
    ///
    /// # Panics
    /// If `size` is zero, `alignment` is not a non-zero power of two, the arena
    /// has been destroyed, or the arena is not growable and the request does
    /// not fit in its remaining capacity.
    ///
    /// # Errors
    /// Returns [`ArenaError::OutOfMemory`] if a new block was needed and the
    /// provider could not supply one, or [`ArenaError::CapacityOverflow`] if
    /// the block size for the request overflows.
    #[track_caller]
    pub fn push(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError> {
        contract!(size != 0, "cannot push 0 bytes");
        contract!(alignment != 0, "cannot push with 0 byte alignment");
        contract!(alignment.is_power_of_two(), "alignment {alignment} is not a power of two");
        contract!(!self.blocks.is_empty(), "cannot push into a destroyed arena");

        let fit = match self.blocks[self.current].fit(size, alignment) {
            Some(fit) => fit,
            None => {
                contract!(
                    self.can_grow,
                    "arena is not growable and has run out of memory \
                     ({size} bytes at alignment {alignment}, {} of {} bytes used)",
                    self.blocks[self.current].used,
                    self.blocks[self.current].capacity
                );
                self.advance_block(size, alignment)?;
                match self.blocks[self.current].fit(size, alignment) {
                    Some(fit) => fit,
                    None => contract::violation(
                        "fresh block fits request",
                        format_args!("new block cannot hold {size} bytes at alignment {alignment}"),
                    ),
                }
            }
        };

        let ptr = self.blocks[self.current].commit(fit);
        self.total_used_size += fit.padded_size;
        trace!(size, alignment, padded = fit.padded_size, total = self.total_used_size, "push");
        self.check_invariants();
        Ok(ptr)
    }

    /// Like [`push`](Self::push), then zero-fills the returned region.
    ///
    /// # Panics
    /// Under the same conditions as [`push`](Self::push).
    ///
    /// # Errors
    /// As [`push`](Self::push).
    #[track_caller]
    pub fn push_zero(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError> {
        let ptr = self.push(size, alignment)?;
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };
        Ok(ptr)
    }

    /// Allocates uninitialised storage for `count` values of `T`.
    ///
    /// # Panics
    /// If the resulting byte size is zero, or under the conditions of
    /// [`push`](Self::push).
    ///
    /// # Errors
    /// As [`push`](Self::push); overflow of `count * size_of::<T>()` is
    /// [`ArenaError::CapacityOverflow`].
    #[track_caller]
    pub fn push_array<T>(&mut self, count: usize) -> Result<NonNull<T>, ArenaError> {
        let size = Self::array_size::<T>(count)?;
        Ok(self.push(size, align_of::<T>())?.cast())
    }

    /// Allocates zero-filled storage for `count` values of `T`.
    ///
    /// The elements are only valid `T`s if the all-zero bit pattern is.
    ///
    /// # Panics
    /// As [`push_array`](Self::push_array).
    ///
    /// # Errors
    /// As [`push_array`](Self::push_array).
    #[track_caller]
    pub fn push_array_zero<T>(&mut self, count: usize) -> Result<NonNull<T>, ArenaError> {
        let size = Self::array_size::<T>(count)?;
        Ok(self.push_zero(size, align_of::<T>())?.cast())
    }

    /// Allocates a `T` and initialises it with `T::default()`.
    ///
    /// # Panics
    /// If `T` is zero-sized, or under the conditions of [`push`](Self::push).
    ///
    /// # Errors
    /// As [`push`](Self::push).
    #[track_caller]
    pub fn push_struct<T: Default>(&mut self) -> Result<NonNull<T>, ArenaError> {
        let ptr = self.push(size_of::<T>(), align_of::<T>())?.cast::<T>();
        unsafe { ptr.as_ptr().write(T::default()) };
        Ok(ptr)
    }

    /// Allocates a `T` over zeroed memory and initialises it with
    /// `T::default()`.
    ///
    /// # Panics
    /// As [`push_struct`](Self::push_struct).
    ///
    /// # Errors
    /// As [`push`](Self::push).
    #[track_caller]
    pub fn push_struct_zero<T: Default>(&mut self) -> Result<NonNull<T>, ArenaError> {
        let ptr = self.push_zero(size_of::<T>(), align_of::<T>())?.cast::<T>();
        unsafe { ptr.as_ptr().write(T::default()) };
        Ok(ptr)
    }

    /// Allocates a `T` whose all-zero bit pattern is a valid value, without
    /// running any constructor.
    ///
    /// # Panics
    /// As [`push_struct`](Self::push_struct).
    ///
    /// # Errors
    /// As [`push`](Self::push).
    #[track_caller]
    pub fn push_zeroed<T: FromZeroes>(&mut self) -> Result<NonNull<T>, ArenaError> {
        Ok(self.push_zero(size_of::<T>(), align_of::<T>())?.cast())
    }

    /// Copies `values` into the arena.
    ///
    /// # Panics
    /// If `values` is empty or `T` is zero-sized, or under the conditions of
    /// [`push`](Self::push).
    ///
    /// # Errors
    /// As [`push`](Self::push).
    #[track_caller]
    pub fn push_slice_copy<T: Copy>(&mut self, values: &[T]) -> Result<NonNull<[T]>, ArenaError> {
        let ptr = self.push_array::<T>(values.len())?;
        unsafe { ptr::copy_nonoverlapping(values.as_ptr(), ptr.as_ptr(), values.len()) };
        Ok(NonNull::slice_from_raw_parts(ptr, values.len()))
    }

    /// Copies a string into the arena.
    ///
    /// # Panics
    /// If `s` is empty, or under the conditions of [`push`](Self::push).
    ///
    /// # Errors
    /// As [`push`](Self::push).
    #[track_caller]
    pub fn push_str(&mut self, s: &str) -> Result<NonNull<str>, ArenaError> {
        let bytes = self.push_slice_copy(s.as_bytes())?;
        Ok(unsafe { NonNull::new_unchecked(bytes.as_ptr() as *mut str) })
    }

    /// Rolls the arena back to a watermark previously returned by
    /// [`total_used_size`](Self::total_used_size).
    ///
    /// Every pointer pushed after that watermark becomes invalid. Blocks are
    /// kept and reused by later pushes. Popping to the current watermark does
    /// nothing; popping to zero is [`clear`](Self::clear).
    ///
    /// # Panics
    /// If `new_total_size` is greater than the current watermark.
    #[track_caller]
    pub fn pop(&mut self, new_total_size: usize) {
        if new_total_size == self.total_used_size {
            return;
        }
        contract!(
            new_total_size < self.total_used_size,
            "cannot pop to {new_total_size}, beyond the current total used size {}",
            self.total_used_size
        );

        if new_total_size == 0 {
            self.clear();
            return;
        }

        // Block 0 always has base 0, so a target always exists.
        let target = self.blocks[..=self.current]
            .iter()
            .rposition(|block| block.base <= new_total_size)
            .unwrap_or(0);

        for block in &mut self.blocks[target + 1..=self.current] {
            block.used = 0;
        }
        let block = &mut self.blocks[target];
        let used = new_total_size - block.base;
        debug_assert!(used <= block.used, "pop target lies beyond the block cursor");
        block.used = used;

        trace!(from = self.total_used_size, to = new_total_size, block = target, "pop");
        self.current = target;
        self.total_used_size = new_total_size;
        self.check_invariants();
    }

    /// Rolls the arena back to empty. The oldest block receives the next
    /// allocation and all blocks stay mapped for reuse.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.used = 0;
            block.base = 0;
        }
        self.current = 0;
        self.total_used_size = 0;
    }

    /// Returns every block to the provider. The arena cannot allocate again;
    /// calling this more than once is harmless.
    pub fn destroy(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        let count = self.blocks.len();
        // Newest first, like unwinding the chain.
        while let Some(block) = self.blocks.pop() {
            unsafe { self.provider.release(block.memory, block.reserved) };
        }
        debug!(blocks = count, total = self.total_used_size, "arena destroyed");
        self.current = 0;
        self.total_used_size = 0;
    }

    /// The watermark: padded bytes pushed since the last `clear`.
    pub fn total_used_size(&self) -> usize {
        self.total_used_size
    }

    /// Minimum capacity of any block.
    pub fn initial_block_capacity(&self) -> usize {
        self.initial_block_capacity
    }

    /// Whether the arena may add blocks when the current one is exhausted.
    pub fn can_grow(&self) -> bool {
        self.can_grow
    }

    /// Number of blocks currently owned, spares included.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether `ptr` lies in the part of the oldest block the arena hands out.
    pub fn in_first_block(&self, ptr: *const u8) -> bool {
        self.blocks.first().is_some_and(|block| block.contains(ptr))
    }

    /// Snapshot of watermark and block usage.
    pub fn stats(&self) -> ArenaStats {
        let current = self.blocks.get(self.current);
        ArenaStats {
            total_used_size: self.total_used_size,
            block_count: self.blocks.len(),
            current_block: self.current,
            current_block_used: current.map_or(0, |block| block.used),
            current_block_capacity: current.map_or(0, |block| block.capacity),
            committed_bytes: self.blocks.iter().map(|block| block.capacity).sum(),
            reserved_bytes: self.blocks.iter().map(|block| block.reserved).sum(),
        }
    }

    /// Opens a scope that pops back to the current watermark when dropped.
    pub fn scope(&mut self) -> ArenaScope<'_, P> {
        ArenaScope::new(self)
    }

    /// Makes the block after `current` able to hold the request, reusing a
    /// spare when it is large enough, and makes it current.
    fn advance_block(&mut self, size: usize, alignment: usize) -> Result<(), ArenaError> {
        let next = self.current + 1;
        let reusable = self
            .blocks
            .get(next)
            .is_some_and(|spare| spare.fit(size, alignment).is_some());

        if reusable {
            debug!(block = next, "reusing spare arena block");
        } else {
            let worst_case = size
                .checked_add(alignment - 1)
                .ok_or(ArenaError::CapacityOverflow)?;
            let capacity = self.initial_block_capacity.max(worst_case);
            let block = self.allocate_block(capacity)?;
            self.blocks.insert(next, block);
        }

        self.current = next;
        let block = &mut self.blocks[next];
        block.used = 0;
        block.base = self.total_used_size;
        Ok(())
    }

    fn allocate_block(&self, capacity: usize) -> Result<MemoryBlock, ArenaError> {
        let granularity = self.provider.granularity();
        let reserved = capacity
            .checked_add(granularity - 1)
            .map(|v| v & !(granularity - 1))
            .ok_or(ArenaError::CapacityOverflow)?;
        let memory = self
            .provider
            .allocate(reserved)
            .ok_or(ArenaError::OutOfMemory { requested: capacity })?;
        debug!(capacity, reserved, blocks = self.blocks.len() + 1, "allocated arena block");
        Ok(MemoryBlock::new(memory, capacity, reserved))
    }

    fn array_size<T>(count: usize) -> Result<usize, ArenaError> {
        size_of::<T>()
            .checked_mul(count)
            .ok_or(ArenaError::CapacityOverflow)
    }

    #[inline]
    fn check_invariants(&self) {
        #[cfg(debug_assertions)]
        {
            for pair in self.blocks[..=self.current].windows(2) {
                debug_assert_eq!(
                    pair[1].base,
                    pair[0].base + pair[0].used,
                    "sealed block does not end where its successor begins"
                );
            }
            for block in &self.blocks {
                debug_assert!(block.used <= block.capacity, "block used exceeds capacity");
            }
            let current = &self.blocks[self.current];
            debug_assert_eq!(self.total_used_size, current.base + current.used);
        }
    }
}

impl<P: MemoryProvider> Drop for Arena<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<P: MemoryProvider> core::fmt::Debug for Arena<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("total_used_size", &self.total_used_size)
            .field("blocks", &self.blocks.len())
            .field("current", &self.current)
            .field("initial_block_capacity", &self.initial_block_capacity)
            .field("can_grow", &self.can_grow)
            .finish()
    }
}
