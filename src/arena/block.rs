use core::ptr::NonNull;

use crate::allocator::constants::align_up;

/// Where a request lands inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fit {
    /// Offset of the aligned allocation from the block start.
    pub offset: usize,
    /// Bytes charged to the watermark: alignment padding plus the request.
    pub padded_size: usize,
}

/// One contiguous region owned by an arena.
#[derive(Debug)]
pub(crate) struct MemoryBlock {
    pub memory: NonNull<u8>,
    /// Logical capacity handed out by this block.
    pub capacity: usize,
    /// Length of the underlying mapping, passed back on release.
    pub reserved: usize,
    pub used: usize,
    /// Arena watermark at the moment this block became current.
    pub base: usize,
}

impl MemoryBlock {
    pub fn new(memory: NonNull<u8>, capacity: usize, reserved: usize) -> Self {
        debug_assert!(capacity <= reserved);
        Self {
            memory,
            capacity,
            reserved,
            used: 0,
            base: 0,
        }
    }

    /// Computes the placement of `size` bytes at `alignment` after the
    /// current cursor, or `None` if it does not fit.
    pub fn fit(&self, size: usize, alignment: usize) -> Option<Fit> {
        let start = self.memory.as_ptr() as usize;
        let cursor = start.checked_add(self.used)?;
        let aligned = align_up(cursor, alignment)?;
        let offset = aligned - start;
        let end = offset.checked_add(size)?;
        if end > self.capacity {
            return None;
        }
        Some(Fit {
            offset,
            padded_size: end - self.used,
        })
    }

    /// Commits a placement previously returned by [`fit`](Self::fit).
    pub fn commit(&mut self, fit: Fit) -> NonNull<u8> {
        self.used += fit.padded_size;
        debug_assert!(self.used <= self.capacity);
        unsafe { NonNull::new_unchecked(self.memory.as_ptr().add(fit.offset)) }
    }

    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.memory.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr < start + self.capacity
    }
}
