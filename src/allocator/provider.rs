//! Block memory sources.

use core::alloc::Layout;
use core::ptr::NonNull;
use std::alloc::{alloc_zeroed, dealloc};

use super::constants::{align_up, PAGE_SIZE};
use super::syscall;

/// A source of raw, page-granular memory regions for arena blocks.
///
/// This lets `Arena` be backed by direct virtual-memory mappings (the default)
/// or by the global heap, and lets tests observe or fail block allocation.
pub trait MemoryProvider {
    /// Allocates a region of at least `size` bytes.
    ///
    /// The returned pointer must be aligned to [`granularity`](Self::granularity)
    /// and the region must be zero-filled. Returns `None` when the platform is
    /// out of memory.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Releases a region.
    ///
    /// # Safety
    /// `ptr` must have been returned by `allocate` on this provider with the
    /// same `size`, and must not be used afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>, size: usize);

    /// The unit regions are rounded up to.
    fn granularity(&self) -> usize {
        PAGE_SIZE
    }
}

impl<P: MemoryProvider + ?Sized> MemoryProvider for &P {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        (**self).allocate(size)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        (**self).release(ptr, size);
    }

    fn granularity(&self) -> usize {
        (**self).granularity()
    }
}

/// Anonymous virtual-memory mappings (`mmap` / `VirtualAlloc`).
#[derive(Default, Clone, Copy, Debug)]
pub struct SystemProvider;

impl MemoryProvider for SystemProvider {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        unsafe { syscall::allocate_region(size).and_then(NonNull::new) }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        syscall::free_region(ptr.as_ptr(), size);
    }
}

/// Page-aligned regions from the global allocator.
#[derive(Default, Clone, Copy, Debug)]
pub struct HeapProvider;

impl HeapProvider {
    fn layout(size: usize) -> Option<Layout> {
        let size = align_up(size, PAGE_SIZE)?;
        Layout::from_size_align(size, PAGE_SIZE).ok()
    }
}

impl MemoryProvider for HeapProvider {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let layout = Self::layout(size)?;
        unsafe { NonNull::new(alloc_zeroed(layout)) }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        if let Some(layout) = Self::layout(size) {
            dealloc(ptr.as_ptr(), layout);
        }
    }
}
