#![cfg(unix)]

use libc::{c_void, mmap, munmap, MAP_ANON, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE};
use std::ptr;

use crate::allocator::constants::{align_up, PAGE_SIZE};

/// Maps a private anonymous region of at least `size` bytes.
/// Returns a pointer to the start of the region, or None if the mapping failed.
///
/// # Safety
/// The region must be released with [`free_region`] using the same `size`.
pub unsafe fn allocate_region(size: usize) -> Option<*mut u8> {
    if size == 0 {
        return None;
    }
    let size = align_up(size, PAGE_SIZE)?;
    let ptr = mmap(
        ptr::null_mut(),
        size,
        PROT_READ | PROT_WRITE,
        MAP_PRIVATE | MAP_ANON,
        -1,
        0,
    );

    if ptr == MAP_FAILED {
        None
    } else {
        Some(ptr as *mut u8)
    }
}

/// Unmaps a region obtained from [`allocate_region`].
///
/// # Safety
/// `ptr` and `size` must describe a live mapping returned by [`allocate_region`].
pub unsafe fn free_region(ptr: *mut u8, size: usize) {
    if ptr.is_null() || size == 0 {
        return;
    }
    if let Some(size) = align_up(size, PAGE_SIZE) {
        munmap(ptr as *mut c_void, size);
    }
}
