#![cfg(windows)]

use std::ptr;
use windows_sys::Win32::System::Memory::{
    VirtualAlloc, VirtualFree, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE,
};

use crate::allocator::constants::{align_up, PAGE_SIZE};

/// Reserves and commits a region of at least `size` bytes.
/// Returns a pointer to the start of the region, or None if the call failed.
///
/// # Safety
/// The region must be released with [`free_region`].
pub unsafe fn allocate_region(size: usize) -> Option<*mut u8> {
    if size == 0 {
        return None;
    }
    let size = align_up(size, PAGE_SIZE)?;
    let ptr = VirtualAlloc(ptr::null_mut(), size, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE);
    if ptr.is_null() {
        None
    } else {
        Some(ptr as *mut u8)
    }
}

/// Releases a region obtained from [`allocate_region`].
///
/// # Safety
/// `ptr` must be the start of a live region returned by [`allocate_region`].
pub unsafe fn free_region(ptr: *mut u8, _size: usize) {
    if ptr.is_null() {
        return;
    }
    // MEM_RELEASE frees the entire reservation. Size must be 0.
    VirtualFree(ptr as *mut core::ffi::c_void, 0, MEM_RELEASE);
}
