//! Raw virtual-memory mapping primitives.
//!
//! Both platforms expose the same pair of functions: `allocate_region` hands
//! back a page-aligned, zero-filled, read/write mapping and `free_region`
//! returns it. Sizes are rounded up to [`PAGE_SIZE`](super::constants::PAGE_SIZE)
//! on both sides so callers may pass the unrounded length they asked for.

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

#[cfg(unix)]
pub use unix::*;

#[cfg(windows)]
pub use windows::*;
