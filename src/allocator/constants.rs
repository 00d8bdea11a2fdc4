//! Sizes used across the allocator.

/// The system page size (4KB). Block mappings are rounded up to this.
pub const PAGE_SIZE: usize = 4096;

/// Initial block capacity used when none is configured (one page).
pub const DEFAULT_BLOCK_CAPACITY: usize = PAGE_SIZE;

/// `n` kibibytes in bytes.
pub const fn kib(n: usize) -> usize {
    n * 1024
}

/// `n` mebibytes in bytes.
pub const fn mib(n: usize) -> usize {
    kib(n) * 1024
}

/// Rounds `value` up to a multiple of `align`, which must be a power of two.
///
/// Returns `None` if the rounded value does not fit in a `usize`.
pub const fn align_up(value: usize, align: usize) -> Option<usize> {
    match value.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}
