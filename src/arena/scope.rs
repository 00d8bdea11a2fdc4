//! Watermark guards.

use core::ops::{Deref, DerefMut};

use super::Arena;
use crate::allocator::provider::MemoryProvider;

/// Temporary allocations against an [`Arena`].
///
/// Records the watermark on creation and pops back to it on drop, so
/// everything pushed through the scope is released together. Derefs to the
/// arena.
///
/// ```rust
/// use blockarena::Arena;
///
/// let mut arena = Arena::new(4096, true).unwrap();
/// arena.push(16, 8).unwrap();
/// {
///     let mut scratch = arena.scope();
///     scratch.push(1024, 16).unwrap();
/// }
/// assert_eq!(arena.total_used_size(), 16);
/// ```
pub struct ArenaScope<'a, P: MemoryProvider> {
    arena: &'a mut Arena<P>,
    watermark: usize,
}

impl<'a, P: MemoryProvider> ArenaScope<'a, P> {
    pub(crate) fn new(arena: &'a mut Arena<P>) -> Self {
        let watermark = arena.total_used_size();
        Self { arena, watermark }
    }

    /// The watermark this scope restores.
    pub fn watermark(&self) -> usize {
        self.watermark
    }
}

impl<P: MemoryProvider> Deref for ArenaScope<'_, P> {
    type Target = Arena<P>;

    fn deref(&self) -> &Arena<P> {
        &*self.arena
    }
}

impl<P: MemoryProvider> DerefMut for ArenaScope<'_, P> {
    fn deref_mut(&mut self) -> &mut Arena<P> {
        &mut *self.arena
    }
}

impl<P: MemoryProvider> Drop for ArenaScope<'_, P> {
    fn drop(&mut self) {
        // Already rolled back further (or destroyed) inside the scope.
        if self.arena.total_used_size() > self.watermark {
            self.arena.pop(self.watermark);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::allocator::provider::HeapProvider;
    use crate::Arena;

    #[test]
    fn test_nested_scopes() {
        let mut arena = Arena::with_provider(64, true, HeapProvider).unwrap();
        arena.push(8, 8).unwrap();
        {
            let mut outer = arena.scope();
            outer.push(8, 8).unwrap();
            {
                let mut inner = outer.scope();
                assert_eq!(inner.watermark(), 16);
                inner.push(100, 8).unwrap();
            }
            assert_eq!(outer.total_used_size(), 16);
        }
        assert_eq!(arena.total_used_size(), 8);
    }

    #[test]
    fn test_scope_tolerates_inner_clear() {
        let mut arena = Arena::with_provider(64, true, HeapProvider).unwrap();
        arena.push(8, 8).unwrap();
        {
            let mut scope = arena.scope();
            scope.clear();
        }
        assert_eq!(arena.total_used_size(), 0);
    }
}
