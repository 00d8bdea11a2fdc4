use blockarena::{Arena, ArenaConfig, ArenaError, HeapProvider, MemoryProvider};
use std::cell::Cell;
use std::ptr::NonNull;

/// Heap-backed provider that counts calls and can be told to fail.
#[derive(Default)]
struct CountingProvider {
    allocations: Cell<usize>,
    releases: Cell<usize>,
    limit: Option<usize>,
}

impl CountingProvider {
    fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

impl MemoryProvider for CountingProvider {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if self.limit.is_some_and(|limit| self.allocations.get() >= limit) {
            return None;
        }
        self.allocations.set(self.allocations.get() + 1);
        HeapProvider.allocate(size)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        self.releases.set(self.releases.get() + 1);
        HeapProvider.release(ptr, size);
    }
}

fn offset(base: NonNull<u8>, ptr: NonNull<u8>) -> usize {
    ptr.as_ptr() as usize - base.as_ptr() as usize
}

#[test]
fn test_sequential_pushes_pad_to_alignment() {
    let mut arena = Arena::new(64, true).unwrap();
    let p0 = arena.push(10, 8).unwrap();
    let p1 = arena.push(10, 8).unwrap();

    assert_eq!(offset(p0, p1), 16);
    assert_eq!(arena.total_used_size(), 26);
    assert_eq!(arena.block_count(), 1);
}

#[test]
fn test_oversized_push_grows_new_block() {
    let mut arena = Arena::new(16, true).unwrap();
    let ptr = arena.push(20, 8).unwrap();

    assert_eq!(ptr.as_ptr() as usize % 8, 0);
    assert_eq!(arena.block_count(), 2);
    let stats = arena.stats();
    assert_eq!(stats.current_block, 1);
    assert_eq!(stats.current_block_capacity, 27);
    assert_eq!(stats.current_block_used, 20);
    assert_eq!(arena.total_used_size(), 20);
}

#[test]
fn test_pop_to_current_watermark_is_noop() {
    let mut arena = Arena::new(64, true).unwrap();
    for _ in 0..5 {
        arena.push(8, 8).unwrap();
    }
    assert_eq!(arena.total_used_size(), 40);

    let before = arena.stats();
    arena.pop(40);
    assert_eq!(arena.stats(), before);

    arena.push(10, 8).unwrap();
    assert_eq!(arena.total_used_size(), 50);
}

#[test]
fn test_pop_reuses_offset_in_first_block() {
    let mut arena = Arena::new(64, true).unwrap();
    let first = arena.push(20, 1).unwrap();
    let second = arena.push(20, 1).unwrap();
    assert_eq!(arena.total_used_size(), 40);

    arena.pop(20);
    assert_eq!(arena.total_used_size(), 20);

    let again = arena.push(20, 1).unwrap();
    assert_eq!(again, second);
    assert_eq!(offset(first, again), 20);
}

#[test]
fn test_pop_across_blocks() {
    let provider = CountingProvider::default();
    let mut arena = Arena::with_provider(64, true, &provider).unwrap();
    arena.push(48, 8).unwrap();
    let mark = arena.total_used_size();
    let a = arena.push(32, 8).unwrap();
    let b = arena.push(40, 8).unwrap();
    let c = arena.push(8, 8).unwrap();
    assert_eq!(provider.allocations.get(), 3);

    arena.pop(mark);
    assert_eq!(arena.total_used_size(), 48);
    // The watermark sits where the second block began.
    assert_eq!(arena.stats().current_block, 1);
    assert_eq!(arena.stats().current_block_used, 0);

    assert_eq!(arena.push(32, 8).unwrap(), a);
    assert_eq!(arena.push(40, 8).unwrap(), b);
    assert_eq!(arena.push(8, 8).unwrap(), c);
    assert_eq!(provider.allocations.get(), 3);
}

#[test]
fn test_pop_to_zero_clears() {
    let mut arena = Arena::new(32, true).unwrap();
    arena.push(30, 1).unwrap();
    arena.push(30, 1).unwrap();

    arena.pop(0);
    assert_eq!(arena.total_used_size(), 0);
    let ptr = arena.push(1, 1).unwrap();
    assert!(arena.in_first_block(ptr.as_ptr()));
}

#[test]
fn test_clear_twice_and_push_lands_in_oldest_block() {
    let mut arena = Arena::new(64, true).unwrap();
    for _ in 0..10 {
        arena.push(50, 16).unwrap();
    }
    assert!(arena.block_count() > 1);

    arena.clear();
    assert_eq!(arena.total_used_size(), 0);
    arena.clear();
    assert_eq!(arena.total_used_size(), 0);

    let ptr = arena.push(8, 8).unwrap();
    assert!(arena.in_first_block(ptr.as_ptr()));
    assert_eq!(arena.stats().current_block, 0);
}

#[test]
fn test_clear_keeps_blocks_for_reuse() {
    let provider = CountingProvider::default();
    let mut arena = Arena::with_provider(128, true, &provider).unwrap();
    for _ in 0..3 {
        for _ in 0..20 {
            arena.push(60, 4).unwrap();
        }
        arena.clear();
    }
    assert_eq!(provider.allocations.get(), arena.block_count());
    assert_eq!(provider.releases.get(), 0);
}

#[test]
fn test_destroy_releases_every_block_once() {
    let provider = CountingProvider::default();
    let mut arena = Arena::with_provider(32, true, &provider).unwrap();
    for _ in 0..5 {
        arena.push(30, 1).unwrap();
    }
    let blocks = arena.block_count();

    arena.destroy();
    assert!(arena.is_destroyed());
    assert_eq!(provider.releases.get(), blocks);

    arena.destroy();
    drop(arena);
    assert_eq!(provider.releases.get(), blocks);
}

#[test]
fn test_drop_releases_blocks() {
    let provider = CountingProvider::default();
    {
        let mut arena = Arena::with_provider(32, true, &provider).unwrap();
        arena.push(100, 1).unwrap();
    }
    assert_eq!(provider.allocations.get(), 2);
    assert_eq!(provider.releases.get(), 2);
}

#[test]
fn test_platform_exhaustion_is_an_error() {
    let provider = CountingProvider::with_limit(1);
    let mut arena = Arena::with_provider(64, true, &provider).unwrap();
    arena.push(16, 8).unwrap();

    let err = arena.push(100, 8).unwrap_err();
    assert_eq!(err, ArenaError::OutOfMemory { requested: 107 });
    assert_eq!(arena.total_used_size(), 16);

    // Still usable within the existing block.
    arena.push(16, 8).unwrap();
    assert_eq!(arena.total_used_size(), 32);
}

#[test]
fn test_construction_failure_is_an_error() {
    let provider = CountingProvider::with_limit(0);
    let err = Arena::with_provider(64, true, &provider).unwrap_err();
    assert_eq!(err, ArenaError::OutOfMemory { requested: 64 });
}

#[test]
fn test_size_overflow_is_an_error() {
    let mut arena = Arena::new(64, true).unwrap();
    assert_eq!(
        arena.push_array::<u64>(usize::MAX).unwrap_err(),
        ArenaError::CapacityOverflow
    );
    assert_eq!(arena.push(usize::MAX, 8).unwrap_err(), ArenaError::CapacityOverflow);
    assert_eq!(arena.total_used_size(), 0);
}

#[test]
fn test_push_zero_clears_reused_memory() {
    let mut arena = Arena::new(64, true).unwrap();
    let dirty = arena.push(32, 8).unwrap();
    unsafe { dirty.as_ptr().write_bytes(0xFF, 32) };
    arena.clear();

    let raw = arena.push(32, 8).unwrap();
    assert_eq!(raw, dirty);
    assert_eq!(unsafe { *raw.as_ptr() }, 0xFF);
    arena.clear();

    let zeroed = arena.push_zero(32, 8).unwrap();
    let bytes = unsafe { std::slice::from_raw_parts(zeroed.as_ptr(), 32) };
    assert!(bytes.iter().all(|&b| b == 0));
}

#[derive(Debug, PartialEq)]
struct Player {
    health: u32,
    position: [f32; 2],
}

impl Default for Player {
    fn default() -> Self {
        Self {
            health: 100,
            position: [0.0, 0.0],
        }
    }
}

#[test]
fn test_typed_helpers() {
    let mut arena = Arena::new(4096, true).unwrap();

    let player = arena.push_struct::<Player>().unwrap();
    assert_eq!(player.as_ptr() as usize % std::mem::align_of::<Player>(), 0);
    assert_eq!(unsafe { player.as_ref() }, &Player::default());

    let zeroed_player = arena.push_struct_zero::<Player>().unwrap();
    assert_eq!(unsafe { zeroed_player.as_ref() }.health, 100);

    let indices = arena.push_array_zero::<u32>(64).unwrap();
    let indices = unsafe { std::slice::from_raw_parts_mut(indices.as_ptr(), 64) };
    assert!(indices.iter().all(|&i| i == 0));
    indices[63] = 7;

    let floats = arena.push_array::<f64>(3).unwrap();
    assert_eq!(floats.as_ptr() as usize % 8, 0);

    let grid = arena.push_zeroed::<[u32; 16]>().unwrap();
    assert_eq!(unsafe { *grid.as_ptr() }, [0; 16]);
}

#[test]
fn test_copy_helpers() {
    let mut arena = Arena::new(256, true).unwrap();
    let values = arena.push_slice_copy(&[1u16, 2, 3]).unwrap();
    assert_eq!(unsafe { values.as_ref() }, &[1, 2, 3]);

    let name = arena.push_str("sprite_atlas.png").unwrap();
    assert_eq!(unsafe { name.as_ref() }, "sprite_atlas.png");
}

#[test]
fn test_from_config() {
    let arena = Arena::from_config(&ArenaConfig::fixed(1024)).unwrap();
    assert!(!arena.can_grow());
    assert_eq!(arena.initial_block_capacity(), 1024);
}

#[test]
fn test_stats_serialize() {
    let mut arena = Arena::new(64, true).unwrap();
    arena.push(10, 1).unwrap();
    let json = serde_json::to_value(arena.stats()).unwrap();
    assert_eq!(json["total_used_size"], 10);
    assert_eq!(json["block_count"], 1);
    assert_eq!(json["reserved_bytes"], 4096);
}

#[test]
fn test_one_arena_per_thread() {
    let totals: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = (1..=4)
            .map(|n| {
                s.spawn(move || {
                    let mut arena = Arena::new(128, true).unwrap();
                    for _ in 0..100 * n {
                        let ptr = arena.push(24, 8).unwrap();
                        unsafe { ptr.as_ptr().write_bytes(n as u8, 24) };
                    }
                    arena.total_used_size()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(totals, vec![2400, 4800, 7200, 9600]);
}

#[test]
fn test_arena_moves_between_threads() {
    let mut arena = Arena::new(64, true).unwrap();
    arena.push(8, 8).unwrap();
    let total = std::thread::spawn(move || {
        arena.push(8, 8).unwrap();
        arena.total_used_size()
    })
    .join()
    .unwrap();
    assert_eq!(total, 16);
}

#[test]
#[should_panic(expected = "not growable")]
fn test_fixed_arena_exhaustion_is_fatal() {
    let mut arena = Arena::new(64, false).unwrap();
    arena.push(40, 1).unwrap();
    let _ = arena.push(30, 1);
}

#[test]
#[should_panic(expected = "not growable")]
fn test_fixed_arena_padding_counts_toward_capacity() {
    let mut arena = Arena::new(64, false).unwrap();
    arena.push(60, 1).unwrap();
    // 4 bytes of padding plus 4 bytes requested.
    let _ = arena.push(4, 8);
}

#[test]
fn test_fixed_arena_fills_exactly() {
    let mut arena = Arena::new(64, false).unwrap();
    arena.push(32, 8).unwrap();
    arena.push(32, 8).unwrap();
    assert_eq!(arena.total_used_size(), 64);
    assert_eq!(arena.block_count(), 1);
}

#[test]
#[should_panic(expected = "beyond the current total used size")]
fn test_pop_beyond_watermark_is_fatal() {
    let mut arena = Arena::new(64, true).unwrap();
    arena.push(8, 8).unwrap();
    arena.pop(9);
}

#[test]
#[should_panic(expected = "cannot push 0 bytes")]
fn test_zero_size_is_fatal() {
    let mut arena = Arena::new(64, true).unwrap();
    let _ = arena.push(0, 8);
}

#[test]
#[should_panic(expected = "0 byte alignment")]
fn test_zero_alignment_is_fatal() {
    let mut arena = Arena::new(64, true).unwrap();
    let _ = arena.push(8, 0);
}

#[test]
#[should_panic(expected = "not a power of two")]
fn test_non_power_of_two_alignment_is_fatal() {
    let mut arena = Arena::new(64, true).unwrap();
    let _ = arena.push(8, 12);
}

#[test]
#[should_panic(expected = "initial block capacity cannot be zero")]
fn test_zero_initial_capacity_is_fatal() {
    let _ = Arena::new(0, true);
}
