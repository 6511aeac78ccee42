//! Bump allocator for per-draw vertex and attribute storage.
//!
//! Reset once per draw call: `bumpalo::Bump` already gives the
//! reset-per-draw, grow-never-shrink, no-destructors-on-reset contract this
//! pipeline needs, so `Arena` is a thin wrapper rather than a hand-rolled
//! allocator. It adds one policy on top: only reallocate when the requested
//! footprint exceeds current capacity.

use bumpalo::Bump;

/// A per-draw bump allocator.
///
/// `reset` is called once at the top of `Pipeline::draw`, sized for the
/// exact footprint that draw call needs. Allocations made before a `reset`
/// are invalidated by it — pointers/slices handed out by one draw must not
/// be read after the next `reset`.
pub struct Arena {
    bump: Bump,
    capacity: usize,
}

impl Arena {
    /// Creates an empty arena with no backing storage yet.
    pub fn new() -> Self {
        Self {
            bump: Bump::new(),
            capacity: 0,
        }
    }

    /// Resets the arena for a draw call needing room for `count` elements
    /// of `elem_size` bytes each.
    ///
    /// Reallocates only if the requested footprint exceeds current
    /// capacity; otherwise reuses the existing backing chunk via
    /// `Bump::reset`, which is the amortized-free path this allocator
    /// exists for.
    pub fn reset(&mut self, count: usize, elem_size: usize) {
        let footprint = count.saturating_mul(elem_size);
        if footprint > self.capacity {
            self.bump = Bump::with_capacity(footprint);
            self.capacity = footprint;
            log::trace!("arena grew to {footprint} bytes");
        } else {
            self.bump.reset();
        }
    }

    /// Allocates a single `T`, bump-advancing the bucket pointer.
    ///
    /// Never bounds-checks beyond the capacity promised at the last
    /// `reset` — callers must not allocate more than that draw's vertex
    /// count promised.
    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    /// Allocates `count` floats of attribute storage, zero-initialized.
    pub fn alloc_attrs(&self, count: usize) -> &mut [f32] {
        self.bump.alloc_slice_fill_copy(count, 0.0f32)
    }

    /// Allocates a slice of `count` elements, built one at a time by
    /// `f(index)`. Used for records that aren't `Copy`, such as vertex
    /// headers that own a borrowed attribute slice.
    pub fn alloc_slice_fill_with<T>(&self, count: usize, f: impl FnMut(usize) -> T) -> &mut [T] {
        self.bump.alloc_slice_fill_with(count, f)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_allocations_are_monotonic(count in 1usize..64) {
            let mut arena = Arena::new();
            arena.reset(count, std::mem::size_of::<u32>());

            let mut prev: Option<usize> = None;
            for i in 0..count as u32 {
                let p: &mut u32 = arena.alloc(i);
                let addr = p as *mut u32 as usize;
                if let Some(prev_addr) = prev {
                    prop_assert!(addr > prev_addr);
                }
                prev = Some(addr);
            }
        }
    }

    #[test]
    fn test_reset_without_growth_reuses_capacity() {
        let mut arena = Arena::new();
        arena.reset(4, 16);
        let cap_after_first = arena.capacity;
        arena.reset(4, 16);
        assert_eq!(arena.capacity, cap_after_first);
    }

    #[test]
    fn test_reset_grows_only_when_needed() {
        let mut arena = Arena::new();
        arena.reset(4, 16);
        let small_cap = arena.capacity;
        arena.reset(100, 16);
        assert!(arena.capacity > small_cap);
    }

    #[test]
    fn test_allocate_monotonic_addresses() {
        let mut arena = Arena::new();
        arena.reset(8, std::mem::size_of::<u64>());

        let mut addrs = Vec::new();
        for i in 0..8u64 {
            let p: &mut u64 = arena.alloc(i);
            addrs.push(p as *mut u64 as usize);
        }

        for pair in addrs.windows(2) {
            assert!(pair[1] > pair[0], "allocations must strictly increase");
        }
    }

    #[test]
    fn test_alloc_attrs_non_aliasing_per_vertex() {
        let mut arena = Arena::new();
        let attr_count = 4;
        let vertex_count = 3;
        arena.reset(vertex_count, attr_count * std::mem::size_of::<f32>());

        let slices: Vec<*mut f32> = (0..vertex_count)
            .map(|_| arena.alloc_attrs(attr_count).as_mut_ptr())
            .collect();

        for i in 0..slices.len() {
            for j in (i + 1)..slices.len() {
                assert_ne!(slices[i], slices[j]);
            }
        }
    }
}
