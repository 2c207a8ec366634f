//! Allocation sizing for the injector's object arena.
//!
//! The injector allocates every constructible object up front, in one
//! arena. [`AllocatorLayout`] accumulates how large that arena must be while
//! bindings are normalized, so the injector never grows it incrementally.
//!
//! Recording is additive and order-independent: the same set of objects
//! recorded in any order yields the same layout.

use std::alloc::Layout;

use crate::Allocation;

/// Totals for the objects an injector will construct.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocatorLayout {
    /// Bytes needed in the arena, with worst-case padding per object.
    arena_size: usize,
    /// Objects placed in the arena.
    num_arena_objects: usize,
    /// Objects allocated elsewhere that the injector still has to tear down.
    num_external_objects: usize,
    /// Largest alignment requested by an arena object.
    max_align: usize,
}

impl AllocatorLayout {
    pub fn new() -> Self {
        AllocatorLayout::default()
    }

    /// Account for one object the injector will construct.
    ///
    /// Arena objects reserve `size + align - 1` bytes so any placement of
    /// the object inside the arena can be aligned.
    pub fn record_constructible_object(&mut self, size: usize, align: usize, needs_heap_slot: bool) {
        if needs_heap_slot {
            let align = align.max(1);
            self.arena_size += size + align - 1;
            self.num_arena_objects += 1;
            self.max_align = self.max_align.max(align);
        } else {
            self.num_external_objects += 1;
        }
    }

    /// Account for the object a binding produces. Shared bindings produce
    /// none.
    pub fn record(&mut self, allocation: Allocation) {
        match allocation {
            Allocation::Arena(layout) => {
                self.record_constructible_object(layout.size(), layout.align(), true);
            }
            Allocation::External => self.record_constructible_object(0, 1, false),
            Allocation::Shared => {}
        }
    }

    /// Account for the collection materialized for one multibinding type.
    pub fn record_multibinding_set(&mut self) {
        self.record_constructible_object(0, 1, false);
    }

    /// Add everything recorded in `other`.
    pub fn merge(&mut self, other: &AllocatorLayout) {
        self.arena_size += other.arena_size;
        self.num_arena_objects += other.num_arena_objects;
        self.num_external_objects += other.num_external_objects;
        self.max_align = self.max_align.max(other.max_align);
    }

    #[inline]
    pub fn arena_size(&self) -> usize {
        self.arena_size
    }

    #[inline]
    pub fn num_arena_objects(&self) -> usize {
        self.num_arena_objects
    }

    #[inline]
    pub fn num_external_objects(&self) -> usize {
        self.num_external_objects
    }

    #[inline]
    pub fn total_objects(&self) -> usize {
        self.num_arena_objects + self.num_external_objects
    }

    /// Alignment for the arena allocation; 1 when it holds nothing.
    #[inline]
    pub fn max_align(&self) -> usize {
        self.max_align.max(1)
    }

    /// Layout of the single arena allocation, `None` when no object needs a
    /// slot.
    pub fn arena_layout(&self) -> Option<Layout> {
        if self.arena_size == 0 {
            return None;
        }
        Layout::from_size_align(self.arena_size, self.max_align()).ok()
    }
}
