//! Output of normalization.
//!
//! [`NormalizedComponentStorage`] is immutable once built. Layering never
//! writes to it; [`LayeredStorage`] keeps a shared reference to the base and
//! owns only the delta, so one base can back any number of injectors, on
//! any number of threads.

use std::fmt;

use rustc_hash::FxHashMap;

use knit_ir::{AllocatorLayout, Binding, MultibindingContribution, TypeKey, VectorBuilderFn};

use crate::lookup::{BaseBinding, BindingLookup, NormalizedBase};
use crate::{CompressionMode, CompressionUndo};

/// Every contribution to one multibinding type, in installation order.
#[derive(Clone)]
pub struct NormalizedMultibindingSet {
    elems: Vec<MultibindingContribution>,
    build_vector: VectorBuilderFn,
}

impl NormalizedMultibindingSet {
    pub(crate) fn new(build_vector: VectorBuilderFn) -> Self {
        NormalizedMultibindingSet {
            elems: Vec::new(),
            build_vector,
        }
    }

    pub(crate) fn push(&mut self, contribution: MultibindingContribution) {
        self.elems.push(contribution);
    }

    pub fn elems(&self) -> &[MultibindingContribution] {
        &self.elems
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Builder that turns the constructed elements into the collection.
    pub fn build_vector(&self) -> VectorBuilderFn {
        self.build_vector
    }

    /// Dependencies of all constructible contributions.
    pub fn deps(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.elems.iter().flat_map(|elem| elem.deps().iter().copied())
    }
}

impl fmt::Debug for NormalizedMultibindingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedMultibindingSet")
            .field("elems", &self.elems)
            .finish_non_exhaustive()
    }
}

/// Flattened, deduplicated bindings ready for an injector.
#[derive(Clone, Debug, Default)]
pub struct NormalizedComponentStorage {
    pub(crate) bindings: FxHashMap<TypeKey, Binding>,
    pub(crate) multibindings: FxHashMap<TypeKey, NormalizedMultibindingSet>,
    pub(crate) layout: AllocatorLayout,
    /// Implementation type → how to undo its compression.
    pub(crate) compression_undo: FxHashMap<TypeKey, CompressionUndo>,
    /// Interface type → implementation type, for every undoable compression.
    pub(crate) compressed_interfaces: FxHashMap<TypeKey, TypeKey>,
    pub(crate) compression_mode: CompressionMode,
}

impl NormalizedComponentStorage {
    pub fn binding(&self, ty: TypeKey) -> Option<&Binding> {
        self.bindings.get(&ty)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> + '_ {
        self.bindings.values()
    }

    pub fn num_bindings(&self) -> usize {
        self.bindings.len()
    }

    pub fn multibindings(&self, ty: TypeKey) -> Option<&NormalizedMultibindingSet> {
        self.multibindings.get(&ty)
    }

    pub fn layout(&self) -> &AllocatorLayout {
        &self.layout
    }

    /// Undo records, keyed by implementation type. Empty unless built with
    /// [`CompressionMode::Undoable`].
    pub fn compression_undos(&self) -> impl Iterator<Item = (TypeKey, &CompressionUndo)> + '_ {
        self.compression_undo.iter().map(|(&c, undo)| (c, undo))
    }

    pub fn compression_mode(&self) -> CompressionMode {
        self.compression_mode
    }
}

impl BindingLookup for NormalizedComponentStorage {
    fn find_binding(&self, ty: TypeKey) -> Option<BaseBinding<'_>> {
        if let Some(current) = self.bindings.get(&ty) {
            let undo = self
                .compressed_interfaces
                .get(&ty)
                .and_then(|c| self.compression_undo.get(c));
            return Some(match undo {
                Some(undo) => BaseBinding::Compressed {
                    current,
                    original: &undo.i_binding,
                },
                None => BaseBinding::Declared(current),
            });
        }
        self.compression_undo
            .get(&ty)
            .map(|undo| BaseBinding::Erased {
                original: &undo.c_binding,
            })
    }
}

impl NormalizedBase for NormalizedComponentStorage {
    fn compression_undo(&self, c: TypeKey) -> Option<&CompressionUndo> {
        self.compression_undo.get(&c)
    }

    fn multibinding_sets(&self) -> &FxHashMap<TypeKey, NormalizedMultibindingSet> {
        &self.multibindings
    }

    fn allocator_layout(&self) -> &AllocatorLayout {
        &self.layout
    }
}

/// New bindings normalized on top of a shared base.
///
/// The delta holds the bindings the base did not have (including bindings
/// restored by undoing a base compression), a copy of the base's
/// multibinding sets with the new contributions appended, and the combined
/// allocator layout.
pub struct LayeredStorage<'base, B: NormalizedBase + ?Sized> {
    pub(crate) base: &'base B,
    pub(crate) delta: NormalizedComponentStorage,
    pub(crate) undone: Vec<TypeKey>,
}

impl<'base, B: NormalizedBase + ?Sized> LayeredStorage<'base, B> {
    pub fn base(&self) -> &'base B {
        self.base
    }

    pub fn delta(&self) -> &NormalizedComponentStorage {
        &self.delta
    }

    /// The binding an injector built from this layer uses for `ty`.
    pub fn binding(&self, ty: TypeKey) -> Option<&Binding> {
        match self.delta.bindings.get(&ty) {
            Some(binding) => Some(binding),
            None => self.base.find_binding(ty).and_then(BaseBinding::current),
        }
    }

    pub fn multibindings(&self, ty: TypeKey) -> Option<&NormalizedMultibindingSet> {
        self.delta.multibindings.get(&ty)
    }

    /// Combined layout of base and delta.
    pub fn layout(&self) -> &AllocatorLayout {
        &self.delta.layout
    }

    /// Implementation types whose base compression had to be undone.
    pub fn undone(&self) -> &[TypeKey] {
        &self.undone
    }
}

impl<B: NormalizedBase + ?Sized> BindingLookup for LayeredStorage<'_, B> {
    fn find_binding(&self, ty: TypeKey) -> Option<BaseBinding<'_>> {
        match self.delta.bindings.get(&ty) {
            Some(binding) => Some(BaseBinding::Declared(binding)),
            None => self.base.find_binding(ty),
        }
    }
}

impl<B: NormalizedBase + ?Sized> NormalizedBase for LayeredStorage<'_, B> {
    fn compression_undo(&self, c: TypeKey) -> Option<&CompressionUndo> {
        if self.delta.bindings.contains_key(&c) {
            return None;
        }
        self.base.compression_undo(c)
    }

    fn multibinding_sets(&self) -> &FxHashMap<TypeKey, NormalizedMultibindingSet> {
        &self.delta.multibindings
    }

    fn allocator_layout(&self) -> &AllocatorLayout {
        &self.delta.layout
    }
}

impl<B: NormalizedBase + ?Sized> fmt::Debug for LayeredStorage<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredStorage")
            .field("delta", &self.delta)
            .field("undone", &self.undone)
            .finish_non_exhaustive()
    }
}
