//! Lookup strategies: what the traversal asks about bindings that already
//! exist outside the current call.
//!
//! Standalone normalization uses [`NoBase`]. Layered normalization asks an
//! already-normalized base first, so a shared base can be extended without
//! copying or re-processing its bindings.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use knit_ir::{AllocatorLayout, Binding, TypeKey};

use crate::{CompressionUndo, NormalizedMultibindingSet};

/// How a base answers "is `ty` already bound?".
#[derive(Copy, Clone, Debug)]
pub enum BaseBinding<'a> {
    /// Bound exactly as declared.
    Declared(&'a Binding),
    /// Interface side of an applied compression. `current` is the
    /// compressed binding, `original` the one that was declared.
    Compressed {
        current: &'a Binding,
        original: &'a Binding,
    },
    /// Implementation side of an applied compression. The base has no
    /// binding for it any more; `original` is the one that was declared.
    Erased { original: &'a Binding },
}

impl<'a> BaseBinding<'a> {
    /// The binding an injector built from the base would use, if any.
    pub fn current(self) -> Option<&'a Binding> {
        match self {
            BaseBinding::Declared(b) | BaseBinding::Compressed { current: b, .. } => Some(b),
            BaseBinding::Erased { .. } => None,
        }
    }

    /// Whether declaring `binding` again on top of the base is a duplicate.
    pub fn accepts(self, binding: &Binding) -> bool {
        match self {
            BaseBinding::Declared(b) | BaseBinding::Erased { original: b } => {
                b.is_equivalent(binding)
            }
            BaseBinding::Compressed { current, original } => {
                original.is_equivalent(binding) || current.is_equivalent(binding)
            }
        }
    }
}

/// Answers whether a type is already bound before the current call.
pub trait BindingLookup {
    fn find_binding(&self, ty: TypeKey) -> Option<BaseBinding<'_>>;
}

/// A finished normalization that can serve as the base of a layer.
pub trait NormalizedBase: BindingLookup {
    /// Undo record for the compression whose implementation type is `c`.
    fn compression_undo(&self, c: TypeKey) -> Option<&CompressionUndo>;

    fn multibinding_sets(&self) -> &FxHashMap<TypeKey, NormalizedMultibindingSet>;

    fn allocator_layout(&self) -> &AllocatorLayout;
}

/// Lookup for standalone normalization: nothing is bound yet.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoBase;

impl BindingLookup for NoBase {
    #[inline]
    fn find_binding(&self, _ty: TypeKey) -> Option<BaseBinding<'_>> {
        None
    }
}

impl<T: BindingLookup + ?Sized> BindingLookup for Arc<T> {
    fn find_binding(&self, ty: TypeKey) -> Option<BaseBinding<'_>> {
        (**self).find_binding(ty)
    }
}

impl<T: NormalizedBase + ?Sized> NormalizedBase for Arc<T> {
    fn compression_undo(&self, c: TypeKey) -> Option<&CompressionUndo> {
        (**self).compression_undo(c)
    }

    fn multibinding_sets(&self) -> &FxHashMap<TypeKey, NormalizedMultibindingSet> {
        (**self).multibinding_sets()
    }

    fn allocator_layout(&self) -> &AllocatorLayout {
        (**self).allocator_layout()
    }
}
