//! Binding compression.
//!
//! When `I` is bound to its implementation `C`, the injector would build
//! `C`, then hand out the same object again as `I`. If nothing but `I` ever
//! asks for `C`, the two bindings collapse into one: `I` is built directly
//! with `C`'s construction path and dependencies, and `C`'s binding goes
//! away. That saves one graph node and one indirection per such pair.
//!
//! A candidate `I → C` is dropped when:
//!
//! - `C` is a dependency of a multibinding contribution;
//! - `C` is exposed to callers;
//! - a binding other than `I` depends on `C`;
//! - either side is not a constructible binding, or `I` is no longer bound
//!   with the construction function the candidate was declared for;
//! - either side takes part in another candidate.
//!
//! The undoable variant hands a [`CompressionUndo`] for every applied
//! compression to the caller, so a later layer that does need `C` can put
//! both original bindings back.

use rustc_hash::{FxHashMap, FxHashSet};

use knit_ir::{Binding, CompressedBindingMarker, ConstructibleBinding, CreateFn, TypeKey};

use crate::NormalizedMultibindingSet;

/// A compression that may be applied, keyed by its implementation type.
#[derive(Copy, Clone)]
pub(crate) struct CompressionCandidate {
    pub(crate) i: TypeKey,
    pub(crate) original_create: CreateFn,
    pub(crate) compressed_create: CreateFn,
}

impl From<CompressedBindingMarker> for CompressionCandidate {
    fn from(marker: CompressedBindingMarker) -> Self {
        CompressionCandidate {
            i: marker.i,
            original_create: marker.original_create,
            compressed_create: marker.compressed_create,
        }
    }
}

/// Enough to put back the two bindings a compression merged.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressionUndo {
    /// Interface type that kept the compressed binding.
    pub i: TypeKey,
    /// Binding of the interface as declared.
    pub i_binding: Binding,
    /// Binding of the implementation as declared.
    pub c_binding: Binding,
}

impl CompressionUndo {
    /// Implementation type that was compressed away.
    pub fn c(&self) -> TypeKey {
        self.c_binding.ty()
    }

    /// The declared interface and implementation bindings.
    pub fn restored_bindings(&self) -> [Binding; 2] {
        [self.i_binding.clone(), self.c_binding.clone()]
    }
}

/// Apply every safe compression among `candidates` to `bindings`.
///
/// `save_undo` is called with `(c, undo)` for each applied compression.
/// Returns how many were applied.
pub(crate) fn compress_bindings(
    bindings: &mut FxHashMap<TypeKey, Binding>,
    mut candidates: FxHashMap<TypeKey, CompressionCandidate>,
    multibindings: &FxHashMap<TypeKey, NormalizedMultibindingSet>,
    exposed: &[TypeKey],
    mut save_undo: impl FnMut(TypeKey, CompressionUndo),
) -> usize {
    if candidates.is_empty() {
        return 0;
    }

    for set in multibindings.values() {
        for dep in set.deps() {
            candidates.remove(&dep);
        }
    }

    for ty in exposed {
        candidates.remove(ty);
    }

    for (&x, binding) in bindings.iter() {
        for dep in binding.deps() {
            if candidates.get(dep).is_some_and(|candidate| candidate.i != x) {
                candidates.remove(dep);
            }
        }
    }

    // A type can be the interface of one pair and the implementation of
    // another only in hand-built entries; leave such chains alone.
    let interfaces: FxHashSet<TypeKey> = candidates.values().map(|c| c.i).collect();
    let implementations: FxHashSet<TypeKey> = candidates.keys().copied().collect();
    let mut applied = 0;

    for (c, candidate) in candidates {
        if interfaces.contains(&c) || implementations.contains(&candidate.i) {
            continue;
        }
        let Some(compressed) = compressed_binding(bindings, c, &candidate) else {
            continue;
        };
        let Some(c_binding) = bindings.remove(&c) else {
            continue;
        };
        let Some(i_binding) = bindings.insert(candidate.i, compressed.into()) else {
            continue;
        };

        tracing::debug!(i = %candidate.i, c = %c, "compressed binding");
        save_undo(
            c,
            CompressionUndo {
                i: candidate.i,
                i_binding,
                c_binding,
            },
        );
        applied += 1;
    }

    applied
}

/// The merged binding for `candidate.i`, or `None` if the pair does not
/// qualify.
fn compressed_binding(
    bindings: &FxHashMap<TypeKey, Binding>,
    c: TypeKey,
    candidate: &CompressionCandidate,
) -> Option<ConstructibleBinding> {
    let i_binding = bindings.get(&candidate.i)?.as_constructible()?;
    let c_binding = bindings.get(&c)?.as_constructible()?;
    if !i_binding.uses(candidate.original_create) {
        return None;
    }
    Some(ConstructibleBinding::new(
        candidate.i,
        candidate.compressed_create,
        c_binding.deps.clone(),
        c_binding.allocation,
    ))
}
