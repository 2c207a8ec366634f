//! Entry points: standalone and layered normalization.

use bumpalo::Bump;
use rustc_hash::{FxHashMap, FxHashSet};

use knit_ir::{AllocatorLayout, Binding, Entry, TypeKey};

use crate::compress::compress_bindings;
use crate::context::{NormalizationContext, NormalizedParts};
use crate::lookup::{NoBase, NormalizedBase};
use crate::{LayeredStorage, NormalizationError, NormalizedComponentStorage, NormalizedMultibindingSet};

/// Whether and how bindings are compressed after a standalone traversal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CompressionMode {
    /// Compression markers are ignored.
    Disabled,
    /// Compressions are applied and forgotten. The result can still serve
    /// as a base, but a layer cannot restore a compressed-away binding.
    #[default]
    Permanent,
    /// Compressions are applied and recorded, so a layer that needs the
    /// implementation type can put both bindings back.
    Undoable,
}

/// Flatten `toplevel` into a normalized storage.
///
/// Types in `exposed` are requested directly by callers and are never
/// compressed away.
///
/// # Errors
///
/// Returns the first [`NormalizationError`] met; no partial result is kept.
pub fn normalize(
    toplevel: Vec<Entry>,
    exposed: &[TypeKey],
    mode: CompressionMode,
) -> Result<NormalizedComponentStorage, NormalizationError> {
    tracing::debug!(entries = toplevel.len(), ?mode, "normalizing components");

    let arena = Bump::new();
    let base = NoBase;
    let mut ctx = NormalizationContext::new(
        &arena,
        &base,
        toplevel,
        FxHashMap::default(),
        AllocatorLayout::new(),
        mode != CompressionMode::Disabled,
    );
    ctx.run()?;

    let NormalizedParts {
        mut bindings,
        multibindings,
        layout,
        compression_candidates,
        ..
    } = ctx.into_parts();

    let mut compression_undo = FxHashMap::default();
    let mut compressed_interfaces = FxHashMap::default();
    let compressed = compress_bindings(
        &mut bindings,
        compression_candidates,
        &multibindings,
        exposed,
        |c, undo| {
            if mode == CompressionMode::Undoable {
                compressed_interfaces.insert(undo.i, c);
                compression_undo.insert(c, undo);
            }
        },
    );

    tracing::debug!(
        bindings = bindings.len(),
        multibinding_types = multibindings.len(),
        compressed,
        arena_size = layout.arena_size(),
        objects = layout.total_objects(),
        "normalization finished"
    );

    Ok(NormalizedComponentStorage {
        bindings,
        multibindings,
        layout,
        compression_undo,
        compressed_interfaces,
        compression_mode: mode,
    })
}

/// [`normalize`] with [`CompressionMode::Permanent`].
pub fn normalize_with_permanent_compression(
    toplevel: Vec<Entry>,
    exposed: &[TypeKey],
) -> Result<NormalizedComponentStorage, NormalizationError> {
    normalize(toplevel, exposed, CompressionMode::Permanent)
}

/// [`normalize`] with [`CompressionMode::Undoable`].
pub fn normalize_with_undoable_compression(
    toplevel: Vec<Entry>,
    exposed: &[TypeKey],
) -> Result<NormalizedComponentStorage, NormalizationError> {
    normalize(toplevel, exposed, CompressionMode::Undoable)
}

/// Normalize `toplevel` on top of an already normalized `base`.
///
/// The base is only read. Bindings it already has are not added again,
/// and components are expanded without consulting the base's memo, so a
/// component installed by both is re-expanded and its bindings dedupe
/// against the base. Compression markers are ignored.
///
/// When a new binding or multibinding contribution depends on a type the
/// base compressed away, that compression is undone in the delta.
///
/// # Errors
///
/// As [`normalize`]; a binding that differs from the base's binding for the
/// same type is a [`NormalizationError::ConflictingBinding`].
pub fn normalize_layered<'base, B>(
    toplevel: Vec<Entry>,
    base: &'base B,
) -> Result<LayeredStorage<'base, B>, NormalizationError>
where
    B: NormalizedBase + ?Sized,
{
    tracing::debug!(entries = toplevel.len(), "normalizing components on a base");

    let arena = Bump::new();
    let mut ctx = NormalizationContext::new(
        &arena,
        base,
        toplevel,
        base.multibinding_sets().clone(),
        AllocatorLayout::new(),
        false,
    );
    ctx.run()?;

    let NormalizedParts {
        mut bindings,
        multibindings,
        layout: delta_layout,
        reinstated,
        ..
    } = ctx.into_parts();

    let undone = undo_compressions(base, &mut bindings, &multibindings, reinstated);

    let mut layout = *base.allocator_layout();
    layout.merge(&delta_layout);

    tracing::debug!(
        bindings = bindings.len(),
        undone = undone.len(),
        arena_size = layout.arena_size(),
        objects = layout.total_objects(),
        "layered normalization finished"
    );

    Ok(LayeredStorage {
        base,
        delta: NormalizedComponentStorage {
            bindings,
            multibindings,
            layout,
            compression_undo: FxHashMap::default(),
            compressed_interfaces: FxHashMap::default(),
            compression_mode: CompressionMode::Disabled,
        },
        undone,
    })
}

/// Restore, in `bindings`, every base compression whose implementation type
/// the delta needs. Returns the implementation types, sorted by name.
///
/// `reinstated` holds implementation types the delta declared again. Those
/// are restored too, so the object is built once and shared by both
/// bindings.
fn undo_compressions<B: NormalizedBase + ?Sized>(
    base: &B,
    bindings: &mut FxHashMap<TypeKey, Binding>,
    multibindings: &FxHashMap<TypeKey, NormalizedMultibindingSet>,
    reinstated: FxHashSet<TypeKey>,
) -> Vec<TypeKey> {
    let mut to_undo = reinstated;

    for (&x, binding) in bindings.iter() {
        for &dep in binding.deps() {
            if base.compression_undo(dep).is_some_and(|undo| undo.i != x) {
                to_undo.insert(dep);
            }
        }
    }
    for set in multibindings.values() {
        for dep in set.deps() {
            if base.compression_undo(dep).is_some() {
                to_undo.insert(dep);
            }
        }
    }

    let mut undone = Vec::with_capacity(to_undo.len());
    for c in to_undo {
        let Some(undo) = base.compression_undo(c) else {
            continue;
        };
        tracing::debug!(i = %undo.i, c = %c, "undoing binding compression");
        for binding in undo.restored_bindings() {
            bindings.entry(binding.ty()).or_insert(binding);
        }
        undone.push(c);
    }
    undone.sort_unstable_by_key(|ty| ty.name());
    undone
}

#[cfg(test)]
mod tests;
