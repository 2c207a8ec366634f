//! State threaded through one normalization call.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use rustc_hash::{FxHashMap, FxHashSet};

use knit_ir::{AllocatorLayout, Binding, Entry, TypeKey};

use crate::compress::CompressionCandidate;
use crate::lookup::BindingLookup;
use crate::sets::{LazyComponentSet, ReplacementMap};
use crate::NormalizedMultibindingSet;

/// Mutable state of one normalization call.
///
/// The worklist lives in the call's scratch arena; the maps are owned here
/// and dropped with the context. Only the bindings, multibindings and layout
/// survive, through [`NormalizationContext::into_parts`].
pub(crate) struct NormalizationContext<'arena, 'base, L: BindingLookup + ?Sized> {
    /// Where bindings that exist before this call are looked up.
    pub(crate) base: &'base L,
    /// Pending entries, in reverse: the next entry to process is last.
    pub(crate) worklist: BumpVec<'arena, Entry>,
    pub(crate) bindings: FxHashMap<TypeKey, Binding>,
    pub(crate) multibindings: FxHashMap<TypeKey, NormalizedMultibindingSet>,
    pub(crate) layout: AllocatorLayout,
    /// Implementation type → candidate. `None` when compression markers are
    /// ignored.
    pub(crate) compression_candidates: Option<FxHashMap<TypeKey, CompressionCandidate>>,
    /// Types the base erased by compression that were declared again.
    pub(crate) reinstated: FxHashSet<TypeKey>,
    pub(crate) fully_expanded: LazyComponentSet,
    /// Components whose end marker is still on the worklist.
    pub(crate) in_progress: LazyComponentSet,
    pub(crate) replacements: ReplacementMap,
    pub(crate) stats: TraversalStats,
}

/// Counters reported in the debug log at the end of a call.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct TraversalStats {
    pub(crate) entries: usize,
    pub(crate) expanded: usize,
    pub(crate) memo_hits: usize,
    pub(crate) replaced: usize,
}

/// What a finished traversal hands back to its driver.
pub(crate) struct NormalizedParts {
    pub(crate) bindings: FxHashMap<TypeKey, Binding>,
    pub(crate) multibindings: FxHashMap<TypeKey, NormalizedMultibindingSet>,
    pub(crate) layout: AllocatorLayout,
    pub(crate) compression_candidates: FxHashMap<TypeKey, CompressionCandidate>,
    pub(crate) reinstated: FxHashSet<TypeKey>,
}

impl<'arena, 'base, L: BindingLookup + ?Sized> NormalizationContext<'arena, 'base, L> {
    /// Context for `toplevel`, given in declaration order.
    ///
    /// `multibindings` and `layout` are the starting point: empty for a
    /// standalone call, the base's for a layered one.
    pub(crate) fn new(
        arena: &'arena Bump,
        base: &'base L,
        toplevel: Vec<Entry>,
        multibindings: FxHashMap<TypeKey, NormalizedMultibindingSet>,
        layout: AllocatorLayout,
        collect_compressions: bool,
    ) -> Self {
        let mut worklist = BumpVec::with_capacity_in(toplevel.len(), arena);
        worklist.extend(toplevel.into_iter().rev());

        NormalizationContext {
            base,
            worklist,
            bindings: FxHashMap::default(),
            multibindings,
            layout,
            compression_candidates: collect_compressions.then(FxHashMap::default),
            reinstated: FxHashSet::default(),
            fully_expanded: LazyComponentSet::default(),
            in_progress: LazyComponentSet::default(),
            replacements: ReplacementMap::default(),
            stats: TraversalStats::default(),
        }
    }

    pub(crate) fn into_parts(self) -> NormalizedParts {
        tracing::debug!(
            entries = self.stats.entries,
            expanded = self.stats.expanded,
            memo_hits = self.stats.memo_hits,
            replaced = self.stats.replaced,
            components = self.fully_expanded.len(),
            replacements = self.replacements.len(),
            bindings = self.bindings.len(),
            multibinding_types = self.multibindings.len(),
            "traversal finished"
        );

        NormalizedParts {
            bindings: self.bindings,
            multibindings: self.multibindings,
            layout: self.layout,
            compression_candidates: self.compression_candidates.unwrap_or_default(),
            reinstated: self.reinstated,
        }
    }
}
