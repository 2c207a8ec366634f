//! The worklist traversal.
//!
//! Entries are processed from an explicit stack rather than by recursion,
//! so installation graphs of any depth are handled without growing the
//! call stack.
//!
//! Expanding a lazy component pushes an end marker for it and then its own
//! entries on top, so everything the component installs is processed before
//! the marker is popped. While the marker is on the stack the component is
//! "in progress": meeting it again is an installation cycle. Once the marker
//! is popped the component is "fully expanded", and later installations of
//! the same identity are skipped.

use std::collections::hash_map::Entry as MapEntry;

use smallvec::SmallVec;

use knit_ir::{
    Binding, CompressedBindingMarker, Entry, LazyComponent, MultibindingEntry, ReplacementMapping,
};

use crate::context::NormalizationContext;
use crate::lookup::{BaseBinding, BindingLookup};
use crate::{NormalizationError, NormalizedMultibindingSet};

impl<L: BindingLookup + ?Sized> NormalizationContext<'_, '_, L> {
    /// Process entries until the worklist is empty.
    pub(crate) fn run(&mut self) -> Result<(), NormalizationError> {
        while let Some(entry) = self.worklist.pop() {
            self.stats.entries += 1;
            match entry {
                Entry::Constructed(binding) => self.fold_binding(binding.into())?,
                Entry::Constructible(binding) => self.fold_binding(binding.into())?,
                Entry::CompressedBinding(marker) => self.fold_compression_marker(marker),
                Entry::Multibinding(multibinding) => self.fold_multibinding(multibinding),
                Entry::LazyComponent(component) => self.expand_component(component)?,
                Entry::ComponentEnd(component) => self.finish_component(component),
                Entry::Replacement(mapping) => self.register_replacement(mapping)?,
            }
        }
        Ok(())
    }

    /// Keep the first binding for a type; identical repeats are dropped,
    /// different ones are an error.
    fn fold_binding(&mut self, binding: Binding) -> Result<(), NormalizationError> {
        let ty = binding.ty();
        let base = self.base;

        if let Some(existing) = base.find_binding(ty) {
            if !existing.accepts(&binding) {
                return Err(NormalizationError::ConflictingBinding { ty });
            }
            if let BaseBinding::Erased { .. } = existing {
                self.reinstated.insert(ty);
            }
            return Ok(());
        }

        match self.bindings.entry(ty) {
            MapEntry::Occupied(existing) => {
                if existing.get().is_equivalent(&binding) {
                    Ok(())
                } else {
                    Err(NormalizationError::ConflictingBinding { ty })
                }
            }
            MapEntry::Vacant(slot) => {
                if let Some(allocation) = binding.allocation() {
                    self.layout.record(allocation);
                }
                slot.insert(binding);
                Ok(())
            }
        }
    }

    fn fold_compression_marker(&mut self, marker: CompressedBindingMarker) {
        if let Some(candidates) = &mut self.compression_candidates {
            candidates.insert(marker.c, marker.into());
        }
    }

    /// Multibindings accumulate; nothing is deduplicated.
    fn fold_multibinding(&mut self, multibinding: MultibindingEntry) {
        let MultibindingEntry {
            ty,
            contribution,
            build_vector,
        } = multibinding;

        if let Some(allocation) = contribution.allocation() {
            self.layout.record(allocation);
        }
        let set = match self.multibindings.entry(ty) {
            MapEntry::Occupied(set) => set.into_mut(),
            MapEntry::Vacant(slot) => {
                self.layout.record_multibinding_set();
                slot.insert(NormalizedMultibindingSet::new(build_vector))
            }
        };
        set.push(contribution);
    }

    fn expand_component(&mut self, component: LazyComponent) -> Result<(), NormalizationError> {
        let component = self.resolve_replacement(component)?;

        if self.fully_expanded.contains(&component) {
            self.stats.memo_hits += 1;
            tracing::trace!(%component, "already expanded");
            return Ok(());
        }
        if self.in_progress.contains(&component) {
            return Err(self.installation_cycle(component));
        }

        tracing::trace!(%component, in_progress = self.in_progress.len(), "expanding component");
        self.stats.expanded += 1;

        let expanded = component.expand();
        self.in_progress.insert(component.clone());
        self.worklist.push(Entry::ComponentEnd(component));
        self.worklist.extend(expanded.into_entries().into_iter().rev());
        Ok(())
    }

    /// Follow registered replacements from `component` to the component
    /// that is actually installed.
    ///
    /// Replacements that lead back to a component already on the chain are
    /// reported as an installation cycle.
    fn resolve_replacement(
        &mut self,
        component: LazyComponent,
    ) -> Result<LazyComponent, NormalizationError> {
        let Some(first) = self.replacements.get(&component) else {
            return Ok(component);
        };

        let mut current = first.clone();
        let mut chain: SmallVec<[LazyComponent; 4]> = SmallVec::new();
        chain.push(component);

        loop {
            if let Some(loop_start) = chain.iter().position(|c| *c == current) {
                chain.push(current);
                return Err(NormalizationError::InstallationCycle {
                    chain: chain.into_vec(),
                    loop_start,
                });
            }
            let Some(next) = self.replacements.get(&current) else {
                break;
            };
            let next = next.clone();
            chain.push(std::mem::replace(&mut current, next));
        }

        self.stats.replaced += 1;
        tracing::trace!(replaced = %chain[0], replacement = %current, "replacing component");
        Ok(current)
    }

    /// The components currently in progress, outermost first, followed by
    /// `component`.
    fn installation_cycle(&self, component: LazyComponent) -> NormalizationError {
        let mut chain: Vec<LazyComponent> = self
            .worklist
            .iter()
            .filter_map(|entry| match entry {
                Entry::ComponentEnd(c) => Some(c.clone()),
                _ => None,
            })
            .collect();
        let loop_start = chain.iter().position(|c| *c == component).unwrap_or(0);
        chain.push(component);
        NormalizationError::InstallationCycle { chain, loop_start }
    }

    fn finish_component(&mut self, component: LazyComponent) {
        self.in_progress.remove(&component);
        self.fully_expanded.insert(component);
    }

    /// A replacement only affects installations processed after it, so its
    /// target must not have started expanding yet.
    fn register_replacement(&mut self, mapping: ReplacementMapping) -> Result<(), NormalizationError> {
        let ReplacementMapping {
            replaced,
            replacement,
        } = mapping;

        if self.in_progress.contains(&replaced) || self.fully_expanded.contains(&replaced) {
            return Err(NormalizationError::LateReplacement {
                replaced,
                replacement,
            });
        }

        self.replacements
            .register(replaced.clone(), replacement.clone())
            .map_err(|registered| NormalizationError::ConflictingReplacement {
                replaced,
                registered,
                rejected: replacement,
            })
    }
}
