//! Identity sets and replacement maps for lazy components.
//!
//! No-args and with-args components are kept apart: a no-args identity is
//! just a function address and hashes in one step, while a with-args
//! identity goes through its type-erased argument comparison.

use std::collections::hash_map::Entry as MapEntry;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use knit_ir::{LazyComponent, LazyComponentNoArgs, LazyComponentWithArgs};

/// Set of lazy component identities.
#[derive(Default)]
pub(crate) struct LazyComponentSet {
    no_args: FxHashSet<LazyComponentNoArgs>,
    with_args: FxHashSet<LazyComponentWithArgs>,
}

impl LazyComponentSet {
    /// Returns `false` if the identity was already present.
    pub(crate) fn insert(&mut self, component: LazyComponent) -> bool {
        match component {
            LazyComponent::NoArgs(c) => self.no_args.insert(c),
            LazyComponent::WithArgs(c) => self.with_args.insert(c),
        }
    }

    pub(crate) fn contains(&self, component: &LazyComponent) -> bool {
        match component {
            LazyComponent::NoArgs(c) => self.no_args.contains(c),
            LazyComponent::WithArgs(c) => self.with_args.contains(c),
        }
    }

    pub(crate) fn remove(&mut self, component: &LazyComponent) -> bool {
        match component {
            LazyComponent::NoArgs(c) => self.no_args.remove(c),
            LazyComponent::WithArgs(c) => self.with_args.remove(c),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.no_args.len() + self.with_args.len()
    }
}

/// Registered component replacements, replaced identity → replacement.
#[derive(Default)]
pub(crate) struct ReplacementMap {
    no_args: FxHashMap<LazyComponentNoArgs, LazyComponent>,
    with_args: FxHashMap<LazyComponentWithArgs, LazyComponent>,
}

impl ReplacementMap {
    pub(crate) fn get(&self, replaced: &LazyComponent) -> Option<&LazyComponent> {
        match replaced {
            LazyComponent::NoArgs(c) => self.no_args.get(c),
            LazyComponent::WithArgs(c) => self.with_args.get(c),
        }
    }

    /// Register `replaced → replacement`.
    ///
    /// Registering the same pair twice is fine. If `replaced` already has a
    /// different replacement, that one is kept and returned as the error.
    pub(crate) fn register(
        &mut self,
        replaced: LazyComponent,
        replacement: LazyComponent,
    ) -> Result<(), LazyComponent> {
        match replaced {
            LazyComponent::NoArgs(c) => register_in(&mut self.no_args, c, replacement),
            LazyComponent::WithArgs(c) => register_in(&mut self.with_args, c, replacement),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.no_args.len() + self.with_args.len()
    }
}

fn register_in<K: Eq + Hash>(
    map: &mut FxHashMap<K, LazyComponent>,
    replaced: K,
    replacement: LazyComponent,
) -> Result<(), LazyComponent> {
    match map.entry(replaced) {
        MapEntry::Occupied(existing) if *existing.get() == replacement => Ok(()),
        MapEntry::Occupied(existing) => Err(existing.get().clone()),
        MapEntry::Vacant(slot) => {
            slot.insert(replacement);
            Ok(())
        }
    }
}
