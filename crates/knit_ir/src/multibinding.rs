//! Multibinding contributions.
//!
//! Unlike single bindings, contributions are never deduplicated: every
//! contribution that reaches the engine ends up in the collection the
//! injector materializes for its type.

use std::fmt;

use crate::binding::create_addr;
use crate::{Allocation, CreateFn, Deps, Instance, TypeKey};

/// Builds the collection handed out for a multibinding type from its
/// constructed elements.
pub type VectorBuilderFn = fn(Vec<Instance>) -> Instance;

/// One value contributed to a multibinding set.
#[derive(Clone)]
pub enum MultibindingContribution {
    /// An instance that already exists.
    Constructed(Instance),
    /// An object the injector must construct.
    Constructible {
        create: CreateFn,
        deps: Deps,
        allocation: Allocation,
    },
}

impl MultibindingContribution {
    pub fn deps(&self) -> &[TypeKey] {
        match self {
            MultibindingContribution::Constructed(_) => &[],
            MultibindingContribution::Constructible { deps, .. } => deps,
        }
    }

    pub fn allocation(&self) -> Option<Allocation> {
        match self {
            MultibindingContribution::Constructed(_) => None,
            MultibindingContribution::Constructible { allocation, .. } => Some(*allocation),
        }
    }
}

impl fmt::Debug for MultibindingContribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultibindingContribution::Constructed(instance) => f
                .debug_tuple("Constructed")
                .field(&std::sync::Arc::as_ptr(instance).cast::<()>())
                .finish(),
            MultibindingContribution::Constructible {
                create,
                deps,
                allocation,
            } => f
                .debug_struct("Constructible")
                .field("create", &format_args!("{:#x}", create_addr(*create)))
                .field("deps", deps)
                .field("allocation", allocation)
                .finish(),
        }
    }
}

/// A multibinding contribution together with the builder for its
/// collection.
///
/// Every contribution for a type is expected to carry the same builder; the
/// first one seen is the one kept.
#[derive(Clone)]
pub struct MultibindingEntry {
    pub ty: TypeKey,
    pub contribution: MultibindingContribution,
    pub build_vector: VectorBuilderFn,
}

impl MultibindingEntry {
    pub fn constructed(ty: TypeKey, instance: Instance, build_vector: VectorBuilderFn) -> Self {
        MultibindingEntry {
            ty,
            contribution: MultibindingContribution::Constructed(instance),
            build_vector,
        }
    }

    pub fn constructible(
        ty: TypeKey,
        create: CreateFn,
        deps: Deps,
        allocation: Allocation,
        build_vector: VectorBuilderFn,
    ) -> Self {
        MultibindingEntry {
            ty,
            contribution: MultibindingContribution::Constructible {
                create,
                deps,
                allocation,
            },
            build_vector,
        }
    }
}

impl fmt::Debug for MultibindingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultibindingEntry")
            .field("ty", &self.ty)
            .field("contribution", &self.contribution)
            .finish_non_exhaustive()
    }
}
