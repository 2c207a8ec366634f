//! Entry factories shared by the integration tests.

#![allow(dead_code, reason = "not every test binary uses every factory")]

use std::sync::Arc;

use knit_ir::{
    Allocation, CompressedBindingMarker, ConstructibleBinding, Deps, Entry, Instance,
    MultibindingEntry, ObjectGraph, TypeKey,
};

#[derive(Debug, Default)]
pub struct Config;
#[derive(Debug, Default)]
pub struct Database;
#[derive(Debug, Default)]
pub struct UserRepository;
#[derive(Debug, Default)]
pub struct AuditLog;
#[derive(Debug, Default)]
pub struct Plugin;

pub trait Repository: Send + Sync {}

pub fn key<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}

pub fn create<T: Default + Send + Sync + 'static>(_: &dyn ObjectGraph) -> Option<Instance> {
    Some(Arc::new(T::default()))
}

pub fn create_other<T: Default + Send + Sync + 'static>(_: &dyn ObjectGraph) -> Option<Instance> {
    Some(Arc::new((T::default(), 0u16)))
}

pub fn forward<I: ?Sized + 'static, C: 'static>(graph: &dyn ObjectGraph) -> Option<Instance> {
    Some(graph.instance(TypeKey::of::<C>()))
}

pub fn create_as<I: ?Sized + 'static, C: Default + Send + Sync + 'static>(
    _: &dyn ObjectGraph,
) -> Option<Instance> {
    Some(Arc::new((C::default(), std::marker::PhantomData::<fn() -> Box<I>>)))
}

/// Arena-allocated binding for `T` depending on `deps`.
pub fn bind<T: Default + Send + Sync + 'static>(deps: &[TypeKey]) -> Entry {
    ConstructibleBinding::new(
        key::<T>(),
        create::<T>,
        deps.iter().copied().collect(),
        Allocation::arena::<T>(),
    )
    .into()
}

/// Same type as [`bind`], different construction function.
pub fn bind_other<T: Default + Send + Sync + 'static>() -> Entry {
    ConstructibleBinding::new(key::<T>(), create_other::<T>, Deps::new(), Allocation::arena::<T>())
        .into()
}

/// `I` bound to its implementation `C`, compressible.
pub fn bind_interface<I: ?Sized + 'static, C: Default + Send + Sync + 'static>(
    c_deps: &[TypeKey],
) -> Vec<Entry> {
    vec![
        ConstructibleBinding::new(
            key::<I>(),
            forward::<I, C>,
            [key::<C>()].into_iter().collect(),
            Allocation::Shared,
        )
        .into(),
        bind::<C>(c_deps),
        CompressedBindingMarker {
            i: key::<I>(),
            c: key::<C>(),
            original_create: forward::<I, C>,
            compressed_create: create_as::<I, C>,
        }
        .into(),
    ]
}

fn collect(elems: Vec<Instance>) -> Instance {
    Arc::new(elems)
}

pub fn contribute<T: Default + Send + Sync + 'static>(deps: &[TypeKey]) -> Entry {
    MultibindingEntry::constructible(
        key::<T>(),
        create::<T>,
        deps.iter().copied().collect(),
        Allocation::arena::<T>(),
        collect,
    )
    .into()
}
