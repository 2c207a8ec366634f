//! Factory functions for normalization unit tests.
//!
//! Construction functions are generic over the type they build, so each
//! type gets its own function address. Tests that need two different
//! bindings for the same type use [`create`] and [`create_alt`].

use std::sync::Arc;

use knit_ir::{
    Allocation, CompressedBindingMarker, ConstructedBinding, ConstructibleBinding, Deps, Entry,
    Instance, MultibindingEntry, ObjectGraph, TypeKey,
};

#[derive(Default)]
pub(crate) struct A;
#[derive(Default)]
pub(crate) struct B;
#[derive(Default)]
pub(crate) struct C;
#[derive(Default)]
pub(crate) struct D;
#[derive(Default)]
pub(crate) struct Listener;

/// Interface side of a compressible pair.
pub(crate) struct Iface;
/// Implementation side of a compressible pair.
#[derive(Default)]
pub(crate) struct Impl;

pub(crate) fn key<T: ?Sized + 'static>() -> TypeKey {
    TypeKey::of::<T>()
}

pub(crate) fn create<T: Default + Send + Sync + 'static>(_: &dyn ObjectGraph) -> Option<Instance> {
    Some(Arc::new(T::default()))
}

pub(crate) fn create_alt<T: Default + Send + Sync + 'static>(
    _: &dyn ObjectGraph,
) -> Option<Instance> {
    Some(Arc::new((T::default(), 1u8)))
}

/// Hand out the object bound to `C` as `I`.
pub(crate) fn forward<I: ?Sized + 'static, C: 'static>(graph: &dyn ObjectGraph) -> Option<Instance> {
    Some(graph.instance(TypeKey::of::<C>()))
}

/// Build `C` directly and hand it out as `I`.
pub(crate) fn create_as<I: ?Sized + 'static, C: Default + Send + Sync + 'static>(
    _: &dyn ObjectGraph,
) -> Option<Instance> {
    Some(Arc::new((C::default(), std::marker::PhantomData::<fn() -> Box<I>>)))
}

pub(crate) fn deps(tys: &[TypeKey]) -> Deps {
    tys.iter().copied().collect()
}

/// Arena-allocated binding for `T` built with [`create`].
pub(crate) fn constructible<T: Default + Send + Sync + 'static>(on: &[TypeKey]) -> ConstructibleBinding {
    ConstructibleBinding::new(key::<T>(), create::<T>, deps(on), Allocation::arena::<T>())
}

/// Like [`constructible`] but with a different construction function.
pub(crate) fn constructible_alt<T: Default + Send + Sync + 'static>() -> ConstructibleBinding {
    ConstructibleBinding::new(key::<T>(), create_alt::<T>, Deps::new(), Allocation::arena::<T>())
}

pub(crate) fn constructed<T: ?Sized + 'static>(instance: &Instance) -> ConstructedBinding {
    ConstructedBinding::new(key::<T>(), Arc::clone(instance))
}

/// `I` bound to `C` through [`forward`].
pub(crate) fn interface<I: ?Sized + 'static, C: 'static>() -> ConstructibleBinding {
    ConstructibleBinding::new(
        key::<I>(),
        forward::<I, C>,
        deps(&[key::<C>()]),
        Allocation::Shared,
    )
}

pub(crate) fn marker<I: ?Sized + 'static, C: Default + Send + Sync + 'static>(
) -> CompressedBindingMarker {
    CompressedBindingMarker {
        i: key::<I>(),
        c: key::<C>(),
        original_create: forward::<I, C>,
        compressed_create: create_as::<I, C>,
    }
}

/// Entries for `I` bound to `C`, compressible: the interface binding, the
/// implementation binding with `c_deps`, and the marker.
pub(crate) fn bind_interface<I: ?Sized + 'static, C: Default + Send + Sync + 'static>(
    c_deps: &[TypeKey],
) -> Vec<Entry> {
    vec![
        interface::<I, C>().into(),
        constructible::<C>(c_deps).into(),
        marker::<I, C>().into(),
    ]
}

fn collect(elems: Vec<Instance>) -> Instance {
    Arc::new(elems)
}

pub(crate) fn multibinding<T: Default + Send + Sync + 'static>(on: &[TypeKey]) -> Entry {
    MultibindingEntry::constructible(
        key::<T>(),
        create::<T>,
        deps(on),
        Allocation::arena::<T>(),
        collect,
    )
    .into()
}
