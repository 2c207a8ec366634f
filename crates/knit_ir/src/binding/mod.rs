//! Single bindings: the rule for supplying the one instance of a type.
//!
//! A binding is either [`ConstructedBinding`] (the instance already exists)
//! or [`ConstructibleBinding`] (the injector calls a construction function
//! once every dependency has been built).

use std::alloc::Layout;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::TypeKey;

/// A constructed object, type-erased.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Dependencies of a construction function, in declaration order.
pub type Deps = SmallVec<[TypeKey; 4]>;

/// Builds an object from an injector that already holds its dependencies.
///
/// Returning `None` violates the construction contract; see
/// [`ConstructibleBinding::construct`].
pub type CreateFn = fn(&dyn ObjectGraph) -> Option<Instance>;

/// Read access to the objects an injector has already built.
///
/// Implemented by the injector. A construction function may only ask for
/// types listed in its binding's dependencies, and the injector must have
/// built those before calling it.
pub trait ObjectGraph {
    /// The instance bound to `ty`.
    fn instance(&self, ty: TypeKey) -> Instance;
}

/// Where the object produced by a binding lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Allocation {
    /// Needs a slot in the injector's pre-sized arena.
    Arena(Layout),
    /// The construction function allocates the object itself. The injector
    /// only tracks it for teardown.
    External,
    /// No new object: the binding hands out an object owned by another
    /// binding (e.g. an interface bound to its implementation).
    Shared,
}

impl Allocation {
    /// Arena slot sized for `T`.
    #[inline]
    pub fn arena<T>() -> Self {
        Allocation::Arena(Layout::new::<T>())
    }

    #[inline]
    pub fn needs_heap_slot(self) -> bool {
        matches!(self, Allocation::Arena(_))
    }
}

/// Construction functions are compared by address.
#[inline]
pub(crate) fn create_addr(create: CreateFn) -> usize {
    create as usize
}

/// Binding to an instance that exists before the injector does.
///
/// The engine never constructs or drops the instance; it only hands out the
/// shared pointer.
#[derive(Clone)]
pub struct ConstructedBinding {
    pub ty: TypeKey,
    pub instance: Instance,
}

impl ConstructedBinding {
    pub fn new(ty: TypeKey, instance: Instance) -> Self {
        ConstructedBinding { ty, instance }
    }

    /// Same type, same instance.
    pub fn is_equivalent(&self, other: &ConstructedBinding) -> bool {
        self.ty == other.ty && Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl PartialEq for ConstructedBinding {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent(other)
    }
}

impl fmt::Debug for ConstructedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructedBinding")
            .field("ty", &self.ty)
            .field("instance", &Arc::as_ptr(&self.instance).cast::<()>())
            .finish()
    }
}

/// Binding to an object the injector must construct.
#[derive(Clone)]
pub struct ConstructibleBinding {
    pub ty: TypeKey,
    pub create: CreateFn,
    pub deps: Deps,
    pub allocation: Allocation,
}

impl ConstructibleBinding {
    pub fn new(ty: TypeKey, create: CreateFn, deps: Deps, allocation: Allocation) -> Self {
        ConstructibleBinding {
            ty,
            create,
            deps,
            allocation,
        }
    }

    /// Two bindings for the same type are interchangeable when they run the
    /// same construction function with the same allocation. Dependencies
    /// follow from the function and are not compared.
    pub fn is_equivalent(&self, other: &ConstructibleBinding) -> bool {
        self.ty == other.ty
            && create_addr(self.create) == create_addr(other.create)
            && self.allocation == other.allocation
    }

    #[inline]
    pub fn uses(&self, create: CreateFn) -> bool {
        create_addr(self.create) == create_addr(create)
    }

    /// Run the construction function.
    ///
    /// # Panics
    ///
    /// Panics with [`NullConstructedInstance`] if the construction function
    /// returns `None`. That is a bug in the caller-supplied function, not a
    /// condition the injector can recover from.
    pub fn construct(&self, graph: &dyn ObjectGraph) -> Instance {
        match (self.create)(graph) {
            Some(instance) => instance,
            None => panic!("{}", NullConstructedInstance { ty: self.ty }),
        }
    }
}

impl PartialEq for ConstructibleBinding {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent(other) && self.deps == other.deps
    }
}

impl fmt::Debug for ConstructibleBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructibleBinding")
            .field("ty", &self.ty)
            .field("create", &format_args!("{:#x}", create_addr(self.create)))
            .field("deps", &self.deps)
            .field("allocation", &self.allocation)
            .finish()
    }
}

/// The single binding chosen for a type.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    Constructed(ConstructedBinding),
    Constructible(ConstructibleBinding),
}

impl Binding {
    #[inline]
    pub fn ty(&self) -> TypeKey {
        match self {
            Binding::Constructed(b) => b.ty,
            Binding::Constructible(b) => b.ty,
        }
    }

    /// Whether declaring `other` after `self` is a harmless duplicate.
    pub fn is_equivalent(&self, other: &Binding) -> bool {
        match (self, other) {
            (Binding::Constructed(a), Binding::Constructed(b)) => a.is_equivalent(b),
            (Binding::Constructible(a), Binding::Constructible(b)) => a.is_equivalent(b),
            _ => false,
        }
    }

    /// Types that must be constructed before this one. Empty for
    /// constructed bindings.
    pub fn deps(&self) -> &[TypeKey] {
        match self {
            Binding::Constructed(_) => &[],
            Binding::Constructible(b) => &b.deps,
        }
    }

    /// Allocation needed by the injector, `None` for constructed bindings.
    pub fn allocation(&self) -> Option<Allocation> {
        match self {
            Binding::Constructed(_) => None,
            Binding::Constructible(b) => Some(b.allocation),
        }
    }

    pub fn as_constructible(&self) -> Option<&ConstructibleBinding> {
        match self {
            Binding::Constructible(b) => Some(b),
            Binding::Constructed(_) => None,
        }
    }
}

impl From<ConstructedBinding> for Binding {
    fn from(b: ConstructedBinding) -> Self {
        Binding::Constructed(b)
    }
}

impl From<ConstructibleBinding> for Binding {
    fn from(b: ConstructibleBinding) -> Self {
        Binding::Constructible(b)
    }
}

/// Marks `i → c` as a candidate for binding compression.
///
/// Emitted next to the binding of `i` when `i` is bound to its
/// implementation `c`. `original_create` is the construction function of
/// `i`'s uncompressed binding (fetch `c`, hand it out as `i`);
/// `compressed_create` builds `c` directly and hands it out as `i`.
#[derive(Copy, Clone)]
pub struct CompressedBindingMarker {
    pub i: TypeKey,
    pub c: TypeKey,
    pub original_create: CreateFn,
    pub compressed_create: CreateFn,
}

impl fmt::Debug for CompressedBindingMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedBindingMarker")
            .field("i", &self.i)
            .field("c", &self.c)
            .field(
                "original_create",
                &format_args!("{:#x}", create_addr(self.original_create)),
            )
            .field(
                "compressed_create",
                &format_args!("{:#x}", create_addr(self.compressed_create)),
            )
            .finish()
    }
}

/// A construction function returned no object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("construction function for `{ty}` returned no instance")]
pub struct NullConstructedInstance {
    pub ty: TypeKey,
}

#[cfg(test)]
mod tests;
