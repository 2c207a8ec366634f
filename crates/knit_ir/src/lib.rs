//! Entry model for the knit binding engine.
//!
//! A component is an ordered list of [`Entry`] records. Each record is one
//! unit of binding information: a binding for a type, a multibinding
//! contribution, a hint that a binding may be compressed, a lazy reference to
//! another component, or a component replacement.
//!
//! # Pipeline Position
//!
//! ```text
//! Front-end builder → **Entries** → knit_normalize → Injector
//! ```
//!
//! This crate only describes bindings. Flattening them into a normalized
//! object graph lives in `knit_normalize`; building objects is the injector's
//! job, and the contract it must honour is [`ObjectGraph`].
//!
//! # Identity
//!
//! - Types are identified by [`TypeKey`] (a `std::any::TypeId` plus the type
//!   name for diagnostics).
//! - Constructed bindings compare by instance pointer.
//! - Constructible bindings compare by construction function.
//! - Lazy components compare by component function, plus argument values for
//!   the with-args form.

mod binding;
mod component;
mod entry;
mod layout;
mod multibinding;
mod type_key;

pub use binding::{
    Allocation, Binding, CompressedBindingMarker, ConstructedBinding, ConstructibleBinding,
    CreateFn, Deps, Instance, NullConstructedInstance, ObjectGraph,
};
pub use component::{
    Component, ComponentFn, LazyComponent, LazyComponentNoArgs, LazyComponentWithArgs,
    ReplacementMapping,
};
pub use entry::Entry;
pub use layout::AllocatorLayout;
pub use multibinding::{MultibindingContribution, MultibindingEntry, VectorBuilderFn};
pub use type_key::TypeKey;
