//! Components and lazy references to them.
//!
//! A [`Component`] is the ordered list of entries a component function
//! returns. Components reference each other through [`LazyComponent`]s,
//! which stay unexpanded until the engine decides the referenced component
//! actually has to be installed.
//!
//! # Identity
//!
//! Two lazy components are the same installation when they call the same
//! component function (compared by address) and, for the with-args form,
//! pass equal arguments. The engine expands each identity at most once.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{CompressedBindingMarker, Entry};

/// A component function without arguments.
pub type ComponentFn = fn() -> Component;

/// Ordered entries produced by a component function.
///
/// Entries are processed in the order they were added. Installing another
/// component only records a [`LazyComponent`]; nothing is expanded here.
#[derive(Clone, Debug, Default)]
pub struct Component {
    entries: Vec<Entry>,
}

impl Component {
    pub fn new() -> Self {
        Component::default()
    }

    pub fn push(&mut self, entry: impl Into<Entry>) {
        self.entries.push(entry.into());
    }

    /// Append `entry` and return the component, for chaining.
    #[must_use]
    pub fn with(mut self, entry: impl Into<Entry>) -> Self {
        self.push(entry);
        self
    }

    #[must_use]
    pub fn install(self, component: LazyComponent) -> Self {
        self.with(Entry::LazyComponent(component))
    }

    /// Install `replacement` wherever `replaced` would be installed.
    #[must_use]
    pub fn replace(self, replaced: LazyComponent, replacement: LazyComponent) -> Self {
        self.with(ReplacementMapping {
            replaced,
            replacement,
        })
    }

    /// Declare that the binding of `marker.i` may be compressed into
    /// `marker.c`'s construction path.
    #[must_use]
    pub fn compressible(self, marker: CompressedBindingMarker) -> Self {
        self.with(Entry::CompressedBinding(marker))
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl FromIterator<Entry> for Component {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Component {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Component {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Reference to a component function that takes no arguments.
#[derive(Copy, Clone)]
pub struct LazyComponentNoArgs {
    fun: ComponentFn,
    name: &'static str,
}

impl LazyComponentNoArgs {
    pub fn new(name: &'static str, fun: ComponentFn) -> Self {
        LazyComponentNoArgs { fun, name }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn expand(&self) -> Component {
        (self.fun)()
    }

    #[inline]
    fn fun_addr(&self) -> usize {
        self.fun as usize
    }
}

impl PartialEq for LazyComponentNoArgs {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.fun_addr() == other.fun_addr()
    }
}

impl Eq for LazyComponentNoArgs {}

impl Hash for LazyComponentNoArgs {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fun_addr().hash(state);
    }
}

impl fmt::Debug for LazyComponentNoArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name)
    }
}

/// Object-safe view of a component function bound to its arguments.
trait ErasedComponentWithArgs: Send + Sync {
    fn expand(&self) -> Component;
    fn name(&self) -> &'static str;
    fn fun_addr(&self) -> usize;
    fn args(&self) -> &dyn Any;
    fn args_eq(&self, other: &dyn Any) -> bool;
    fn hash_args(&self, state: &mut dyn Hasher);
    fn fmt_args(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

struct BoundComponent<A> {
    fun: fn(A) -> Component,
    args: A,
    name: &'static str,
}

impl<A> ErasedComponentWithArgs for BoundComponent<A>
where
    A: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn expand(&self) -> Component {
        (self.fun)(self.args.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn fun_addr(&self) -> usize {
        self.fun as usize
    }

    fn args(&self) -> &dyn Any {
        &self.args
    }

    fn args_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<A>().is_some_and(|args| *args == self.args)
    }

    fn hash_args(&self, mut state: &mut dyn Hasher) {
        self.args.hash(&mut state);
    }

    fn fmt_args(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.args, f)
    }
}

/// Reference to a component function together with the arguments to call it
/// with.
///
/// Multiple arguments are passed as a tuple. Arguments are cloned on every
/// expansion.
#[derive(Clone)]
pub struct LazyComponentWithArgs(Arc<dyn ErasedComponentWithArgs>);

impl LazyComponentWithArgs {
    pub fn new<A>(name: &'static str, fun: fn(A) -> Component, args: A) -> Self
    where
        A: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    {
        LazyComponentWithArgs(Arc::new(BoundComponent { fun, args, name }))
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    pub fn expand(&self) -> Component {
        self.0.expand()
    }
}

impl PartialEq for LazyComponentWithArgs {
    fn eq(&self, other: &Self) -> bool {
        self.0.fun_addr() == other.0.fun_addr() && self.0.args_eq(other.0.args())
    }
}

impl Eq for LazyComponentWithArgs {}

impl Hash for LazyComponentWithArgs {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.fun_addr().hash(state);
        self.0.hash_args(state);
    }
}

impl fmt::Debug for LazyComponentWithArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.0.name())?;
        self.0.fmt_args(f)?;
        f.write_str(")")
    }
}

/// An unexpanded installation of a component.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum LazyComponent {
    NoArgs(LazyComponentNoArgs),
    WithArgs(LazyComponentWithArgs),
}

impl LazyComponent {
    pub fn no_args(name: &'static str, fun: ComponentFn) -> Self {
        LazyComponent::NoArgs(LazyComponentNoArgs::new(name, fun))
    }

    pub fn with_args<A>(name: &'static str, fun: fn(A) -> Component, args: A) -> Self
    where
        A: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    {
        LazyComponent::WithArgs(LazyComponentWithArgs::new(name, fun, args))
    }

    pub fn name(&self) -> &'static str {
        match self {
            LazyComponent::NoArgs(c) => c.name(),
            LazyComponent::WithArgs(c) => c.name(),
        }
    }

    /// Call the component function.
    pub fn expand(&self) -> Component {
        match self {
            LazyComponent::NoArgs(c) => c.expand(),
            LazyComponent::WithArgs(c) => c.expand(),
        }
    }
}

impl fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyComponent::NoArgs(c) => fmt::Debug::fmt(c, f),
            LazyComponent::WithArgs(c) => fmt::Debug::fmt(c, f),
        }
    }
}

impl fmt::Display for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Install `replacement` wherever `replaced` would be installed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplacementMapping {
    pub replaced: LazyComponent,
    pub replacement: LazyComponent,
}

/// Build a [`LazyComponent`] named after the component function path.
///
/// ```text
/// lazy_component!(engine_component)            // no arguments
/// lazy_component!(wheel_component, 4)          // one argument
/// lazy_component!(car_component, (4, "red"))   // several, as a tuple
/// ```
#[macro_export]
macro_rules! lazy_component {
    ($fun:path) => {
        $crate::LazyComponent::no_args(stringify!($fun), $fun)
    };
    ($fun:path, $args:expr) => {
        $crate::LazyComponent::with_args(stringify!($fun), $fun, $args)
    };
}
