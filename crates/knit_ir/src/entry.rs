//! The tagged entry record the engine consumes.

use crate::{
    Binding, CompressedBindingMarker, ConstructedBinding, ConstructibleBinding, LazyComponent,
    MultibindingEntry, ReplacementMapping,
};

/// One unit of binding information.
#[derive(Clone, Debug)]
pub enum Entry {
    /// Binding to an existing instance.
    Constructed(ConstructedBinding),
    /// Binding to an object the injector constructs.
    Constructible(ConstructibleBinding),
    /// The binding of `i` may be collapsed into `c`'s construction path.
    CompressedBinding(CompressedBindingMarker),
    /// One multibinding contribution and its collection builder.
    Multibinding(MultibindingEntry),
    /// A component to install, not expanded yet.
    LazyComponent(LazyComponent),
    /// Everything the component installed has been processed. Only the
    /// engine creates these.
    ComponentEnd(LazyComponent),
    /// Install one component in place of another.
    Replacement(ReplacementMapping),
}

impl Entry {
    /// Short variant name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Constructed(_) => "constructed",
            Entry::Constructible(_) => "constructible",
            Entry::CompressedBinding(_) => "compressed-binding",
            Entry::Multibinding(_) => "multibinding",
            Entry::LazyComponent(_) => "lazy-component",
            Entry::ComponentEnd(_) => "component-end",
            Entry::Replacement(_) => "replacement",
        }
    }
}

impl From<Binding> for Entry {
    fn from(binding: Binding) -> Self {
        match binding {
            Binding::Constructed(b) => Entry::Constructed(b),
            Binding::Constructible(b) => Entry::Constructible(b),
        }
    }
}

impl From<ConstructedBinding> for Entry {
    fn from(b: ConstructedBinding) -> Self {
        Entry::Constructed(b)
    }
}

impl From<ConstructibleBinding> for Entry {
    fn from(b: ConstructibleBinding) -> Self {
        Entry::Constructible(b)
    }
}

impl From<CompressedBindingMarker> for Entry {
    fn from(marker: CompressedBindingMarker) -> Self {
        Entry::CompressedBinding(marker)
    }
}

impl From<MultibindingEntry> for Entry {
    fn from(m: MultibindingEntry) -> Self {
        Entry::Multibinding(m)
    }
}

impl From<LazyComponent> for Entry {
    fn from(c: LazyComponent) -> Self {
        Entry::LazyComponent(c)
    }
}

impl From<ReplacementMapping> for Entry {
    fn from(r: ReplacementMapping) -> Self {
        Entry::Replacement(r)
    }
}
