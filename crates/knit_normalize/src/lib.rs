//! Binding normalization for the knit dependency-injection engine.
//!
//! Takes the entries of a component tree and flattens them into one
//! consistent object graph an injector can instantiate:
//!
//! - **Expansion**: every distinct lazy component is expanded exactly once,
//!   with an explicit worklist instead of recursion. Re-entering a component
//!   that is still being expanded is an [installation cycle].
//! - **Deduplication**: at most one binding per type. Identical repeats are
//!   dropped, different ones are a [conflict]. Multibinding contributions
//!   accumulate instead.
//! - **Replacement**: a component can be swapped for another wherever it
//!   would be installed, as long as the swap is declared before the
//!   component starts expanding.
//! - **Compression**: an interface bound to an implementation that nothing
//!   else needs is merged into the implementation's binding, either
//!   permanently or with enough information to undo it later
//!   ([`CompressionMode`]).
//! - **Layout**: the size of the injector's object arena is accumulated
//!   as bindings are chosen ([`knit_ir::AllocatorLayout`]).
//!
//! # Standalone and layered
//!
//! [`normalize()`] starts from nothing. [`normalize_layered`] adds entries on
//! top of an already normalized base, read-only, through the
//! [`NormalizedBase`] trait; the base can be shared between any number of
//! layers and threads.
//!
//! # Tracing
//!
//! Call [`init_tracing`] and set `RUST_LOG=knit_normalize=debug` (or
//! `trace` for per-component events).
//!
//! [installation cycle]: NormalizationError::InstallationCycle
//! [conflict]: NormalizationError::ConflictingBinding

mod compress;
mod context;
mod error;
mod lookup;
mod normalize;
mod sets;
mod storage;
mod traverse;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use compress::CompressionUndo;
pub use error::NormalizationError;
pub use lookup::{BaseBinding, BindingLookup, NoBase, NormalizedBase};
pub use normalize::{
    normalize, normalize_layered, normalize_with_permanent_compression,
    normalize_with_undoable_compression, CompressionMode,
};
pub use storage::{LayeredStorage, NormalizedComponentStorage, NormalizedMultibindingSet};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber for debug output.
///
/// Does nothing unless `RUST_LOG` is set. Safe to call more than once; a
/// subscriber installed elsewhere is left in place.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
