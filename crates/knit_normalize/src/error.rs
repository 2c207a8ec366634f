//! Errors that abort a normalization call.
//!
//! Every variant is fatal: the call returns no partial result and retrying
//! with the same entries fails the same way. Messages name the types and
//! components involved; presenting them to a user is the front-end's job.

use std::fmt::Write;

use knit_ir::{LazyComponent, TypeKey};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    /// Two different bindings were declared for the same type.
    #[error("conflicting bindings for type `{ty}`")]
    ConflictingBinding { ty: TypeKey },

    /// A lazy component transitively installs itself.
    ///
    /// `chain` lists the components being expanded, outermost first, and
    /// ends with the component that was installed again. The loop starts at
    /// `chain[loop_start]`.
    #[error("component installation cycle:\n{}", cycle_trace(.chain, .loop_start))]
    InstallationCycle {
        chain: Vec<LazyComponent>,
        loop_start: usize,
    },

    /// The same component was given two different replacements.
    #[error(
        "component `{replaced}` is replaced with `{registered}`, cannot also replace it with `{rejected}`"
    )]
    ConflictingReplacement {
        replaced: LazyComponent,
        registered: LazyComponent,
        rejected: LazyComponent,
    },

    /// A replacement was declared after its target had started expanding.
    #[error("cannot replace component `{replaced}` with `{replacement}`: it was already installed")]
    LateReplacement {
        replaced: LazyComponent,
        replacement: LazyComponent,
    },
}

fn cycle_trace(chain: &[LazyComponent], loop_start: &usize) -> String {
    let mut out = String::new();
    for (idx, component) in chain.iter().enumerate() {
        if idx == *loop_start {
            out.push_str("<-- the loop starts here\n");
        }
        let _ = writeln!(out, "{component}");
    }
    out
}
