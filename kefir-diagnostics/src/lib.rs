//! Error kinds, source locations and the bounded thread-local error stack
//! shared across every crate of the kefir optimizer core.
//!
//! This crate has no dependency on the IR or pass machinery; every other
//! crate in the workspace depends on it, the same way every `fuel-vm` crate
//! threads its errors through a single `error` module.

#![warn(missing_docs)]

mod error;
mod location;
mod stack;

pub use error::{
    KefirError,
    KefirResult,
    Severity,
};
pub use location::SourceLocation;
pub use stack::{
    clear_error_stack,
    push_error,
    with_error_stack,
    ErrorStack,
    ERROR_STACK_CAPACITY,
};

/// Re-exports intended for `use kefir_diagnostics::prelude::*;`.
pub mod prelude {
    pub use crate::{
        KefirError,
        KefirResult,
        Severity,
        SourceLocation,
    };
}
