//! The error-kind taxonomy shared by every optimizer crate.
//!
//! Mirrors `fuel_vm::error::InterpreterError`: a single `Display`-derived
//! enum, one variant per category from the error handling design, plus a
//! `category()` accessor used by the error stack to decide whether a new
//! entry should displace an older warning.

use derive_more::Display;

use crate::location::SourceLocation;

/// Coarse bucket an error belongs to, used by [`crate::stack::ErrorStack`]
/// to decide whether a later entry on the same slot should win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// Purely informational; superseded by anything else reported later.
    Normal,
    /// A recoverable concern the driver may choose to continue past.
    Warning,
    /// A hard failure; stops the current pass or pipeline.
    Error,
}

/// All error kinds the optimizer core can raise, per the error handling
/// design (`spec.md` §7).
#[derive(Debug, Clone, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KefirError {
    /// A public operation received a null or otherwise-illegal argument.
    /// Programmer bug; callers should treat this as an abort.
    #[display(fmt = "invalid parameter: {message}")]
    InvalidParameter {
        /// Human-readable description of the offending argument.
        message: String,
    },
    /// The allocator returned failure.
    #[display(fmt = "out of memory")]
    OutOfMemory,
    /// An index (block id, instruction-ref, type index) is outside the
    /// valid range. Programmer bug; callers should treat this as an abort.
    #[display(fmt = "index {index} out of bounds (limit {limit})")]
    OutOfBounds {
        /// The offending index.
        index: usize,
        /// The exclusive upper bound that was violated.
        limit: usize,
    },
    /// A lookup (pass name, function by id, hashtable key) failed. Some
    /// callers treat this as normal control flow and recover from it.
    #[display(fmt = "not found: {what}")]
    NotFound {
        /// What was being looked up.
        what: String,
    },
    /// Construction failed because the stack IR violated its invariants.
    #[display(fmt = "malformed IR: {message}")]
    MalformedIr {
        /// Description of the violated invariant.
        message: String,
        /// Best-effort source location, if the stack IR carried debug
        /// annotations at the point of failure.
        location: Option<SourceLocation>,
    },
    /// An invariant check inside the optimizer failed. Considered a
    /// compiler bug.
    #[display(fmt = "internal error: {message}")]
    Internal {
        /// Description of the violated internal invariant.
        message: String,
    },
    /// A syntax or semantic diagnostic surfaced from the front-end through
    /// the same error stack.
    #[display(fmt = "{location}: {message}")]
    SourceError {
        /// Diagnostic text.
        message: String,
        /// Location the diagnostic refers to.
        location: SourceLocation,
    },
    /// The BigInt kernel was asked to divide by zero.
    #[display(fmt = "division by zero")]
    DivisionByZero,
}

impl KefirError {
    /// Convenience constructor for [`KefirError::InvalidParameter`].
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`KefirError::OutOfBounds`].
    pub fn out_of_bounds(index: usize, limit: usize) -> Self {
        Self::OutOfBounds { index, limit }
    }

    /// Convenience constructor for [`KefirError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Convenience constructor for [`KefirError::MalformedIr`].
    pub fn malformed_ir(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self::MalformedIr {
            message: message.into(),
            location,
        }
    }

    /// Convenience constructor for [`KefirError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The severity bucket this error belongs to.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::NotFound { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// The source location this error is attributable to, if any.
    pub const fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::MalformedIr { location, .. } => location.as_ref(),
            Self::SourceError { location, .. } => Some(location),
            _ => None,
        }
    }
}

impl std::error::Error for KefirError {}

/// Result alias used throughout the optimizer core, mirroring
/// `fuel_vm::error::SimpleResult`.
pub type KefirResult<T> = Result<T, KefirError>;
