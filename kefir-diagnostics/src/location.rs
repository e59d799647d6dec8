//! Source-location handles shared by the front-end and every optimizer pass.

use std::{
    fmt,
    sync::Arc,
};

/// A file/line/column triple.
///
/// Source locations are produced by the front-end and threaded through the
/// optimizer unchanged; the optimizer never constructs one from scratch
/// except for synthetic instructions, which inherit the active debug cursor
/// (see `kefir_ir::debug::Cursor`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceLocation {
    /// Source file path as reported by the front-end; interned by the
    /// caller, not by this crate.
    pub file: Arc<str>,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl SourceLocation {
    /// Construct a new location.
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// A placeholder location used for instructions with no known origin
    /// (e.g. the implicit preamble of a constructed function).
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
