//! Out-of-line case tables for the `Switch` terminator.

use crate::refs::BlockId;

/// The case list of a `Switch` terminator, held out-of-line since its
/// arity is unbounded (`spec.md` §9, "variable arity... stored out-of-line").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchTable {
    /// `(case value, target block)` pairs. Case values are matched against
    /// the switched-on value's canonical narrow-int representation.
    pub cases: Vec<(i64, BlockId)>,
}

impl SwitchTable {
    /// Construct a switch table from its case list.
    pub fn new(cases: Vec<(i64, BlockId)>) -> Self {
        Self { cases }
    }

    /// The target block for `value`, if any case matches.
    pub fn target_for(&self, value: i64) -> Option<BlockId> {
        self.cases
            .iter()
            .find(|(case, _)| *case == value)
            .map(|(_, target)| *target)
    }
}
