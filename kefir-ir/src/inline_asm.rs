//! Inline-assembly nodes: a template plus the operand bindings that
//! populate it at emission time.

use crate::refs::InstructionRef;

/// How one inline-assembly operand binds to a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InlineAsmBinding {
    /// An input operand reading `value`.
    Input {
        /// Template placeholder name.
        name: String,
        /// Bound value.
        value: InstructionRef,
    },
    /// An output operand producing `value`.
    Output {
        /// Template placeholder name.
        name: String,
        /// The instruction this output operand materializes.
        value: InstructionRef,
    },
    /// A named register clobber. Unknown clobber names are tolerated and
    /// surfaced as [`kefir_diagnostics::KefirError::NotFound`], which
    /// callers may treat as normal control flow (`spec.md` §7).
    Clobber {
        /// The clobbered register name, target-specific.
        register: String,
    },
}

/// One inline-assembly instruction's payload (`spec.md` §3,
/// "`inline_assembly_node`s (template plus operand bindings)").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InlineAssemblyNode {
    /// The target-specific assembly template text, with named placeholders.
    pub template: String,
    /// The operand bindings referenced by the template's placeholders.
    pub bindings: Vec<InlineAsmBinding>,
    /// Whether this block of assembly has side effects beyond its declared
    /// bindings and so must not be treated as pure by GVN/DCE.
    pub has_side_effects: bool,
}
