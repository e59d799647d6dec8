//! Call nodes: out-of-line argument lists for `Call`/`CallIndirect`/tail
//! calls, and inline-assembly template bindings.

use crate::refs::{
    FunctionId,
    InstructionRef,
    TypeId,
};

/// What is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Callee {
    /// A direct call to a known function in the module.
    Direct(FunctionId),
    /// An indirect call through a function-pointer value.
    Indirect(InstructionRef),
}

/// One call site: the callee plus its argument instruction-refs (`spec.md`
/// §3, "`call_node`s (carrying argument instruction-refs plus callee
/// reference)").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallNode {
    /// What is being called.
    pub callee: Callee,
    /// Argument values, in declaration order.
    pub arguments: Vec<InstructionRef>,
    /// The callee's signature type, used to validate tail-call ABI
    /// compatibility (`spec.md` §4.3, "tail-call marking").
    pub signature: TypeId,
    /// Whether the callee may return more than once (`setjmp`-like),
    /// disqualifying tail-call marking (`spec.md` §4.3).
    pub returns_twice: bool,
    /// Whether this call has been marked as a tail call by the tail-call
    /// marking pass.
    pub is_tail_call: bool,
}

impl CallNode {
    /// Construct a non-tail call node.
    pub fn new(callee: Callee, arguments: Vec<InstructionRef>, signature: TypeId) -> Self {
        Self {
            callee,
            arguments,
            signature,
            returns_twice: false,
            is_tail_call: false,
        }
    }
}
