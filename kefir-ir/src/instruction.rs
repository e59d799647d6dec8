//! A single instruction record and its operand data.

use crate::{
    opcode::{
        CompareKind,
        Opcode,
    },
    refs::{
        BigIntConstId,
        BlockId,
        CallNodeId,
        InlineAsmId,
        InstructionRef,
        LocalIndex,
        PhiId,
        SwitchTableId,
        TypeId,
    },
};

/// Operand data for an instruction, encoded uniformly per the common shapes
/// named in `spec.md` §9 ("common operand patterns... encoded uniformly"):
/// a small fixed arity of refs, a ref plus a type-id, or a ref plus an
/// immediate. Shapes that need more than this (switch tables, inline
/// assembly bindings, call argument lists) hold an out-of-line id into a
/// pool owned by the [`crate::container::CodeContainer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandData {
    /// No operands: nullary constants, `Undefined`, `Unreachable`,
    /// `ReturnVoid`, `Fence`.
    None,
    /// One instruction-ref operand.
    Unary(InstructionRef),
    /// Two instruction-ref operands.
    Binary(InstructionRef, InstructionRef),
    /// Three instruction-ref operands (e.g. `Select`'s condition/true/false,
    /// `AtomicCompareExchange`'s address/expected/desired).
    Ternary(InstructionRef, InstructionRef, InstructionRef),
    /// A ref plus a type-id, e.g. a cast's source value and target type.
    RefWithType(InstructionRef, TypeId),
    /// A ref plus a native 64-bit immediate, e.g. `x + imm` forms produced
    /// by constant-collapse rewrites.
    RefWithImmediate(InstructionRef, i64),
    /// A narrow integer constant (8/16/32/64-bit), canonical per `spec.md`
    /// §3 invariant 6.
    IntConst(i64),
    /// A 32-bit float constant, stored as bits to keep `Eq`/`Hash`.
    Float32Const(u32),
    /// A 64-bit float constant, stored as bits to keep `Eq`/`Hash`.
    Float64Const(u64),
    /// A wide `_BitInt` constant, referencing a digit sequence held in the
    /// function's bigint-constant pool.
    BigIntConst(BigIntConstId),
    /// A type-only operand, used by `Undefined` to carry the type of the
    /// undefined value produced.
    TypeOnly(TypeId),
    /// A local-variable ordinal, e.g. `LocalAddr`'s operand identifying
    /// which slot of the locals type it addresses.
    Local(LocalIndex),
    /// A pair of values plus the comparison kind, used both by a
    /// standalone `Compare` and by the fused `BranchCompare` terminator
    /// (`spec.md` §4.3, "compare-branch fuse").
    Compare(InstructionRef, InstructionRef, CompareKind),
    /// An unconditional jump.
    Jump(BlockId),
    /// `branch-nonzero(cond), if_true, if_false`.
    Branch {
        /// The tested value.
        condition: InstructionRef,
        /// Successor taken when `condition` is nonzero (or, for
        /// `BranchZero`, when it is zero).
        if_true: BlockId,
        /// The other successor.
        if_false: BlockId,
    },
    /// The fused comparison-branch produced by compare-branch fuse.
    BranchCompare {
        /// Left comparison operand.
        lhs: InstructionRef,
        /// Right comparison operand.
        rhs: InstructionRef,
        /// The comparison kind.
        compare: CompareKind,
        /// Successor taken when the comparison holds.
        if_true: BlockId,
        /// The other successor.
        if_false: BlockId,
    },
    /// A multi-way branch.
    Switch {
        /// The value being switched on.
        value: InstructionRef,
        /// The case table.
        table: SwitchTableId,
        /// The default successor.
        default: BlockId,
    },
    /// Returns a value.
    Return(InstructionRef),
    /// A direct or indirect call, or its tail-call variant.
    Call(CallNodeId),
    /// Inline assembly.
    InlineAssembly(InlineAsmId),
    /// Reads the merged value of a block input, i.e. the phi this
    /// instruction implements (`spec.md` GLOSSARY, "Block input").
    BlockInput(PhiId),
    /// Reads the `index`-th parameter of the owning function. Parameters
    /// are "separate entities" from the entry block's symbolic stack
    /// (`spec.md` §4.2, step 2), materialized as this opcode so later
    /// uses address them the same way as any other value.
    Argument(u32),
}

/// One instruction in a function's [`crate::container::CodeContainer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// The operation.
    pub opcode: Opcode,
    /// Operand data, shaped per [`OperandData`].
    pub operands: OperandData,
    /// The block that produced this instruction.
    pub block: BlockId,
    /// Position of this instruction within its block's production order;
    /// used to answer dominance-of-use queries without an extra pass
    /// (`spec.md` §3, "producing-opcode sequence position").
    pub sequence: u32,
}

impl Instruction {
    /// A tombstone placeholder for a reclaimed slot.
    pub fn tombstone() -> Self {
        Self {
            opcode: Opcode::Tombstone,
            operands: OperandData::None,
            block: BlockId::new(0),
            sequence: 0,
        }
    }

    /// Whether this slot is a removed instruction (`spec.md` §3, "a
    /// free-list of reclaimable instruction-refs").
    pub fn is_tombstone(&self) -> bool {
        matches!(self.opcode, Opcode::Tombstone)
    }

    /// The instruction-refs this instruction reads, in operand order. Does
    /// not look inside out-of-line pools (call arguments, switch tables,
    /// inline-assembly bindings) — callers needing those consult the
    /// relevant pool directly via the operand's id.
    pub fn operand_refs(&self) -> smallvec::SmallVec<[InstructionRef; 3]> {
        use OperandData::*;
        let mut refs = smallvec::SmallVec::new();
        match &self.operands {
            None | IntConst(_) | Float32Const(_) | Float64Const(_) | BigIntConst(_)
            | TypeOnly(_) | Local(_) | Jump(_) | Call(_) | InlineAssembly(_) | BlockInput(_)
            | Argument(_) => {}
            Switch { value, .. } => refs.push(*value),
            Unary(a) | RefWithType(a, _) | RefWithImmediate(a, _) | Return(a) => refs.push(*a),
            Binary(a, b) | Compare(a, b, _) => {
                refs.push(*a);
                refs.push(*b);
            }
            Ternary(a, b, c) => {
                refs.push(*a);
                refs.push(*b);
                refs.push(*c);
            }
            Branch { condition, .. } => refs.push(*condition),
            BranchCompare { lhs, rhs, .. } => {
                refs.push(*lhs);
                refs.push(*rhs);
            }
        }
        refs
    }

    /// Rewrite every instruction-ref operand in place through `f`, used by
    /// passes that eliminate an instruction and must redirect its former
    /// users to a replacement value (`spec.md` §4.3).
    pub fn map_refs(&mut self, mut f: impl FnMut(InstructionRef) -> InstructionRef) {
        use OperandData::*;
        match &mut self.operands {
            None | IntConst(_) | Float32Const(_) | Float64Const(_) | BigIntConst(_)
            | TypeOnly(_) | Local(_) | Jump(_) | Call(_) | InlineAssembly(_) | BlockInput(_)
            | Argument(_) => {}
            Switch { value, .. } => *value = f(*value),
            Unary(a) | RefWithType(a, _) | RefWithImmediate(a, _) | Return(a) => *a = f(*a),
            Binary(a, b) => {
                *a = f(*a);
                *b = f(*b);
            }
            Compare(a, b, _) => {
                *a = f(*a);
                *b = f(*b);
            }
            Ternary(a, b, c) => {
                *a = f(*a);
                *b = f(*b);
                *c = f(*c);
            }
            Branch { condition, .. } => *condition = f(*condition),
            BranchCompare { lhs, rhs, .. } => {
                *lhs = f(*lhs);
                *rhs = f(*rhs);
            }
        }
    }
}
