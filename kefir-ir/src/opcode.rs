//! The optimizer opcode tag.
//!
//! The teacher crate (`fuel_asm`) generates its `Opcode`/`Instruction` pair
//! from a single macro table so that every instruction's docstring, byte
//! value and operand layout live in one place (`impl_instructions!`). The
//! optimizer's instruction set is shaped differently — operands live
//! out-of-line in [`crate::instruction::Instruction`] rather than embedded
//! in the enum — so `opcodes!` here generates just the tag plus the
//! classification predicates every pass relies on (terminator, pure,
//! commutative, constant), following the same "one source of truth, several
//! derived facts" shape.

/// The relational predicate a fused compare-branch (or a standalone
/// comparison) carries, mirroring the list in `spec.md` §4.3
/// ("compare-branch fuse").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareKind {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// Signed `<`
    SignedLess,
    /// Signed `>`
    SignedGreater,
    /// Signed `<=`
    SignedLessEqual,
    /// Signed `>=`
    SignedGreaterEqual,
    /// Unsigned `<`
    UnsignedBelow,
    /// Unsigned `>`
    UnsignedAbove,
    /// Unsigned `<=`
    UnsignedBelowEqual,
    /// Unsigned `>=`
    UnsignedAboveEqual,
    /// Floating-point ordered `<`
    FloatOrderedLess,
    /// Floating-point ordered `>`
    FloatOrderedGreater,
    /// Floating-point unordered `<`
    FloatUnorderedLess,
    /// Floating-point unordered `>`
    FloatUnorderedGreater,
}

impl CompareKind {
    /// The predicate obtained by logical negation, used by operation
    /// simplification's `!(a<b)` → `a>=b` normalization (`spec.md` §4.3).
    pub const fn negate(self) -> Self {
        use CompareKind::*;
        match self {
            Equal => NotEqual,
            NotEqual => Equal,
            SignedLess => SignedGreaterEqual,
            SignedGreaterEqual => SignedLess,
            SignedGreater => SignedLessEqual,
            SignedLessEqual => SignedGreater,
            UnsignedBelow => UnsignedAboveEqual,
            UnsignedAboveEqual => UnsignedBelow,
            UnsignedAbove => UnsignedBelowEqual,
            UnsignedBelowEqual => UnsignedAbove,
            FloatOrderedLess => FloatUnorderedGreater,
            FloatUnorderedGreater => FloatOrderedLess,
            FloatOrderedGreater => FloatUnorderedLess,
            FloatUnorderedLess => FloatOrderedGreater,
        }
    }

    /// The predicate obtained by swapping operand order, used when a pass
    /// canonicalizes commutative comparisons.
    pub const fn swapped(self) -> Self {
        use CompareKind::*;
        match self {
            SignedLess => SignedGreater,
            SignedGreater => SignedLess,
            SignedLessEqual => SignedGreaterEqual,
            SignedGreaterEqual => SignedLessEqual,
            UnsignedBelow => UnsignedAbove,
            UnsignedAbove => UnsignedBelow,
            UnsignedBelowEqual => UnsignedAboveEqual,
            UnsignedAboveEqual => UnsignedBelowEqual,
            FloatOrderedLess => FloatOrderedGreater,
            FloatOrderedGreater => FloatOrderedLess,
            FloatUnorderedLess => FloatUnorderedGreater,
            FloatUnorderedGreater => FloatUnorderedLess,
            other => other,
        }
    }
}

macro_rules! opcodes {
    (
        constants: [$($konst:ident),* $(,)?],
        pure_arith: [$($arith:ident),* $(,)?],
        pure_other: [$($other:ident),* $(,)?],
        commutative: [$($comm:ident),* $(,)?],
        memory: [$($mem:ident),* $(,)?],
        control: [$($ctrl:ident),* $(,)?],
        terminators: [$($term:ident),* $(,)?],
    ) => {
        /// The instruction's operation, discriminant-only; operand data
        /// lives in the owning [`crate::instruction::Instruction`]
        /// (`spec.md` §9, "Sum-typed opcodes").
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[non_exhaustive]
        pub enum Opcode {
            $(#[allow(missing_docs)] $konst,)*
            $(#[allow(missing_docs)] $arith,)*
            $(#[allow(missing_docs)] $other,)*
            $(#[allow(missing_docs)] $mem,)*
            $(#[allow(missing_docs)] $ctrl,)*
            $(#[allow(missing_docs)] $term,)*
            /// A removed instruction's slot; never produces a value and is
            /// skipped by every traversal (`spec.md` §3, "free-list").
            Tombstone,
        }

        impl Opcode {
            /// Every block must end in exactly one of these (`spec.md` §3,
            /// invariant 2).
            pub const fn is_terminator(self) -> bool {
                matches!(self, $(Opcode::$term)|*)
            }

            /// Whether the opcode produces a value deterministically from
            /// its operands with no observable side effect, i.e. is
            /// eligible for GVN/constant-folding/dead-code elimination
            /// (`spec.md` §4.3, "global value numbering").
            pub const fn is_pure(self) -> bool {
                matches!(self, $(Opcode::$konst)|* | $(Opcode::$arith)|* | $(Opcode::$other)|*)
            }

            /// Whether operand order does not affect the result, so GVN may
            /// canonicalize operand order (`spec.md` §4.3).
            pub const fn is_commutative(self) -> bool {
                matches!(self, $(Opcode::$comm)|*)
            }

            /// Whether the opcode produces a canonical constant value with
            /// no operands (`spec.md` §3, invariant 6).
            pub const fn is_constant(self) -> bool {
                matches!(self, $(Opcode::$konst)|*)
            }

            /// Whether the opcode touches memory or other ambient state and
            /// must be treated as opaque by GVN (`spec.md` §4.3).
            pub const fn is_memory(self) -> bool {
                matches!(self, $(Opcode::$mem)|*)
            }
        }
    };
}

opcodes! {
    constants: [
        ConstInt8, ConstInt16, ConstInt32, ConstInt64, ConstBitInt,
        ConstFloat32, ConstFloat64, ConstZero, Undefined,
    ],
    pure_arith: [
        Add, Sub, Mul, UDiv, SDiv, URem, SRem, Neg,
        And, Or, Xor, Not, Shl, LShr, AShr,
        FAdd, FSub, FMul, FDiv, FNeg,
        AddOverflow, SubOverflow, MulOverflow,
    ],
    pure_other: [
        Compare, Select, Trunc, ZExt, SExt, FpTrunc, FpExt,
        SIntToFloat, UIntToFloat, FloatToSInt, FloatToUInt,
        Bitcast, PtrToInt, IntToPtr, GetBlockInput, ComplexPack, ComplexUnpack,
        FunctionArg,
    ],
    commutative: [Add, Mul, And, Or, Xor, FAdd, FMul],
    memory: [
        Load, Store, LocalAddr, AtomicLoad, AtomicStore, AtomicRmw,
        AtomicCompareExchange, Fence, InlineAssembly, Call, CallIndirect,
    ],
    control: [],
    terminators: [
        Jump, BranchNonzero, BranchZero, BranchCompare, Switch,
        Return, ReturnVoid, Unreachable, TailCall,
    ],
}
