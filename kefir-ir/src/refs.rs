//! Dense small-integer reference types.
//!
//! Every pool-managed entity in a [`crate::container::CodeContainer`] is
//! addressed by one of these newtypes rather than a bare `u32`, the same way
//! `fuel_types` wraps every atomic numeric type in a unit struct instead of
//! handing out raw integers (`spec.md` §3, "Instruction-ref").

use core::fmt;

macro_rules! index_ref {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Construct from a raw dense index.
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// The raw dense index.
            pub const fn index(self) -> u32 {
                self.0
            }

            /// The raw dense index as `usize`, for indexing pool vectors.
            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

index_ref!(
    InstructionRef,
    "Dense index identifying one instruction within a `CodeContainer` (`spec.md` GLOSSARY)."
);
index_ref!(BlockId, "Dense index identifying one basic block.");
index_ref!(PhiId, "Dense index identifying one phi node.");
index_ref!(CallNodeId, "Dense index identifying one call node.");
index_ref!(
    InlineAsmId,
    "Dense index identifying one inline-assembly node."
);
index_ref!(TypeId, "Dense index into a module's IR type table.");
index_ref!(FunctionId, "Dense index into a module's function table.");
index_ref!(
    LocalIndex,
    "Dense index of a local variable within a function's locals IR type."
);
index_ref!(
    BigIntConstId,
    "Dense index into a function's pool of wide `_BitInt` constant digit sequences."
);
index_ref!(
    SwitchTableId,
    "Dense index into a function's pool of switch case tables."
);
