//! Dense small-integer reference types for the asmcmp representation,
//! the same `index_ref!` shape `kefir-ir` uses for its own refs (`spec.md`
//! §3, "Instruction-ref").

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
    };
}

index_ref!(
    InstructionRef,
    "Dense index identifying one instruction within an `AsmFunction`'s linear instruction sequence."
);
index_ref!(LabelId, "A jump target, referenced by `Jump`/`CondJump`/`Call` operands and defined by exactly one `Label` pseudo-instruction.");
index_ref!(VirtualRegisterId, "A symbolic register, resolved to a `PhysicalRegister` by register allocation before the devirtual passes run.");
