//! The IR type table: a flat, structurally-interned sequence of type
//! entries (`spec.md` §3, "IR type").

use hashbrown::HashMap;

use crate::{
    refs::TypeId,
    target::{
        TargetLayout,
        TargetPlatform,
    },
};

/// The shape of one type-table entry. Aggregates and function signatures
/// reference other entries by [`TypeId`], so the table as a whole forms a
/// DAG rather than a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IrTypeKind {
    /// `void`; carries no value.
    Void,
    /// `_Bool`.
    Bool,
    /// Signed or unsigned integer of a fixed native width.
    Int {
        /// Width in bits: 8, 16, 32 or 64.
        width: u8,
        /// Whether the integer is signed.
        signed: bool,
    },
    /// `_BitInt(width)`, for widths the native `Int` variant does not cover.
    BitInt {
        /// Declared width in bits, up to [`kefir_bigint::BITINT_MAXWIDTH`].
        width: u16,
        /// Whether the bit-precise integer is signed.
        signed: bool,
    },
    /// IEEE-754 single precision.
    Float32,
    /// IEEE-754 double precision.
    Float64,
    /// Extended precision, lowered by the target-lowering bridge on targets
    /// lacking hardware support (`spec.md` §4.3, "lowering").
    LongDouble,
    /// `_Complex` of the given element type.
    Complex {
        /// The real/imaginary element type; must be `Float32` or `Float64`.
        element: TypeId,
    },
    /// A pointer; pointee type is not tracked at the optimizer level since
    /// the optimizer treats all pointers as opaque addresses.
    Pointer,
    /// A fixed-length array of `element`.
    Array {
        /// Element type.
        element: TypeId,
        /// Element count.
        length: u64,
    },
    /// A C `struct`: members laid out in declaration order.
    Struct {
        /// Member types, in declaration order.
        members: Vec<TypeId>,
    },
    /// A C `union`: all members share the same storage.
    Union {
        /// Member types.
        members: Vec<TypeId>,
    },
    /// A bit-field member occupying `bit_width` bits of storage unit `base`.
    /// Allocation (byte/bit offset within the containing struct) is
    /// target-ABI controlled (`spec.md` §3).
    Bitfield {
        /// The underlying storage-unit type the bit-field is carved from.
        base: TypeId,
        /// Width of the bit-field in bits.
        bit_width: u8,
    },
    /// A function signature.
    Function {
        /// Parameter types.
        params: Vec<TypeId>,
        /// Return type, `None` for `void`.
        return_type: Option<TypeId>,
        /// Whether the signature is variadic.
        variadic: bool,
    },
}

/// One entry of the type table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IrType {
    /// The shape of the type.
    pub kind: IrTypeKind,
    /// Required alignment in bytes.
    pub alignment: u32,
}

/// A module's type table: structurally-interned, so that two structurally
/// identical type entries resolve to the same [`TypeId`] (`spec.md` §3,
/// "Type identity is by structural equality").
#[derive(Debug, Default, Clone)]
pub struct IrTypeTable {
    entries: Vec<IrType>,
    interned: HashMap<IrType, TypeId>,
    layout_cache: Vec<Option<TargetLayout>>,
}

impl IrTypeTable {
    /// An empty type table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `ty`, returning its canonical [`TypeId`]. Interning the same
    /// shape twice returns the same id.
    pub fn intern(&mut self, ty: IrType) -> TypeId {
        if let Some(existing) = self.interned.get(&ty) {
            return *existing;
        }
        let id = TypeId::new(self.entries.len() as u32);
        self.entries.push(ty.clone());
        self.interned.insert(ty, id);
        self.layout_cache.push(None);
        id
    }

    /// Look up a type by id.
    pub fn get(&self, id: TypeId) -> Option<&IrType> {
        self.entries.get(id.as_usize())
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `id`'s target layout, computing and memoizing it on first query
    /// (`spec.md` §3, "Type descriptors are materialized lazily on first
    /// query"; SUPPLEMENT from `original_source/source/optimizer/type.c`'s
    /// layout cache).
    pub fn layout_of(&mut self, id: TypeId, platform: &dyn TargetPlatform) -> Option<&TargetLayout> {
        let index = id.as_usize();
        if index >= self.entries.len() {
            return None;
        }
        if self.layout_cache[index].is_none() {
            let computed = platform.layout_of(self, id);
            self.layout_cache[index] = Some(computed);
        }
        self.layout_cache[index].as_ref()
    }
}
