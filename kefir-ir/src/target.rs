//! The target-platform handle the front-end hands to module construction
//! (`spec.md` §6, "To the front-end (consumes): A target-platform handle").

use crate::{
    ir_type::{
        IrType,
        IrTypeKind,
        IrTypeTable,
    },
    refs::TypeId,
};

/// Size, alignment and (for aggregates) per-member byte offsets of a type,
/// computed on first query and memoized by [`crate::module::Module`]
/// (`spec.md` §3, "Type descriptors are materialized lazily on first
/// query").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    /// Size in bytes.
    pub size: u64,
    /// Required alignment in bytes.
    pub alignment: u32,
    /// For `Struct`/`Union`, the byte offset of each member, parallel to
    /// the member list in the type table; empty otherwise.
    pub member_offsets: Vec<u64>,
}

/// Bit-offset and storage-unit size for one bit-field, as decided by the
/// target ABI (`spec.md` §3, "Bit-field allocation is target-ABI
/// controlled").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitfieldAllocation {
    /// Byte offset of the storage unit within the containing aggregate.
    pub storage_offset: u64,
    /// Bit offset of the field within the storage unit, counted from the
    /// least-significant bit.
    pub bit_offset: u8,
}

/// Sizes, alignments, and ABI-specific layout decisions a target exposes to
/// the optimizer core. The real ABI classification tables are out of scope
/// (`spec.md` §1); this trait is the seam a backend would implement one of.
pub trait TargetPlatform {
    /// Compute the full layout of `ty`.
    fn layout_of(&self, table: &IrTypeTable, ty: TypeId) -> TargetLayout;

    /// Decide where a bit-field of `bit_width` bits, the `ordinal`-th member
    /// of `base`, is allocated.
    fn allocate_bitfield(
        &self,
        table: &IrTypeTable,
        base: TypeId,
        ordinal: usize,
        bit_width: u8,
    ) -> BitfieldAllocation;

    /// Native machine word size in bits, used to decide whether a
    /// `_BitInt(width)` operation folds to native arithmetic or must go
    /// through the BigInt kernel (`spec.md` §3).
    fn word_bits(&self) -> u32;
}

/// A single reference implementation, amd64-like sizes, sufficient for the
/// test suite; the real per-target ABI tables are an external collaborator
/// (`spec.md` §1, "Out of scope").
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferencePlatform;

impl TargetPlatform for ReferencePlatform {
    fn layout_of(&self, table: &IrTypeTable, ty: TypeId) -> TargetLayout {
        let Some(entry) = table.get(ty) else {
            return TargetLayout {
                size: 0,
                alignment: 1,
                member_offsets: Vec::new(),
            };
        };
        match &entry.kind {
            IrTypeKind::Void => TargetLayout {
                size: 0,
                alignment: 1,
                member_offsets: Vec::new(),
            },
            IrTypeKind::Bool => scalar_layout(1),
            IrTypeKind::Int { width, .. } => scalar_layout((*width as u64) / 8),
            IrTypeKind::BitInt { width, .. } => {
                let bytes = (*width as u64).div_ceil(8);
                TargetLayout {
                    size: bytes,
                    alignment: bytes.min(16).next_power_of_two() as u32,
                    member_offsets: Vec::new(),
                }
            }
            IrTypeKind::Float32 => scalar_layout(4),
            IrTypeKind::Float64 => scalar_layout(8),
            IrTypeKind::LongDouble => TargetLayout {
                size: 16,
                alignment: 16,
                member_offsets: Vec::new(),
            },
            IrTypeKind::Complex { element } => {
                let inner = self.layout_of(table, *element);
                TargetLayout {
                    size: inner.size * 2,
                    alignment: inner.alignment,
                    member_offsets: vec![0, inner.size],
                }
            }
            IrTypeKind::Pointer => scalar_layout(8),
            IrTypeKind::Array { element, length } => {
                let inner = self.layout_of(table, *element);
                TargetLayout {
                    size: inner.size * *length,
                    alignment: inner.alignment,
                    member_offsets: Vec::new(),
                }
            }
            IrTypeKind::Struct { members } => self.layout_aggregate(table, members, false),
            IrTypeKind::Union { members } => self.layout_aggregate(table, members, true),
            IrTypeKind::Bitfield { base, .. } => self.layout_of(table, *base),
            IrTypeKind::Function { .. } => TargetLayout {
                size: 0,
                alignment: 1,
                member_offsets: Vec::new(),
            },
        }
    }

    fn allocate_bitfield(
        &self,
        table: &IrTypeTable,
        base: TypeId,
        ordinal: usize,
        bit_width: u8,
    ) -> BitfieldAllocation {
        let base_layout = self.layout_of(table, base);
        let unit_bits = (base_layout.size * 8) as u32;
        let occupied_before = ordinal as u32 * bit_width as u32;
        BitfieldAllocation {
            storage_offset: (occupied_before / unit_bits) as u64 * base_layout.size,
            bit_offset: (occupied_before % unit_bits) as u8,
        }
    }

    fn word_bits(&self) -> u32 {
        64
    }
}

impl ReferencePlatform {
    fn layout_aggregate(
        &self,
        table: &IrTypeTable,
        members: &[TypeId],
        union_like: bool,
    ) -> TargetLayout {
        let mut offset = 0u64;
        let mut alignment = 1u32;
        let mut offsets = Vec::with_capacity(members.len());
        let mut max_size = 0u64;
        for &member in members {
            let layout = self.layout_of(table, member);
            alignment = alignment.max(layout.alignment);
            if union_like {
                offsets.push(0);
                max_size = max_size.max(layout.size);
            } else {
                offset = align_up(offset, layout.alignment as u64);
                offsets.push(offset);
                offset += layout.size;
            }
        }
        let size = if union_like {
            max_size
        } else {
            align_up(offset, alignment as u64)
        };
        TargetLayout {
            size,
            alignment,
            member_offsets: offsets,
        }
    }
}

fn scalar_layout(size: u64) -> TargetLayout {
    TargetLayout {
        size,
        alignment: size.max(1) as u32,
        member_offsets: Vec::new(),
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

/// Construct the canonical `IrType` for a struct/union member list, used by
/// callers assembling aggregates; a thin convenience over `IrTypeTable`.
pub fn struct_type(members: Vec<TypeId>, alignment: u32) -> IrType {
    IrType {
        kind: IrTypeKind::Struct { members },
        alignment,
    }
}
