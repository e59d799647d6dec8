//! Interned wide `_BitInt` constants.

/// A wide `_BitInt` constant's digit sequence, little-endian `u64` digits,
/// as produced by [`kefir_bigint`] and consumed by constant folding
/// (`spec.md` §4.1, §4.3 "constant folding").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BigIntConst {
    /// Little-endian digit array.
    pub digits: Vec<u64>,
    /// Declared `_BitInt` width in bits.
    pub width: u32,
    /// Whether the constant is signed.
    pub signed: bool,
}

impl BigIntConst {
    /// Construct a bigint constant from its digit array.
    pub fn new(digits: Vec<u64>, width: u32, signed: bool) -> Self {
        Self {
            digits,
            width,
            signed,
        }
    }
}
