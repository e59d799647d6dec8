//! Named bounds for the kernel, gathered the way the teacher crate keeps its
//! magic numbers in a single `consts`-style module.

/// The digit type the kernel is parametric over. A 64-bit digit is used
/// uniformly; widths at or below [`NATIVE_WORD_BITS`] are expected to be
/// folded to native arithmetic by the caller before reaching the kernel
/// (`spec.md` §3, "BigInt representation").
pub const DIGIT_BITS: u32 = u64::BITS;

/// Bit-width of the native machine word the caller folds small widths to.
pub const NATIVE_WORD_BITS: u32 = 64;

/// Implementation-defined bound on `_BitInt(N)` width (`spec.md` §4.1).
/// Matches the reference bound used by the original C implementation for
/// `BITINT_MAXWIDTH`.
pub const BITINT_MAXWIDTH: u32 = 65535;

/// Number of `u64` digits needed to hold `width` bits, least-significant
/// digit first.
pub const fn digit_count(width: u32) -> usize {
    (width as usize).div_ceil(DIGIT_BITS as usize).max(1)
}
