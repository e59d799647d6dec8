//! Long division by the shift-subtract-restore method, matching
//! `kefir_bigint/divide.h` bit for bit (`spec.md` §4.1).

use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::{
    arithmetic::{
        add,
        negate,
        subtract,
    },
    digits::{
        assert_buffer_len,
        get_bit,
        is_negative,
        set_bit,
        set_zero,
    },
    shift::left_shift,
};

/// Whether every digit of `buf` is zero.
fn is_zero(buf: &[u64]) -> bool {
    buf.iter().all(|&d| d == 0)
}

/// `lhs` holds the dividend on entry and the quotient on exit;
/// `accumulator` holds the remainder on exit. Returns
/// [`KefirError::DivisionByZero`] if `rhs` is zero, leaving both buffers
/// untouched.
pub fn unsigned_divide(
    lhs: &mut [u64],
    accumulator: &mut [u64],
    rhs: &[u64],
    width: u32,
) -> KefirResult<()> {
    assert_buffer_len(lhs, width);
    assert_buffer_len(accumulator, width);
    assert_buffer_len(rhs, width);

    if is_zero(rhs) {
        return Err(KefirError::DivisionByZero);
    }

    set_zero(accumulator, width);
    if width == 0 {
        return Ok(());
    }

    for _ in 0..width {
        let lhs_msb = get_bit(lhs, width - 1);
        left_shift(accumulator, 1, width);
        left_shift(lhs, 1, width);
        set_bit(accumulator, 0, lhs_msb);

        subtract(accumulator, rhs, width);
        if is_negative(accumulator, width) {
            set_bit(lhs, 0, false);
            add(accumulator, rhs, width);
        } else {
            set_bit(lhs, 0, true);
        }
    }

    Ok(())
}

/// Signed division, truncating toward zero; the remainder takes the sign of
/// the dividend (`spec.md` §4.1, §8).
pub fn signed_divide(
    lhs: &mut [u64],
    accumulator: &mut [u64],
    rhs: &[u64],
    width: u32,
) -> KefirResult<()> {
    assert_buffer_len(lhs, width);
    assert_buffer_len(accumulator, width);
    assert_buffer_len(rhs, width);

    let dividend_negative = is_negative(lhs, width);
    let divisor_negative = is_negative(rhs, width);

    if dividend_negative {
        negate(lhs, width);
    }
    let mut rhs_abs = rhs.to_vec();
    if divisor_negative {
        negate(&mut rhs_abs, width);
    }

    unsigned_divide(lhs, accumulator, &rhs_abs, width)?;

    if dividend_negative != divisor_negative {
        negate(lhs, width);
    }
    if dividend_negative {
        negate(accumulator, width);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digits::{
        get_signed,
        get_unsigned,
        set_signed,
        set_unsigned,
    };
    use crate::limits::digit_count;

    #[test]
    fn unsigned_long_division_matches_reconstruction() {
        let width = 64;
        let mut lhs = vec![0u64; digit_count(width)];
        let mut acc = vec![0u64; digit_count(width)];
        let rhs = {
            let mut r = vec![0u64; digit_count(width)];
            set_unsigned(&mut r, width, 0xcafe);
            r
        };
        set_unsigned(&mut lhs, width, 0x123456789abcdef0);
        unsigned_divide(&mut lhs, &mut acc, &rhs, width).unwrap();
        assert_eq!(get_unsigned(&lhs, width), 0x1721FB66EFBF);
        assert_eq!(get_unsigned(&acc, width), 0x6236);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let width = 32;
        let mut lhs = vec![0u64; digit_count(width)];
        let mut acc = vec![0u64; digit_count(width)];
        let rhs = vec![0u64; digit_count(width)];
        set_unsigned(&mut lhs, width, 10);
        let err = unsigned_divide(&mut lhs, &mut acc, &rhs, width).unwrap_err();
        assert!(matches!(err, KefirError::DivisionByZero));
    }

    #[test]
    fn signed_divide_truncates_toward_zero() {
        let width = 16;
        let mut lhs = vec![0u64; digit_count(width)];
        let mut acc = vec![0u64; digit_count(width)];
        let mut rhs = vec![0u64; digit_count(width)];
        set_signed(&mut lhs, width, -7);
        set_signed(&mut rhs, width, 2);
        signed_divide(&mut lhs, &mut acc, &rhs, width).unwrap();
        assert_eq!(get_signed(&lhs, width), -3);
        assert_eq!(get_signed(&acc, width), -1);
    }

    #[test]
    fn unsigned_divide_round_trip() {
        let width = 16;
        let mut lhs = vec![0u64; digit_count(width)];
        let mut acc = vec![0u64; digit_count(width)];
        let mut rhs = vec![0u64; digit_count(width)];
        set_unsigned(&mut lhs, width, 1000);
        set_unsigned(&mut rhs, width, 7);
        unsigned_divide(&mut lhs, &mut acc, &rhs, width).unwrap();
        let q = get_unsigned(&lhs, width);
        let r = get_unsigned(&acc, width);
        assert_eq!(q * 7 + r, 1000);
        assert!(r < 7);
    }
}
