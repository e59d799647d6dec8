//! Addition, subtraction, negation and bitwise arithmetic, all modulo
//! 2^width (`spec.md` §4.1).

use crate::digits::{
    assert_buffer_len,
    mask_to_width,
};

/// `lhs += rhs (mod 2^width)`, result replaces `lhs`.
pub fn add(lhs: &mut [u64], rhs: &[u64], width: u32) {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    let mut carry = 0u128;
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        let sum = *l as u128 + *r as u128 + carry;
        *l = sum as u64;
        carry = sum >> 64;
    }
    mask_to_width(lhs, width);
}

/// `lhs -= rhs (mod 2^width)`, result replaces `lhs`.
pub fn subtract(lhs: &mut [u64], rhs: &[u64], width: u32) {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    let mut borrow = 0i128;
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        let diff = *l as i128 - *r as i128 - borrow;
        if diff < 0 {
            *l = (diff + (1i128 << 64)) as u64;
            borrow = 1;
        } else {
            *l = diff as u64;
            borrow = 0;
        }
    }
    mask_to_width(lhs, width);
}

/// Two's-complement negation modulo 2^width: `buf = (!buf) + 1`.
pub fn negate(buf: &mut [u64], width: u32) {
    assert_buffer_len(buf, width);
    invert(buf, width);
    let mut one = vec![0u64; buf.len()];
    one[0] = 1;
    add(buf, &one, width);
}

/// Bitwise NOT, masked to `width`.
pub fn invert(buf: &mut [u64], width: u32) {
    assert_buffer_len(buf, width);
    for d in buf.iter_mut() {
        *d = !*d;
    }
    mask_to_width(buf, width);
}

/// Bitwise AND, masked to `width`.
pub fn and(lhs: &mut [u64], rhs: &[u64], width: u32) {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        *l &= *r;
    }
    mask_to_width(lhs, width);
}

/// Bitwise OR, masked to `width`.
pub fn or(lhs: &mut [u64], rhs: &[u64], width: u32) {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        *l |= *r;
    }
    mask_to_width(lhs, width);
}

/// Bitwise XOR, masked to `width`.
pub fn xor(lhs: &mut [u64], rhs: &[u64], width: u32) {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        *l ^= *r;
    }
    mask_to_width(lhs, width);
}

/// `lhs = lhs * rhs (mod 2^width)`, using a schoolbook accumulator twice the
/// width of the operands before truncating back down.
pub fn unsigned_multiply(lhs: &mut [u64], rhs: &[u64], width: u32) {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    let n = lhs.len();
    let mut acc = vec![0u64; n * 2];
    for (i, &l) in lhs.iter().enumerate() {
        if l == 0 {
            continue;
        }
        let mut carry = 0u128;
        for (j, &r) in rhs.iter().enumerate() {
            let idx = i + j;
            let product = l as u128 * r as u128 + acc[idx] as u128 + carry;
            acc[idx] = product as u64;
            carry = product >> 64;
        }
        let mut idx = i + rhs.len();
        while carry != 0 {
            let sum = acc[idx] as u128 + carry;
            acc[idx] = sum as u64;
            carry = sum >> 64;
            idx += 1;
        }
    }
    lhs.copy_from_slice(&acc[..n]);
    mask_to_width(lhs, width);
}

/// Signed multiply by taking absolute values, multiplying unsigned, and
/// negating the result if the operand signs differed (`spec.md` §4.1).
pub fn signed_multiply(lhs: &mut [u64], rhs: &[u64], width: u32) {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    let lhs_negative = crate::digits::is_negative(lhs, width);
    let rhs_negative = crate::digits::is_negative(rhs, width);

    let mut rhs_abs = rhs.to_vec();
    if rhs_negative {
        negate(&mut rhs_abs, width);
    }
    if lhs_negative {
        negate(lhs, width);
    }

    unsigned_multiply(lhs, &rhs_abs, width);

    if lhs_negative != rhs_negative {
        negate(lhs, width);
    }
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
    fn add_wraps_modulo_width() {
        let width = 8;
        let mut a = vec![0u64; digit_count(width)];
        let mut b = vec![0u64; digit_count(width)];
        set_unsigned(&mut a, width, 0xff);
        set_unsigned(&mut b, width, 1);
        add(&mut a, &b, width);
        assert_eq!(get_unsigned(&a, width), 0);
    }

    #[test]
    fn negate_twice_is_identity() {
        let width = 32;
        let mut a = vec![0u64; digit_count(width)];
        set_signed(&mut a, width, -1234);
        let original = a.clone();
        negate(&mut a, width);
        negate(&mut a, width);
        assert_eq!(a, original);
    }

    #[test]
    fn invert_twice_is_identity() {
        let width = 17;
        let mut a = vec![0u64; digit_count(width)];
        set_unsigned(&mut a, width, 0x1_2345);
        let original = a.clone();
        invert(&mut a, width);
        invert(&mut a, width);
        assert_eq!(a, original);
    }

    #[test]
    fn signed_multiply_handles_negative_operands() {
        let width = 16;
        let mut a = vec![0u64; digit_count(width)];
        let mut b = vec![0u64; digit_count(width)];
        set_signed(&mut a, width, -3);
        set_signed(&mut b, width, 7);
        signed_multiply(&mut a, &b, width);
        assert_eq!(get_signed(&a, width), -21);
    }

    #[test]
    fn wide_bitint_add_overflow_80_bits() {
        let width = 80;
        let mut a = vec![0u64; digit_count(width)];
        let mut one = vec![0u64; digit_count(width)];
        // 2^80 - 1
        a[0] = u64::MAX;
        a[1] = 0xffff;
        one[0] = 1;
        add(&mut a, &one, width);
        assert_eq!(a[0], 0);
        assert_eq!(a[1], 0);
    }
}
