//! Unsigned and signed three-way comparison.

use crate::digits::{
    assert_buffer_len,
    is_negative,
};

/// -1/0/1 comparison, interpreting both buffers as unsigned.
pub fn compare_unsigned(lhs: &[u64], rhs: &[u64], width: u32) -> i32 {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    for (l, r) in lhs.iter().rev().zip(rhs.iter().rev()) {
        match l.cmp(r) {
            core::cmp::Ordering::Less => return -1,
            core::cmp::Ordering::Greater => return 1,
            core::cmp::Ordering::Equal => continue,
        }
    }
    0
}

/// -1/0/1 comparison, interpreting both buffers as signed (two's complement,
/// per `width`).
pub fn compare_signed(lhs: &[u64], rhs: &[u64], width: u32) -> i32 {
    assert_buffer_len(lhs, width);
    assert_buffer_len(rhs, width);
    let lhs_neg = is_negative(lhs, width);
    let rhs_neg = is_negative(rhs, width);
    match (lhs_neg, rhs_neg) {
        (true, false) => -1,
        (false, true) => 1,
        _ => compare_unsigned(lhs, rhs, width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digits::{
        set_signed,
        set_unsigned,
    };
    use crate::limits::digit_count;

    #[test]
    fn unsigned_orders_by_magnitude() {
        let width = 8;
        let mut a = vec![0u64; digit_count(width)];
        let mut b = vec![0u64; digit_count(width)];
        set_unsigned(&mut a, width, 5);
        set_unsigned(&mut b, width, 200);
        assert_eq!(compare_unsigned(&a, &b, width), -1);
        assert_eq!(compare_unsigned(&b, &a, width), 1);
        assert_eq!(compare_unsigned(&a, &a, width), 0);
    }

    #[test]
    fn signed_treats_negative_as_smaller() {
        let width = 8;
        let mut a = vec![0u64; digit_count(width)];
        let mut b = vec![0u64; digit_count(width)];
        set_signed(&mut a, width, -5);
        set_signed(&mut b, width, 5);
        assert_eq!(compare_signed(&a, &b, width), -1);
        assert_eq!(compare_signed(&b, &a, width), 1);
    }
}
