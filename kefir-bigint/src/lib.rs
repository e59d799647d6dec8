//! Fixed-width digit-array arithmetic kernel.
//!
//! Operates on `&mut [u64]` / `&[u64]` "digit buffers", least-significant
//! digit first, each of exactly [`limits::digit_count`]`(width)` elements.
//! Used both at compile time, to fold `_BitInt(N)` constants wider than the
//! native word size, and as the arithmetic shape of the runtime helpers the
//! backend emits for the same operations (`spec.md` §4.1).

#![warn(missing_docs)]

pub mod arithmetic;
pub mod cast;
pub mod compare;
pub mod digits;
pub mod divide;
pub mod limits;
pub mod shift;

pub use arithmetic::{
    add,
    and,
    invert,
    negate,
    or,
    signed_multiply,
    subtract,
    unsigned_multiply,
    xor,
};
pub use cast::{
    cast_signed,
    cast_unsigned,
};
pub use compare::{
    compare_signed,
    compare_unsigned,
};
pub use digits::{
    get_signed,
    get_unsigned,
    set_signed,
    set_unsigned,
    zero,
};
pub use divide::{
    signed_divide,
    unsigned_divide,
};
pub use limits::{
    digit_count,
    BITINT_MAXWIDTH,
};
pub use shift::{
    arithmetic_right_shift,
    left_shift,
    right_shift,
};

/// Re-exports intended for `use kefir_bigint::prelude::*;`.
pub mod prelude {
    pub use crate::{
        add,
        and,
        arithmetic_right_shift,
        cast_signed,
        cast_unsigned,
        compare_signed,
        compare_unsigned,
        digit_count,
        get_signed,
        get_unsigned,
        invert,
        left_shift,
        negate,
        or,
        right_shift,
        set_signed,
        set_unsigned,
        signed_divide,
        signed_multiply,
        subtract,
        unsigned_divide,
        unsigned_multiply,
        xor,
        zero,
        BITINT_MAXWIDTH,
    };
}
