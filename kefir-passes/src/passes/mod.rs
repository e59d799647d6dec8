//! The documented optimizer passes (`spec.md` §4.3), plus the supplemental
//! `noop` pass used for pipeline smoke tests
//! (`original_source/source/optimizer/pipeline/noop.c`).

pub mod compare_branch_fuse;
pub mod constant_folding;
pub mod global_value_numbering;
pub mod lowering;
pub mod mem2reg;
pub mod noop;
pub mod operation_simplification;
pub mod tail_call_marking;
pub mod unreachable_simplification;

#[cfg(test)]
pub(crate) mod test_support;
