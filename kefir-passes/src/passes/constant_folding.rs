//! Constant folding: narrow (8/16/32/64-bit) integer arithmetic folds via
//! native wrapping arithmetic; wide `_BitInt` arithmetic folds via the
//! [`kefir_bigint`] digit-buffer kernel (`spec.md` §4.1, §4.3 "constant
//! folding"). Division (narrow or wide) by a zero divisor is left unfolded
//! — the division instruction stays in the IR to preserve its trap/UB
//! semantics at the point it executes.

use hashbrown::HashMap;
use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::FunctionAnalysis,
    container::{
        BigIntConst,
        CodeContainer,
    },
    instruction::OperandData,
    module::Module,
    opcode::Opcode,
    refs::{
        FunctionId,
        InstructionRef,
    },
};

use crate::pass::Pass;

/// Folds binary arithmetic over two constant operands into a single
/// constant, narrow or wide as the operands demand.
#[derive(Debug, Default)]
pub struct ConstantFolding;

impl Pass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let func = module.function_mut(function)?;
        let (container, debug_info) = func.container_and_debug_mut();

        enum Folded {
            Narrow(Opcode, i64),
            Wide(BigIntConst),
        }

        let mut changed = false;
        let mut replacements: HashMap<InstructionRef, InstructionRef> = HashMap::new();
        let mut dead: Vec<InstructionRef> = Vec::new();
        let mut folds: Vec<(InstructionRef, Folded)> = Vec::new();

        for id in container.live_instruction_refs().collect::<Vec<_>>() {
            let instr = container.instruction(id)?;
            let opcode = instr.opcode;
            let OperandData::Binary(a, b) = instr.operands else { continue };
            if let Some(narrow) = narrow_operands(container, a, b) {
                if let Some((result_opcode, value)) = fold_narrow(opcode, narrow) {
                    folds.push((id, Folded::Narrow(result_opcode, value)));
                }
            } else if let Some(result) = fold_wide(container, opcode, a, b) {
                folds.push((id, Folded::Wide(result)));
            }
        }

        for (id, folded) in folds {
            let block = container.instruction(id)?.block;
            let replacement = match folded {
                Folded::Narrow(opcode, value) => {
                    container.insert_before_terminator(block, opcode, OperandData::IntConst(value))?
                }
                Folded::Wide(bigint) => {
                    let const_id = container.push_bigint_const(bigint);
                    container.insert_before_terminator(block, Opcode::ConstBitInt, OperandData::BigIntConst(const_id))?
                }
            };
            replacements.insert(id, replacement);
            dead.push(id);
            changed = true;
        }

        container.apply_replacements(&replacements);
        for (&from, &to) in &replacements {
            debug_info.transfer(from, to);
        }
        for id in dead {
            container.remove_instruction(id)?;
        }
        debug_info.retain_live(container);

        if changed {
            analysis.invalidate();
        }
        Ok(changed)
    }
}

/// A narrow constant's width (bits) and value, read from one of the
/// `Const{Int8,Int16,Int32,Int64}` opcodes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NarrowConst {
    pub(crate) width: u32,
    pub(crate) value: i64,
}

pub(crate) fn narrow_const(container: &CodeContainer, value: InstructionRef) -> Option<NarrowConst> {
    let instr = container.instruction(value).ok()?;
    let width = match instr.opcode {
        Opcode::ConstInt8 => 8,
        Opcode::ConstInt16 => 16,
        Opcode::ConstInt32 => 32,
        Opcode::ConstInt64 => 64,
        _ => return None,
    };
    let OperandData::IntConst(value) = instr.operands else { return None };
    Some(NarrowConst { width, value })
}

fn narrow_operands(container: &CodeContainer, a: InstructionRef, b: InstructionRef) -> Option<(NarrowConst, NarrowConst)> {
    let a = narrow_const(container, a)?;
    let b = narrow_const(container, b)?;
    Some((a, b))
}

/// Truncate and sign-extend `value` back to `width` bits, the narrow
/// counterpart of [`kefir_bigint::cast::cast_signed`].
pub(crate) fn wrap_signed(value: i64, width: u32) -> i64 {
    if width >= 64 {
        return value;
    }
    let shift = 64 - width;
    (value << shift) >> shift
}

fn fold_narrow(opcode: Opcode, (a, b): (NarrowConst, NarrowConst)) -> Option<(Opcode, i64)> {
    let width = a.width.max(b.width);
    let result_opcode = match width {
        8 => Opcode::ConstInt8,
        16 => Opcode::ConstInt16,
        32 => Opcode::ConstInt32,
        _ => Opcode::ConstInt64,
    };
    let raw: i128 = match opcode {
        Opcode::Add => (a.value as i128).wrapping_add(b.value as i128),
        Opcode::Sub => (a.value as i128).wrapping_sub(b.value as i128),
        Opcode::Mul => (a.value as i128).wrapping_mul(b.value as i128),
        Opcode::And => (a.value & b.value) as i128,
        Opcode::Or => (a.value | b.value) as i128,
        Opcode::Xor => (a.value ^ b.value) as i128,
        Opcode::SDiv if b.value != 0 => (a.value as i128).wrapping_div(b.value as i128),
        Opcode::SRem if b.value != 0 => (a.value as i128).wrapping_rem(b.value as i128),
        Opcode::UDiv if b.value != 0 => (a.value as u64).wrapping_div(b.value as u64) as i128,
        Opcode::URem if b.value != 0 => (a.value as u64).wrapping_rem(b.value as u64) as i128,
        _ => return None,
    };
    Some((result_opcode, wrap_signed(raw as i64, width)))
}

fn fold_wide(container: &CodeContainer, opcode: Opcode, a: InstructionRef, b: InstructionRef) -> Option<BigIntConst> {
    let a_instr = container.instruction(a).ok()?;
    let b_instr = container.instruction(b).ok()?;
    if a_instr.opcode != Opcode::ConstBitInt || b_instr.opcode != Opcode::ConstBitInt {
        return None;
    }
    let OperandData::BigIntConst(a_id) = a_instr.operands else { return None };
    let OperandData::BigIntConst(b_id) = b_instr.operands else { return None };
    let a_const = container.bigint_const(a_id).ok()?;
    let b_const = container.bigint_const(b_id).ok()?;
    if a_const.width != b_const.width {
        return None;
    }
    let width = a_const.width;
    let mut lhs = a_const.digits.clone();
    let rhs = &b_const.digits;

    match opcode {
        Opcode::Add => kefir_bigint::add(&mut lhs, rhs, width),
        Opcode::Sub => kefir_bigint::subtract(&mut lhs, rhs, width),
        Opcode::And => kefir_bigint::and(&mut lhs, rhs, width),
        Opcode::Or => kefir_bigint::or(&mut lhs, rhs, width),
        Opcode::Xor => kefir_bigint::xor(&mut lhs, rhs, width),
        Opcode::Mul if a_const.signed => kefir_bigint::signed_multiply(&mut lhs, rhs, width),
        Opcode::Mul => kefir_bigint::unsigned_multiply(&mut lhs, rhs, width),
        Opcode::SDiv => {
            let mut accumulator = vec![0u64; lhs.len()];
            kefir_bigint::signed_divide(&mut lhs, &mut accumulator, rhs, width).ok()?;
        }
        Opcode::SRem => {
            let mut accumulator = vec![0u64; lhs.len()];
            kefir_bigint::signed_divide(&mut lhs, &mut accumulator, rhs, width).ok()?;
            lhs = accumulator;
        }
        Opcode::UDiv => {
            let mut accumulator = vec![0u64; lhs.len()];
            kefir_bigint::unsigned_divide(&mut lhs, &mut accumulator, rhs, width).ok()?;
        }
        Opcode::URem => {
            let mut accumulator = vec![0u64; lhs.len()];
            kefir_bigint::unsigned_divide(&mut lhs, &mut accumulator, rhs, width).ok()?;
            lhs = accumulator;
        }
        _ => return None,
    }

    Some(BigIntConst::new(lhs, width, a_const.signed))
}
