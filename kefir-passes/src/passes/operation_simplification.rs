//! Peephole identity rewrites: `x + 0`, `x - 0`, `x * 1`, `x & -1`, `x & x`,
//! `x | x` collapse to `x`; annihilators `x * 0`, `x & 0` collapse to `0`;
//! `!(compare)` rewrites in place to the negated comparison; sibling
//! constant additions reassociate, `(x + c1) + c2` folding to a single
//! `x + (c1 + c2)` (`spec.md` §4.3, "operation simplification").

use hashbrown::HashMap;
use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::FunctionAnalysis,
    container::CodeContainer,
    instruction::OperandData,
    module::Module,
    opcode::Opcode,
    refs::{
        FunctionId,
        InstructionRef,
    },
};

use crate::{
    pass::Pass,
    passes::constant_folding::{
        narrow_const,
        wrap_signed,
    },
};

/// Applies per-instruction algebraic identities, independent of GVN (which
/// only coalesces structurally-equal instructions, not these).
#[derive(Debug, Default)]
pub struct OperationSimplification;

impl Pass for OperationSimplification {
    fn name(&self) -> &'static str {
        "operation-simplification"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let func = module.function_mut(function)?;
        let (container, debug_info) = func.container_and_debug_mut();

        let mut changed = false;
        let mut replacements: HashMap<InstructionRef, InstructionRef> = HashMap::new();
        let mut dead: Vec<InstructionRef> = Vec::new();
        // (outer add being replaced, its dead inner add, x, combined-constant width/value)
        let mut reassociations: Vec<(InstructionRef, InstructionRef, InstructionRef, u32, i64)> = Vec::new();

        for id in container.live_instruction_refs().collect::<Vec<_>>() {
            let instr = container.instruction(id)?;
            let opcode = instr.opcode;
            let OperandData::Binary(a, b) = instr.operands else {
                if opcode == Opcode::Not {
                    try_negate_not(container, id, &mut dead, &mut changed)?;
                }
                continue;
            };
            if let Some(identity) = identity_operand(container, opcode, a, b) {
                replacements.insert(id, identity);
                dead.push(id);
                changed = true;
            } else if let Some((x, inner, width, combined)) = reassociate_add(container, opcode, a, b) {
                reassociations.push((id, inner, x, width, combined));
                dead.push(id);
                dead.push(inner);
                changed = true;
            }
        }

        for (outer, _inner, x, width, combined) in reassociations {
            let block = container.instruction(outer)?.block;
            let result_opcode = match width {
                8 => Opcode::ConstInt8,
                16 => Opcode::ConstInt16,
                32 => Opcode::ConstInt32,
                _ => Opcode::ConstInt64,
            };
            let const_id = container.insert_before_terminator(block, result_opcode, OperandData::IntConst(combined))?;
            let new_add = container.insert_before_terminator(block, Opcode::Add, OperandData::Binary(x, const_id))?;
            replacements.insert(outer, new_add);
        }

        container.apply_replacements(&replacements);
        for (&from, &to) in &replacements {
            debug_info.transfer(from, to);
        }
        for id in dead {
            let _ = container.remove_instruction(id);
        }
        debug_info.retain_live(container);

        if changed {
            analysis.invalidate();
        }
        Ok(changed)
    }
}

/// If `opcode(a, b)` is one of the documented self-identities, the operand
/// it collapses to.
fn identity_operand(container: &CodeContainer, opcode: Opcode, a: InstructionRef, b: InstructionRef) -> Option<InstructionRef> {
    match opcode {
        Opcode::Add | Opcode::Sub | Opcode::Or | Opcode::Xor if is_int_const(container, b, 0) => Some(a),
        Opcode::Add if is_int_const(container, a, 0) => Some(b),
        Opcode::Mul if is_int_const(container, b, 1) => Some(a),
        Opcode::Mul if is_int_const(container, a, 1) => Some(b),
        // Annihilators: `x * 0` and `x & 0` collapse to the zero operand itself.
        Opcode::Mul if is_int_const(container, b, 0) => Some(b),
        Opcode::Mul if is_int_const(container, a, 0) => Some(a),
        Opcode::And if is_int_const(container, b, 0) => Some(b),
        Opcode::And if is_int_const(container, a, 0) => Some(a),
        Opcode::And if is_int_const(container, b, -1) => Some(a),
        Opcode::And if is_int_const(container, a, -1) => Some(b),
        Opcode::And | Opcode::Or if a == b => Some(a),
        _ => None,
    }
}

/// Whether `value` is produced by a narrow integer constant opcode holding
/// exactly `wanted` (`-1` meaning "all bits set" for `x & -1`).
fn is_int_const(container: &CodeContainer, value: InstructionRef, wanted: i64) -> bool {
    let Ok(instr) = container.instruction(value) else { return false };
    if !matches!(
        instr.opcode,
        Opcode::ConstInt8 | Opcode::ConstInt16 | Opcode::ConstInt32 | Opcode::ConstInt64
    ) {
        return false;
    }
    let OperandData::IntConst(stored) = instr.operands else { return false };
    if wanted == -1 {
        let width_mask: i64 = match instr.opcode {
            Opcode::ConstInt8 => 0xFF,
            Opcode::ConstInt16 => 0xFFFF,
            Opcode::ConstInt32 => 0xFFFF_FFFF,
            Opcode::ConstInt64 => -1,
            _ => unreachable!(),
        };
        stored == width_mask
    } else {
        stored == wanted
    }
}

/// `(x + c1) + c2`, with the inner add used only by the outer one,
/// collapses to a single `x + (c1 + c2)`; the two constants fold via the
/// same wrapping arithmetic `constant-folding` uses. Returns `(x, the dead
/// inner add, the combined constant's width, its value)`.
fn reassociate_add(
    container: &CodeContainer,
    opcode: Opcode,
    a: InstructionRef,
    b: InstructionRef,
) -> Option<(InstructionRef, InstructionRef, u32, i64)> {
    if opcode != Opcode::Add {
        return None;
    }
    let (inner, outer_const) = if let Some(c2) = narrow_const(container, b) {
        (a, c2)
    } else if let Some(c2) = narrow_const(container, a) {
        (b, c2)
    } else {
        return None;
    };
    let inner_instr = container.instruction(inner).ok()?;
    if inner_instr.opcode != Opcode::Add {
        return None;
    }
    let OperandData::Binary(ia, ib) = inner_instr.operands else { return None };
    let (x, inner_const) = if let Some(c1) = narrow_const(container, ib) {
        (ia, c1)
    } else if let Some(c1) = narrow_const(container, ia) {
        (ib, c1)
    } else {
        return None;
    };
    if !single_user(container, inner).ok()? {
        return None;
    }
    let width = inner_const.width.max(outer_const.width);
    let combined = wrap_signed((inner_const.value as i128).wrapping_add(outer_const.value as i128) as i64, width);
    Some((x, inner, width, combined))
}

/// `!(compare(a, b, kind))` with a single user rewrites in place to
/// `compare(a, b, kind.negate())`, leaving the `Not` instruction's ref
/// pointing at the now-negated compare it used to wrap.
fn try_negate_not(
    container: &mut CodeContainer,
    not_id: InstructionRef,
    dead: &mut Vec<InstructionRef>,
    changed: &mut bool,
) -> KefirResult<()> {
    let instr = container.instruction(not_id)?;
    let OperandData::Unary(operand) = instr.operands else { return Ok(()) };
    let Ok(operand_instr) = container.instruction(operand) else { return Ok(()) };
    if operand_instr.opcode != Opcode::Compare {
        return Ok(());
    }
    let OperandData::Compare(lhs, rhs, kind) = operand_instr.operands else { return Ok(()) };
    if !single_user(container, operand)? {
        return Ok(());
    }
    let negated = kind.negate();
    let instr_mut = container.instruction_mut(not_id)?;
    instr_mut.opcode = Opcode::Compare;
    instr_mut.operands = OperandData::Compare(lhs, rhs, negated);
    dead.push(operand);
    *changed = true;
    Ok(())
}

fn single_user(container: &CodeContainer, value: InstructionRef) -> KefirResult<bool> {
    let mut users = 0;
    for id in container.live_instruction_refs() {
        let instr = container.instruction(id)?;
        if instr.operand_refs().contains(&value) {
            users += 1;
            if users > 1 {
                return Ok(false);
            }
        }
    }
    Ok(users == 1)
}

#[cfg(test)]
mod tests {
    use kefir_ir::refs::FunctionId;

    use super::*;
    use crate::passes::test_support::module_with_function;

    #[test]
    fn collapses_add_zero_to_its_other_operand() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let a = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(7)).unwrap();
            let zero = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(0)).unwrap();
            let sum = container.append_instruction(entry, Opcode::Add, OperandData::Binary(a, zero)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(sum)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let entry = module.function(FunctionId::new(0)).unwrap().entry();
        let terminator = container.block(entry).unwrap().last_instruction().unwrap();
        let OperandData::Return(returned) = container.instruction(terminator).unwrap().operands else { panic!() };
        assert_eq!(container.instruction(returned).unwrap().opcode, Opcode::ConstInt8, "returns `a` directly, skipping the Add");
    }

    #[test]
    fn negates_not_of_compare_in_place() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let a = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(1)).unwrap();
            let b = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(2)).unwrap();
            let cmp = container
                .append_instruction(entry, Opcode::Compare, OperandData::Compare(a, b, kefir_ir::opcode::CompareKind::Equal))
                .unwrap();
            let not = container.append_instruction(entry, Opcode::Not, OperandData::Unary(cmp)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(not)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let not_id = InstructionRef::new(3);
        let instr = container.instruction(not_id).unwrap();
        assert_eq!(instr.opcode, Opcode::Compare);
        let OperandData::Compare(_, _, kind) = instr.operands else { panic!() };
        assert_eq!(kind, kefir_ir::opcode::CompareKind::NotEqual);
    }

    #[test]
    fn leaves_an_add_with_no_zero_operand_untouched() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let a = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(3)).unwrap();
            let b = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(4)).unwrap();
            let sum = container.append_instruction(entry, Opcode::Add, OperandData::Binary(a, b)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(sum)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(!changed);
    }

    #[test]
    fn collapses_mul_zero_to_the_zero_operand() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let a = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(7)).unwrap();
            let zero = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(0)).unwrap();
            let product = container.append_instruction(entry, Opcode::Mul, OperandData::Binary(a, zero)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(product)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let entry = module.function(FunctionId::new(0)).unwrap().entry();
        let terminator = container.block(entry).unwrap().last_instruction().unwrap();
        let OperandData::Return(returned) = container.instruction(terminator).unwrap().operands else { panic!() };
        assert_eq!(container.instruction(returned).unwrap().operands, OperandData::IntConst(0));
    }

    #[test]
    fn collapses_and_zero_to_the_zero_operand() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let a = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(7)).unwrap();
            let zero = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(0)).unwrap();
            let masked = container.append_instruction(entry, Opcode::And, OperandData::Binary(a, zero)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(masked)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let entry = module.function(FunctionId::new(0)).unwrap().entry();
        let terminator = container.block(entry).unwrap().last_instruction().unwrap();
        let OperandData::Return(returned) = container.instruction(terminator).unwrap().operands else { panic!() };
        assert_eq!(container.instruction(returned).unwrap().operands, OperandData::IntConst(0));
    }

    #[test]
    fn reassociates_sibling_constant_additions() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let x = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(5)).unwrap();
            let c1 = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(1)).unwrap();
            let inner = container.append_instruction(entry, Opcode::Add, OperandData::Binary(x, c1)).unwrap();
            let c2 = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(2)).unwrap();
            let outer = container.append_instruction(entry, Opcode::Add, OperandData::Binary(inner, c2)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(outer)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let entry = module.function(FunctionId::new(0)).unwrap().entry();
        let terminator = container.block(entry).unwrap().last_instruction().unwrap();
        assert_eq!(terminator, container.block(entry).unwrap().last_instruction().unwrap(), "terminator stays last after splicing in the reassociated add");
        let OperandData::Return(returned) = container.instruction(terminator).unwrap().operands else { panic!() };
        let add = container.instruction(returned).unwrap();
        assert_eq!(add.opcode, Opcode::Add);
        let OperandData::Binary(lhs, rhs) = add.operands else { panic!() };
        assert_eq!(container.instruction(rhs).unwrap().operands, OperandData::IntConst(3), "c1 + c2 folds to a single constant");
        let _ = lhs;
    }

    #[test]
    fn leaves_an_add_chain_with_no_constant_operands_untouched() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let x = container.append_instruction(entry, Opcode::FunctionArg, OperandData::Argument(0)).unwrap();
            let y = container.append_instruction(entry, Opcode::FunctionArg, OperandData::Argument(1)).unwrap();
            let inner = container.append_instruction(entry, Opcode::Add, OperandData::Binary(x, y)).unwrap();
            let z = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(7)).unwrap();
            let outer = container.append_instruction(entry, Opcode::Add, OperandData::Binary(inner, z)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(outer)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(!changed, "the inner add has no constant operand, so there is nothing to reassociate");
    }

    #[test]
    fn leaves_an_inner_add_with_more_than_one_user_untouched() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let x = container.append_instruction(entry, Opcode::FunctionArg, OperandData::Argument(0)).unwrap();
            let c1 = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(1)).unwrap();
            let inner = container.append_instruction(entry, Opcode::Add, OperandData::Binary(x, c1)).unwrap();
            let c2 = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(2)).unwrap();
            let outer = container.append_instruction(entry, Opcode::Add, OperandData::Binary(inner, c2)).unwrap();
            // `inner` feeds both the outer add and this second add, so reassociating
            // it away would drop the second use.
            let other = container.append_instruction(entry, Opcode::Add, OperandData::Binary(inner, x)).unwrap();
            let total = container.append_instruction(entry, Opcode::Add, OperandData::Binary(outer, other)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(total)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = OperationSimplification.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(!changed, "the inner add has a second user, so reassociating it away would be unsound");
    }
}
