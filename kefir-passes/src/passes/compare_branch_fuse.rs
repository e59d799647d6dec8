//! Fuses a standalone `Compare` immediately followed by a branch on its
//! result into a single `BranchCompare` terminator, when the comparison has
//! no other user (`spec.md` §4.3, "compare-branch fuse").

use hashbrown::HashMap;
use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::FunctionAnalysis,
    instruction::OperandData,
    module::Module,
    opcode::{
        CompareKind,
        Opcode,
    },
    refs::FunctionId,
};

use crate::pass::Pass;

/// Rewrites `c = compare(a, b, k); branch-nonzero(c), t, f` into
/// `branch-compare(a, b, k), t, f`, dropping the now-dead `Compare`.
#[derive(Debug, Default)]
pub struct CompareBranchFuse;

impl Pass for CompareBranchFuse {
    fn name(&self) -> &'static str {
        "compare-branch-fuse"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let func = module.function_mut(function)?;
        let container = func.container_mut();

        let mut changed = false;
        let mut dead = Vec::new();

        for block in container.live_blocks().map(|b| b.id()).collect::<Vec<_>>() {
            let Some(terminator) = container.block(block)?.last_instruction() else {
                continue;
            };
            let term_instr = container.instruction(terminator)?;
            if term_instr.opcode != Opcode::BranchNonzero && term_instr.opcode != Opcode::BranchZero {
                continue;
            }
            let OperandData::Branch { condition, if_true, if_false } = term_instr.operands else {
                continue;
            };
            let negate_for_branch_zero = term_instr.opcode == Opcode::BranchZero;

            let cond_instr = container.instruction(condition)?;
            if cond_instr.opcode != Opcode::Compare {
                continue;
            }
            let OperandData::Compare(lhs, rhs, kind) = cond_instr.operands else {
                continue;
            };
            if !single_user(container, condition)? {
                continue;
            }

            let kind = if negate_for_branch_zero { kind.negate() } else { kind };
            let instr_mut = container.instruction_mut(terminator)?;
            instr_mut.opcode = Opcode::BranchCompare;
            instr_mut.operands = OperandData::BranchCompare {
                lhs,
                rhs,
                compare: kind,
                if_true,
                if_false,
            };
            dead.push(condition);
            changed = true;
        }

        for id in dead {
            container.remove_instruction(id)?;
        }
        if changed {
            analysis.invalidate();
        }
        Ok(changed)
    }
}

fn single_user(container: &kefir_ir::container::CodeContainer, value: kefir_ir::refs::InstructionRef) -> KefirResult<bool> {
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
