//! Tail-call marking: a `Call`/`CallIndirect` directly followed by
//! `return call_result;` is rewritten to a `TailCall` terminator,
//! collapsing the two instructions into one and dropping the dead `Return`
//! (`spec.md` §4.3, "tail-call marking").
//!
//! Disqualifiers: the call is not in tail position (anything but the
//! block's terminator follows it, or the terminator isn't a bare `Return`
//! of the call's own result), the callee `returns_twice` (`setjmp`-like),
//! the call is already a tail call, or a local whose address escaped is
//! still live at the call site (its storage must survive the call, which a
//! tail call's stack-frame reuse cannot guarantee). ABI-compatibility
//! between the caller's and callee's calling conventions is intentionally
//! not checked here — see `DESIGN.md`.

use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::FunctionAnalysis,
    instruction::OperandData,
    module::Module,
    opcode::Opcode,
    refs::FunctionId,
};

use crate::pass::Pass;

/// Marks directly-tail-position calls as `TailCall`.
#[derive(Debug, Default)]
pub struct TailCallMarking;

impl Pass for TailCallMarking {
    fn name(&self) -> &'static str {
        "tail-call-marking"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let func = module.function_mut(function)?;
        let (container, debug_info) = func.container_and_debug_mut();

        let mut changed = false;
        let mut dead_returns = Vec::new();

        for block in container.live_blocks().map(|b| b.id()).collect::<Vec<_>>() {
            let blk = container.block(block)?;
            let Some(terminator) = blk.last_instruction() else { continue };
            let Some(before_terminator) = previous_instruction(container, terminator) else { continue };

            let term_instr = container.instruction(terminator)?;
            let OperandData::Return(returned) = term_instr.operands else { continue };

            let call_instr = container.instruction(before_terminator)?;
            if call_instr.opcode != Opcode::Call && call_instr.opcode != Opcode::CallIndirect {
                continue;
            }
            if returned != before_terminator {
                continue;
            }
            let OperandData::Call(node_id) = call_instr.operands else { continue };
            let node = container.call_node(node_id)?;
            if node.returns_twice || node.is_tail_call {
                continue;
            }
            if debug_info.locals_of(before_terminator).is_some_and(|locals| !locals.is_empty()) {
                continue;
            }

            container.call_node_mut(node_id)?.is_tail_call = true;
            let call_instr_mut = container.instruction_mut(before_terminator)?;
            call_instr_mut.opcode = Opcode::TailCall;
            dead_returns.push(terminator);
            changed = true;
        }

        for id in dead_returns {
            container.remove_instruction(id)?;
        }
        debug_info.retain_live(container);

        if changed {
            analysis.invalidate();
        }
        Ok(changed)
    }
}

/// The instruction immediately preceding `id` in its own block's production
/// order, or `None` if `id` is the block's first instruction.
fn previous_instruction(container: &kefir_ir::container::CodeContainer, id: kefir_ir::refs::InstructionRef) -> Option<kefir_ir::refs::InstructionRef> {
    let instr = container.instruction(id).ok()?;
    let block_instrs = kefir_ir::analysis::block_instructions(container, instr.block);
    let position = block_instrs.iter().position(|&i| i == id)?;
    if position == 0 {
        None
    } else {
        Some(block_instrs[position - 1])
    }
}

#[cfg(test)]
mod tests {
    use kefir_ir::{
        call_node::{
            CallNode,
            Callee,
        },
        refs::{
            FunctionId,
            TypeId,
        },
    };

    use super::*;
    use crate::passes::test_support::module_with_function;

    #[test]
    fn marks_a_call_directly_returned_as_a_tail_call() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let node = container.new_call_node(CallNode::new(Callee::Direct(FunctionId::new(1)), Vec::new(), TypeId::new(0)));
            let call = container.append_instruction(entry, Opcode::Call, OperandData::Call(node)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(call)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = TailCallMarking.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let entry = module.function(FunctionId::new(0)).unwrap().entry();
        let terminator = container.block(entry).unwrap().last_instruction().unwrap();
        let instr = container.instruction(terminator).unwrap();
        assert_eq!(instr.opcode, Opcode::TailCall);
        let OperandData::Call(node_id) = instr.operands else { panic!() };
        assert!(container.call_node(node_id).unwrap().is_tail_call);
    }

    #[test]
    fn does_not_mark_a_returns_twice_call() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let mut node = CallNode::new(Callee::Direct(FunctionId::new(1)), Vec::new(), TypeId::new(0));
            node.returns_twice = true;
            let node_id = container.new_call_node(node);
            let call = container.append_instruction(entry, Opcode::Call, OperandData::Call(node_id)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(call)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = TailCallMarking.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(!changed);
    }

    #[test]
    fn does_not_mark_a_call_with_a_live_escaping_local() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let node = container.new_call_node(CallNode::new(Callee::Direct(FunctionId::new(1)), Vec::new(), TypeId::new(0)));
            let call = container.append_instruction(entry, Opcode::Call, OperandData::Call(node)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(call)).unwrap();
            entry
        });
        let entry = module.function(FunctionId::new(0)).unwrap().entry();
        let func = module.function_mut(FunctionId::new(0)).unwrap();
        let (container, debug_info) = func.container_and_debug_mut();
        let call = container.block(entry).unwrap().first_instruction().unwrap();
        debug_info.add_live_local(call, kefir_ir::refs::LocalIndex::new(0));

        let mut analysis = FunctionAnalysis::new();
        let changed = TailCallMarking.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(!changed, "a call with a live escaping local must not be marked tail");
    }
}
