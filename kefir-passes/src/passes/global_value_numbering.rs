//! Dominator-tree-scoped value numbering (EarlyCSE-style): as the rename
//! walk descends the dominator tree, a pure instruction structurally equal
//! to one already seen on the path from the entry is replaced by that
//! earlier instruction; the scope is popped on return so a sibling subtree
//! never sees it (`spec.md` §4.3, "global value numbering").

use hashbrown::HashMap;
use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::{
        self,
        FunctionAnalysis,
    },
    container::CodeContainer,
    instruction::{
        Instruction,
        OperandData,
    },
    module::Module,
    opcode::Opcode,
    refs::{
        BlockId,
        FunctionId,
        InstructionRef,
    },
};

use crate::pass::Pass;

/// Coalesces redundant pure computations dominator-scope by dominator-scope.
#[derive(Debug, Default)]
pub struct GlobalValueNumbering;

impl Pass for GlobalValueNumbering {
    fn name(&self) -> &'static str {
        "global-value-numbering"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let entry = module.function(function)?.entry();
        let container = module.function(function)?.container();
        let dominators = analysis.dominators(container, entry)?.clone();

        let func = module.function_mut(function)?;
        let (container, debug_info) = func.container_and_debug_mut();

        let mut table: HashMap<ValueKey, InstructionRef> = HashMap::new();
        let mut replacements: HashMap<InstructionRef, InstructionRef> = HashMap::new();
        let mut dead: Vec<InstructionRef> = Vec::new();

        number(container, &dominators, entry, &mut table, &mut replacements, &mut dead);

        let changed = !replacements.is_empty();
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

/// The canonical identity of a pure instruction's computation: opcode plus
/// operand refs (sorted when the opcode is commutative, so `a+b` and `b+a`
/// number the same), plus a discriminant for operand data the ref list
/// alone does not capture (immediates, comparison kind, the type of a
/// cast). `GetBlockInput` is never keyed here: its `operand_refs()` is
/// empty (the incoming values live in the `Phi` pool, not the operand
/// data), so two distinct block inputs would otherwise collide on an
/// identical empty key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ValueKey {
    opcode: Opcode,
    refs: smallvec::SmallVec<[InstructionRef; 3]>,
    extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Extra {
    None,
    Int(i64),
    Compare(kefir_ir::opcode::CompareKind),
    Type(kefir_ir::refs::TypeId),
    Argument(u32),
}

fn value_key(instr: &Instruction) -> Option<ValueKey> {
    if !instr.opcode.is_pure() || instr.opcode == Opcode::GetBlockInput {
        return None;
    }
    let mut refs = instr.operand_refs();
    if instr.opcode.is_commutative() && refs.len() == 2 && refs[1] < refs[0] {
        refs.swap(0, 1);
    }
    let extra = match &instr.operands {
        OperandData::IntConst(v) => Extra::Int(*v),
        OperandData::RefWithImmediate(_, imm) => Extra::Int(*imm),
        OperandData::Compare(_, _, kind) => Extra::Compare(*kind),
        OperandData::RefWithType(_, ty) | OperandData::TypeOnly(ty) => Extra::Type(*ty),
        OperandData::Argument(idx) => Extra::Argument(*idx),
        _ => Extra::None,
    };
    Some(ValueKey {
        opcode: instr.opcode,
        refs,
        extra,
    })
}

fn number(
    container: &mut CodeContainer,
    dominators: &analysis::DominatorTree,
    block: BlockId,
    table: &mut HashMap<ValueKey, InstructionRef>,
    replacements: &mut HashMap<InstructionRef, InstructionRef>,
    dead: &mut Vec<InstructionRef>,
) {
    let mut inserted_here = Vec::new();

    for id in analysis::block_instructions(container, block) {
        let Ok(instr) = container.instruction(id) else { continue };
        let Some(key) = value_key(instr) else { continue };
        if let Some(&earlier) = table.get(&key) {
            replacements.insert(id, earlier);
            dead.push(id);
        } else {
            table.insert(key.clone(), id);
            inserted_here.push(key);
        }
    }

    for child in dominators.children(block) {
        number(container, dominators, child, table, replacements, dead);
    }

    for key in inserted_here {
        table.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use kefir_ir::refs::FunctionId;

    use super::*;
    use crate::passes::test_support::module_with_function;

    #[test]
    fn coalesces_a_repeated_pure_computation_on_the_same_path() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let a = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(2)).unwrap();
            let b = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(3)).unwrap();
            let sum1 = container.append_instruction(entry, Opcode::Add, OperandData::Binary(a, b)).unwrap();
            let sum2 = container.append_instruction(entry, Opcode::Add, OperandData::Binary(b, a)).unwrap();
            let product = container.append_instruction(entry, Opcode::Mul, OperandData::Binary(sum1, sum2)).unwrap();
            container.append_instruction(entry, Opcode::Return, OperandData::Return(product)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        let changed = GlobalValueNumbering.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let entry = module.function(FunctionId::new(0)).unwrap().entry();
        let terminator = container.block(entry).unwrap().last_instruction().unwrap();
        let OperandData::Return(returned) = container.instruction(terminator).unwrap().operands else { panic!() };
        let product_instr = container.instruction(returned).unwrap();
        let OperandData::Binary(lhs, rhs) = product_instr.operands else { panic!() };
        assert_eq!(lhs, rhs, "the commutative-equal sums should number the same");
    }

    #[test]
    fn does_not_coalesce_distinct_block_inputs() {
        let mut module = module_with_function("f", |container| {
            let entry = container.new_block("entry");
            let then_blk = container.new_block("then");
            let else_blk = container.new_block("else");
            let join = container.new_block("join");
            container.block_mut(then_blk).unwrap().add_predecessor(entry);
            container.block_mut(else_blk).unwrap().add_predecessor(entry);
            container.block_mut(join).unwrap().add_predecessor(then_blk);
            container.block_mut(join).unwrap().add_predecessor(else_blk);

            let cond = container.append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(1)).unwrap();
            container
                .append_instruction(
                    entry,
                    Opcode::BranchNonzero,
                    OperandData::Branch { condition: cond, if_true: then_blk, if_false: else_blk },
                )
                .unwrap();

            let then_val = container.append_instruction(then_blk, Opcode::ConstInt8, OperandData::IntConst(1)).unwrap();
            container.append_instruction(then_blk, Opcode::Jump, OperandData::Jump(join)).unwrap();
            let else_val = container.append_instruction(else_blk, Opcode::ConstInt8, OperandData::IntConst(1)).unwrap();
            container.append_instruction(else_blk, Opcode::Jump, OperandData::Jump(join)).unwrap();

            let phi_a = container.new_phi(join);
            container.phi_mut(phi_a).unwrap().set_incoming(then_blk, then_val);
            container.phi_mut(phi_a).unwrap().set_incoming(else_blk, else_val);
            let input_a = container.append_instruction(join, Opcode::GetBlockInput, OperandData::BlockInput(phi_a)).unwrap();
            container.block_mut(join).unwrap().push_input(input_a, phi_a);

            let phi_b = container.new_phi(join);
            container.phi_mut(phi_b).unwrap().set_incoming(then_blk, then_val);
            container.phi_mut(phi_b).unwrap().set_incoming(else_blk, else_val);
            let input_b = container.append_instruction(join, Opcode::GetBlockInput, OperandData::BlockInput(phi_b)).unwrap();
            container.block_mut(join).unwrap().push_input(input_b, phi_b);

            let sum = container.append_instruction(join, Opcode::Add, OperandData::Binary(input_a, input_b)).unwrap();
            container.append_instruction(join, Opcode::Return, OperandData::Return(sum)).unwrap();
            entry
        });
        let mut analysis = FunctionAnalysis::new();
        GlobalValueNumbering.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();

        let container = module.function(FunctionId::new(0)).unwrap().container();
        let remaining_inputs = container
            .live_instruction_refs()
            .filter(|&id| container.instruction(id).unwrap().opcode == Opcode::GetBlockInput)
            .count();
        assert_eq!(remaining_inputs, 2, "two distinct phis must not collapse to one value number");
    }
}
