//! Local-to-SSA promotion: replaces `Load`/`Store` traffic through a
//! non-escaping local with direct SSA values, inserting block inputs at the
//! dominance frontier of the local's store set (Cytron/Ferrante/Rosen/Zadeck;
//! `spec.md` §4.3, "mem2reg").

use hashbrown::{
    HashMap,
    HashSet,
};
use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::{
        self,
        FunctionAnalysis,
    },
    container::CodeContainer,
    instruction::OperandData,
    module::Module,
    opcode::Opcode,
    refs::{
        BlockId,
        FunctionId,
        InstructionRef,
        LocalIndex,
        TypeId,
    },
};

use crate::pass::Pass;

/// Promotes every non-escaping local to SSA values.
#[derive(Debug, Default)]
pub struct Mem2Reg;

impl Pass for Mem2Reg {
    fn name(&self) -> &'static str {
        "mem2reg"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let entry = module.function(function)?.entry();
        let container = module.function(function)?.container();
        let locals = promotable_locals(container);
        if locals.is_empty() {
            return Ok(false);
        }

        let dominators = analysis.dominators(container, entry)?.clone();
        let frontiers = dominators.dominance_frontiers(container);

        let func = module.function_mut(function)?;
        let (container, debug_info) = func.container_and_debug_mut();

        let mut changed = false;
        let mut replacements: HashMap<InstructionRef, InstructionRef> = HashMap::new();
        let mut dead: Vec<InstructionRef> = Vec::new();

        for local in locals {
            let addr_instructions = local.addr_instructions;
            let phis = place_phis(container, &local.def_blocks, &frontiers);
            if !phis.is_empty() {
                changed = true;
            }

            // A load with no reaching store (reading uninitialized storage,
            // undefined behavior at the source level) gets the standard
            // mem2reg treatment: redirect it to a synthesized `Undefined`
            // rather than leave it dangling once the local's `LocalAddr`
            // is removed.
            let mut undef: Option<InstructionRef> = None;
            rename(
                container,
                &dominators,
                entry,
                entry,
                &addr_instructions,
                &phis,
                None,
                &mut replacements,
                &mut dead,
                &mut undef,
            );

            for &addr in &addr_instructions {
                dead.push(addr);
            }
        }

        container.apply_replacements(&replacements);
        for (&from, &to) in &replacements {
            debug_info.transfer(from, to);
        }
        for id in dead {
            container.remove_instruction(id)?;
        }
        debug_info.retain_live(container);

        Ok(changed)
    }
}

struct PromotableLocal {
    addr_instructions: Vec<InstructionRef>,
    def_blocks: HashSet<BlockId>,
}

/// Every local whose address never escapes a `Load`'s address operand or a
/// `Store`'s address operand (storing the address itself as data, or using
/// it any other way, disqualifies promotion).
fn promotable_locals(container: &CodeContainer) -> Vec<PromotableLocal> {
    let mut by_local: HashMap<LocalIndex, Vec<InstructionRef>> = HashMap::new();
    for id in container.live_instruction_refs() {
        let Ok(instr) = container.instruction(id) else { continue };
        if instr.opcode != Opcode::LocalAddr {
            continue;
        }
        let OperandData::Local(local) = &instr.operands else { continue };
        by_local.entry(*local).or_default().push(id);
    }

    let usedef_users = |container: &CodeContainer, addr: InstructionRef| -> Vec<InstructionRef> {
        container
            .live_instruction_refs()
            .filter(|&id| container.instruction(id).is_ok_and(|i| i.operand_refs().contains(&addr)))
            .collect()
    };

    let mut result = Vec::new();
    'locals: for (_, addr_instructions) in by_local {
        let mut def_blocks = HashSet::new();
        for &addr in &addr_instructions {
            for user in usedef_users(container, addr) {
                let Ok(user_instr) = container.instruction(user) else { continue 'locals };
                let escapes = match &user_instr.operands {
                    OperandData::RefWithType(a, _) if user_instr.opcode == Opcode::Load => *a != addr,
                    OperandData::Binary(a, _) if user_instr.opcode == Opcode::Store => *a != addr,
                    _ => true,
                };
                if escapes {
                    continue 'locals;
                }
                if user_instr.opcode == Opcode::Store {
                    def_blocks.insert(user_instr.block);
                }
            }
        }
        result.push(PromotableLocal {
            addr_instructions,
            def_blocks,
        });
    }
    result
}

/// Insert a `GetBlockInput` at every block in the iterated dominance
/// frontier of `def_blocks` (the standard phi-placement fixpoint), returning
/// the map from block to the phi instruction placed there.
fn place_phis(
    container: &mut CodeContainer,
    def_blocks: &HashSet<BlockId>,
    frontiers: &HashMap<BlockId, HashSet<BlockId>>,
) -> HashMap<BlockId, InstructionRef> {
    let mut has_phi: HashMap<BlockId, InstructionRef> = HashMap::new();
    let mut worklist: Vec<BlockId> = def_blocks.iter().copied().collect();
    let mut queued: HashSet<BlockId> = def_blocks.iter().copied().collect();

    while let Some(block) = worklist.pop() {
        let Some(frontier) = frontiers.get(&block) else { continue };
        for &target in frontier {
            if has_phi.contains_key(&target) {
                continue;
            }
            let phi = container.new_phi(target);
            let input = container
                .insert_before_terminator(target, Opcode::GetBlockInput, OperandData::BlockInput(phi))
                .expect("target block exists");
            container.block_mut(target).expect("target block exists").push_input(input, phi);
            has_phi.insert(target, input);
            if queued.insert(target) {
                worklist.push(target);
            }
        }
    }
    has_phi
}

/// Dominator-tree-rooted rename: `current` is the SSA value the local holds
/// on entry to `block`. Loads of the local are redirected to `current`;
/// stores update it; the block's own phi (if any) becomes the new current
/// value before processing the block's instructions.
#[allow(clippy::too_many_arguments)]
fn rename(
    container: &mut CodeContainer,
    dominators: &analysis::DominatorTree,
    entry: BlockId,
    block: BlockId,
    addr_instructions: &[InstructionRef],
    phis: &HashMap<BlockId, InstructionRef>,
    mut current: Option<InstructionRef>,
    replacements: &mut HashMap<InstructionRef, InstructionRef>,
    dead: &mut Vec<InstructionRef>,
    undef: &mut Option<InstructionRef>,
) {
    if let Some(&phi_value) = phis.get(&block) {
        current = Some(phi_value);
    }

    for id in analysis::block_instructions(container, block) {
        let Ok(instr) = container.instruction(id) else { continue };
        match &instr.operands {
            OperandData::RefWithType(addr, _) if instr.opcode == Opcode::Load && addr_instructions.contains(addr) => {
                let value = match current {
                    Some(value) => value,
                    None => {
                        if undef.is_none() {
                            *undef = Some(
                                container
                                    .append_instruction(entry, Opcode::Undefined, OperandData::TypeOnly(TypeId::new(0)))
                                    .expect("entry block is always live"),
                            );
                        }
                        undef.expect("just populated")
                    }
                };
                replacements.insert(id, value);
                dead.push(id);
            }
            OperandData::Binary(addr, value) if instr.opcode == Opcode::Store && addr_instructions.contains(addr) => {
                current = Some(*value);
                dead.push(id);
            }
            _ => {}
        }
    }

    if let Ok(successors) = analysis::successors_of(container, block) {
        for succ in successors {
            if let Some(&phi) = phis.get(&succ) {
                if let Ok(phi_node) = container.instruction(phi) {
                    let OperandData::BlockInput(phi_id) = &phi_node.operands else { continue };
                    let phi_id = *phi_id;
                    if let Some(value) = current {
                        let _ = container.phi_mut(phi_id).map(|p| p.set_incoming(block, value));
                    }
                }
            }
        }
    }

    for child in dominators.children(block) {
        rename(
            container,
            dominators,
            entry,
            child,
            addr_instructions,
            phis,
            current,
            replacements,
            dead,
            undef,
        );
    }
}
