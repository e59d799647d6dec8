//! Liveness of block inputs and ordinary SSA values, across basic block
//! boundaries (`spec.md` §4, "liveness of block inputs"); consumed by
//! lowering and by the asmcmp register-allocation bridge.

use hashbrown::{
    HashMap,
    HashSet,
};
use kefir_diagnostics::KefirResult;

use crate::{
    container::CodeContainer,
    refs::{
        BlockId,
        InstructionRef,
    },
};

use super::{
    block_instructions,
    CfgSuccessors,
};

/// Per-block live-in/live-out value sets, computed by the standard
/// backward dataflow fixpoint. A phi's incoming value is treated as a use
/// in the *predecessor* block it flows from, since that is where the value
/// must still be live for the control transfer to carry it (the classic
/// SSA liveness construction).
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    live_in: HashMap<BlockId, HashSet<InstructionRef>>,
    live_out: HashMap<BlockId, HashSet<InstructionRef>>,
}

impl Liveness {
    /// Compute liveness over every block reachable from `entry`.
    pub fn compute(container: &CodeContainer, successors: &CfgSuccessors, entry: BlockId) -> KefirResult<Self> {
        let order = super::reverse_postorder(entry, successors);

        let mut defs: HashMap<BlockId, HashSet<InstructionRef>> = HashMap::new();
        let mut uses: HashMap<BlockId, HashSet<InstructionRef>> = HashMap::new();

        for &block in &order {
            let mut block_defs = HashSet::new();
            let mut block_uses = HashSet::new();
            for id in block_instructions(container, block) {
                let instr = container.instruction(id)?;
                for operand in instr.operand_refs() {
                    if !block_defs.contains(&operand) {
                        block_uses.insert(operand);
                    }
                }
                block_defs.insert(id);
            }
            for &pred in container.block(block)?.predecessors() {
                for (_, phi) in container.block(block)?.inputs() {
                    let phi = container.phi(*phi)?;
                    if let Some(incoming) = phi.incoming_from(pred) {
                        uses.entry(pred).or_default().insert(incoming);
                    }
                }
            }
            defs.insert(block, block_defs);
            uses.entry(block).or_default().extend(block_uses);
        }

        let mut live_in: HashMap<BlockId, HashSet<InstructionRef>> = order.iter().map(|&b| (b, HashSet::new())).collect();
        let mut live_out: HashMap<BlockId, HashSet<InstructionRef>> = order.iter().map(|&b| (b, HashSet::new())).collect();

        let mut changed = true;
        while changed {
            changed = false;
            for &block in order.iter().rev() {
                let mut out = HashSet::new();
                for &succ in successors.of(block) {
                    if let Some(succ_in) = live_in.get(&succ) {
                        out.extend(succ_in.iter().copied());
                    }
                }
                let block_defs = &defs[&block];
                let block_uses = &uses[&block];
                let mut new_in = block_uses.clone();
                new_in.extend(out.iter().copied().filter(|v| !block_defs.contains(v)));

                if live_out[&block] != out {
                    live_out.insert(block, out);
                    changed = true;
                }
                if live_in[&block] != new_in {
                    live_in.insert(block, new_in);
                    changed = true;
                }
            }
        }

        Ok(Self { live_in, live_out })
    }

    /// Values live on entry to `block`.
    pub fn live_in(&self, block: BlockId) -> impl Iterator<Item = InstructionRef> + '_ {
        self.live_in.get(&block).into_iter().flatten().copied()
    }

    /// Values live on exit from `block`.
    pub fn live_out(&self, block: BlockId) -> impl Iterator<Item = InstructionRef> + '_ {
        self.live_out.get(&block).into_iter().flatten().copied()
    }

    /// Whether `value` is live out of `block`.
    pub fn is_live_out(&self, block: BlockId, value: InstructionRef) -> bool {
        self.live_out.get(&block).is_some_and(|set| set.contains(&value))
    }
}

