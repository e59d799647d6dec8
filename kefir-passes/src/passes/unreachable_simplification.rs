//! Unreachable simplification: deletes every block unreachable from the
//! function entry, fixing up the predecessor lists and phi incoming
//! entries of the reachable blocks they used to feed (`spec.md` §4.3,
//! "unreachable simplification").

use hashbrown::HashSet;
use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::{
        self,
        FunctionAnalysis,
    },
    module::Module,
    refs::{
        BlockId,
        FunctionId,
        PhiId,
    },
};

use crate::pass::Pass;

/// Removes CFG-unreachable blocks.
#[derive(Debug, Default)]
pub struct UnreachableSimplification;

impl Pass for UnreachableSimplification {
    fn name(&self) -> &'static str {
        "unreachable-simplification"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let entry = module.function(function)?.entry();
        let container = module.function(function)?.container();
        let successors = analysis.successors(container)?.clone();
        let order = analysis::reverse_postorder(entry, &successors);
        let reachable: HashSet<BlockId> = order.into_iter().collect();

        let func = module.function_mut(function)?;
        let (container, debug_info) = func.container_and_debug_mut();

        let dead_blocks: Vec<BlockId> = container
            .live_blocks()
            .map(|b| b.id())
            .filter(|b| !reachable.contains(b))
            .collect();
        if dead_blocks.is_empty() {
            return Ok(false);
        }

        for &dead in &dead_blocks {
            for &succ in successors.of(dead) {
                if !reachable.contains(&succ) {
                    continue;
                }
                let phi_ids: Vec<PhiId> = container.block(succ)?.inputs().iter().map(|&(_, p)| p).collect();
                for phi_id in phi_ids {
                    container.phi_mut(phi_id)?.remove_incoming(dead);
                }
                container.block_mut(succ)?.remove_predecessor(dead);
            }
        }

        for &dead in &dead_blocks {
            for id in analysis::block_instructions(container, dead) {
                container.remove_instruction(id)?;
            }
            container.block_mut(dead)?.kill();
        }
        debug_info.retain_live(container);

        analysis.invalidate();
        Ok(true)
    }
}
