//! On-demand, per-function analyses: dominators, loop structure, use-def
//! chains and block-input liveness (`spec.md` §4, "Analysis (~12%)").
//!
//! Analyses are not carried on [`crate::function::OptFunction`] itself;
//! they are owned by a transient [`FunctionAnalysis`] keyed by function id
//! and recomputed when invalidated (`spec.md` §3, "Ownership model"), the
//! idiomatic equivalent of an arena freed in bulk once the requesting pass
//! finishes with it.

mod dominators;
mod liveness;
mod loops;
mod usedef;

pub use dominators::DominatorTree;
pub use liveness::Liveness;
pub use loops::{
    Loop,
    LoopForest,
};
pub use usedef::UseDefChains;

use hashbrown::HashMap;
use kefir_diagnostics::KefirResult;

use crate::{
    container::CodeContainer,
    instruction::OperandData,
    refs::{
        BlockId,
        FunctionId,
    },
};

/// Control-flow successors of every live block, read from each block's
/// terminator operand data rather than tracked incrementally (`spec.md`
/// §4, "computed on demand").
#[derive(Debug, Clone, Default)]
pub struct CfgSuccessors {
    by_block: HashMap<BlockId, Vec<BlockId>>,
}

impl CfgSuccessors {
    /// Compute successors for every live block in `container`.
    pub fn compute(container: &CodeContainer) -> KefirResult<Self> {
        let mut by_block = HashMap::new();
        for block in container.live_blocks() {
            by_block.insert(block.id(), successors_of(container, block.id())?);
        }
        Ok(Self { by_block })
    }

    /// `block`'s successors, empty if `block` has no terminator yet or is
    /// not part of this computation.
    pub fn of(&self, block: BlockId) -> &[BlockId] {
        self.by_block.get(&block).map_or(&[], Vec::as_slice)
    }
}

/// `block`'s control-flow successors read directly from its terminator,
/// without building a full [`CfgSuccessors`] map; passes that only need one
/// block's successors (e.g. mem2reg wiring a single block input) use this
/// instead of paying for the whole-function computation.
pub fn successors_of(container: &CodeContainer, block: BlockId) -> KefirResult<Vec<BlockId>> {
    let blk = container.block(block)?;
    let Some(last) = blk.last_instruction() else {
        return Ok(Vec::new());
    };
    let instr = container.instruction(last)?;
    Ok(match &instr.operands {
        OperandData::Jump(target) => vec![*target],
        OperandData::Branch { if_true, if_false, .. } => vec![*if_true, *if_false],
        OperandData::BranchCompare { if_true, if_false, .. } => vec![*if_true, *if_false],
        OperandData::Switch { table, default, .. } => {
            let table = container.switch_table(*table)?;
            let mut targets: Vec<BlockId> = table.cases.iter().map(|&(_, target)| target).collect();
            targets.push(*default);
            targets
        }
        _ => Vec::new(),
    })
}

/// Every live block reachable from `entry`, in reverse-postorder; unreached
/// blocks are omitted (mirrors the traversal order construction itself
/// uses, `spec.md` §4.2 step 4).
pub fn reverse_postorder(entry: BlockId, successors: &CfgSuccessors) -> Vec<BlockId> {
    let mut visited = hashbrown::HashSet::new();
    let mut postorder = Vec::new();
    let mut stack = vec![(entry, false)];
    while let Some((block, expanded)) = stack.pop() {
        if expanded {
            postorder.push(block);
            continue;
        }
        if !visited.insert(block) {
            continue;
        }
        stack.push((block, true));
        for &succ in successors.of(block) {
            if !visited.contains(&succ) {
                stack.push((succ, false));
            }
        }
    }
    postorder.reverse();
    postorder
}

/// `block`'s instructions in production order, found by filtering the
/// container's dense instruction vector rather than threading explicit
/// next-instruction links (`spec.md` §3 only promises block-local
/// production order via `sequence`, not a linked list).
pub fn block_instructions(container: &CodeContainer, block: BlockId) -> Vec<crate::refs::InstructionRef> {
    let mut refs: Vec<_> = container
        .live_instruction_refs()
        .filter(|&id| container.instruction(id).is_ok_and(|i| i.block == block))
        .collect();
    // Block inputs are conceptually evaluated before every other instruction
    // in the block regardless of when a pass inserted them, so they always
    // sort first; otherwise production order (`sequence`) applies.
    refs.sort_by_key(|&id| {
        let instr = container.instruction(id).expect("filtered live above");
        (instr.opcode != crate::opcode::Opcode::GetBlockInput, instr.sequence)
    });
    refs
}

/// Every analysis derivable from one function's SSA body, computed lazily
/// on first access and cached until [`Self::invalidate`] is called.
#[derive(Debug, Default)]
pub struct FunctionAnalysis {
    successors: Option<CfgSuccessors>,
    dominators: Option<DominatorTree>,
    loops: Option<LoopForest>,
    usedef: Option<UseDefChains>,
    liveness: Option<Liveness>,
}

impl FunctionAnalysis {
    /// A cache with nothing computed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached analysis, forcing recomputation on next access
    /// (call after a pass mutates the function's `CodeContainer`).
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Control-flow successors, computed and cached on first call.
    pub fn successors(&mut self, container: &CodeContainer) -> KefirResult<&CfgSuccessors> {
        if self.successors.is_none() {
            self.successors = Some(CfgSuccessors::compute(container)?);
        }
        Ok(self.successors.as_ref().expect("just populated"))
    }

    /// The dominator tree rooted at `entry`, computed and cached on first
    /// call.
    pub fn dominators(&mut self, container: &CodeContainer, entry: BlockId) -> KefirResult<&DominatorTree> {
        if self.dominators.is_none() {
            let successors = self.successors(container)?.clone();
            let order = reverse_postorder(entry, &successors);
            self.dominators = Some(DominatorTree::compute(entry, &order, container));
        }
        Ok(self.dominators.as_ref().expect("just populated"))
    }

    /// The natural-loop forest, computed and cached on first call.
    pub fn loops(&mut self, container: &CodeContainer, entry: BlockId) -> KefirResult<&LoopForest> {
        if self.loops.is_none() {
            let successors = self.successors(container)?.clone();
            let dominators = self.dominators(container, entry)?.clone();
            self.loops = Some(LoopForest::compute(container, &successors, &dominators));
        }
        Ok(self.loops.as_ref().expect("just populated"))
    }

    /// Use-def chains over every live instruction, computed and cached on
    /// first call.
    pub fn usedef(&mut self, container: &CodeContainer) -> KefirResult<&UseDefChains> {
        if self.usedef.is_none() {
            self.usedef = Some(UseDefChains::compute(container)?);
        }
        Ok(self.usedef.as_ref().expect("just populated"))
    }

    /// Per-block liveness of SSA values (including block inputs), computed
    /// and cached on first call.
    pub fn liveness(&mut self, container: &CodeContainer, entry: BlockId) -> KefirResult<&Liveness> {
        if self.liveness.is_none() {
            let successors = self.successors(container)?.clone();
            self.liveness = Some(Liveness::compute(container, &successors, entry)?);
        }
        Ok(self.liveness.as_ref().expect("just populated"))
    }
}

/// Keyed cache of per-function analyses, owned by whatever driver runs the
/// transformation pipeline (`spec.md` §3).
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<FunctionId, FunctionAnalysis>,
}

impl AnalysisCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The analysis object for `function`, creating an empty one on first
    /// access.
    pub fn get_mut(&mut self, function: FunctionId) -> &mut FunctionAnalysis {
        self.entries.entry(function).or_default()
    }

    /// Drop `function`'s cached analyses, e.g. after a pass rewrites it.
    pub fn invalidate(&mut self, function: FunctionId) {
        self.entries.remove(&function);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        opcode::Opcode,
        refs::InstructionRef,
    };

    /// `if (cond) 20 else 10; return` as a hand-built `CodeContainer`,
    /// independent of stack-IR construction, to exercise the analyses on
    /// their own terms.
    #[allow(clippy::type_complexity)]
    fn diamond_container() -> (
        CodeContainer,
        BlockId,
        BlockId,
        BlockId,
        BlockId,
        InstructionRef,
        InstructionRef,
        InstructionRef,
        InstructionRef,
    ) {
        let mut container = CodeContainer::new();
        let entry = container.new_block("entry");
        let then_blk = container.new_block("then");
        let else_blk = container.new_block("else");
        let join = container.new_block("join");

        container.block_mut(then_blk).unwrap().add_predecessor(entry);
        container.block_mut(else_blk).unwrap().add_predecessor(entry);
        container.block_mut(join).unwrap().add_predecessor(then_blk);
        container.block_mut(join).unwrap().add_predecessor(else_blk);

        let cond = container
            .append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(1))
            .unwrap();
        container
            .append_instruction(
                entry,
                Opcode::BranchNonzero,
                OperandData::Branch {
                    condition: cond,
                    if_true: then_blk,
                    if_false: else_blk,
                },
            )
            .unwrap();

        let then_val = container
            .append_instruction(then_blk, Opcode::ConstInt8, OperandData::IntConst(20))
            .unwrap();
        container
            .append_instruction(then_blk, Opcode::Jump, OperandData::Jump(join))
            .unwrap();

        let else_val = container
            .append_instruction(else_blk, Opcode::ConstInt8, OperandData::IntConst(10))
            .unwrap();
        container
            .append_instruction(else_blk, Opcode::Jump, OperandData::Jump(join))
            .unwrap();

        let phi = container.new_phi(join);
        container.phi_mut(phi).unwrap().set_incoming(then_blk, then_val);
        container.phi_mut(phi).unwrap().set_incoming(else_blk, else_val);
        let merged = container
            .append_instruction(join, Opcode::GetBlockInput, OperandData::BlockInput(phi))
            .unwrap();
        container.block_mut(join).unwrap().push_input(merged, phi);
        container
            .append_instruction(join, Opcode::Return, OperandData::Return(merged))
            .unwrap();

        (container, entry, then_blk, else_blk, join, cond, then_val, else_val, merged)
    }

    #[test]
    fn dominator_tree_finds_entry_dominates_every_block() {
        let (container, entry, then_blk, else_blk, join, ..) = diamond_container();
        let successors = CfgSuccessors::compute(&container).unwrap();
        let order = reverse_postorder(entry, &successors);
        let dominators = DominatorTree::compute(entry, &order, &container);

        assert_eq!(dominators.immediate_dominator(join), Some(entry));
        assert_eq!(dominators.immediate_dominator(then_blk), Some(entry));
        assert_eq!(dominators.immediate_dominator(else_blk), Some(entry));
        assert!(dominators.dominates(entry, join));
        assert!(!dominators.dominates(then_blk, join));
    }

    #[test]
    fn loop_forest_is_empty_for_an_acyclic_diamond() {
        let (container, entry, ..) = diamond_container();
        let successors = CfgSuccessors::compute(&container).unwrap();
        let order = reverse_postorder(entry, &successors);
        let dominators = DominatorTree::compute(entry, &order, &container);
        let loops = LoopForest::compute(&container, &successors, &dominators);

        assert!(loops.loops().is_empty());
    }

    #[test]
    fn usedef_chains_track_phi_incoming_values_as_uses() {
        let (container, _entry, _then_blk, _else_blk, _join, cond, then_val, else_val, merged) = diamond_container();
        let usedef = UseDefChains::compute(&container).unwrap();

        assert!(usedef.users_of(then_val).contains(&merged));
        assert!(usedef.users_of(else_val).contains(&merged));
        assert!(!usedef.is_unused(cond));
        assert!(!usedef.is_unused(merged));
    }

    #[test]
    fn liveness_keeps_phi_sources_live_out_of_their_predecessor() {
        let (container, entry, then_blk, else_blk, join, ..) = diamond_container();
        let successors = CfgSuccessors::compute(&container).unwrap();
        let liveness = Liveness::compute(&container, &successors, entry).unwrap();

        assert!(liveness.is_live_out(then_blk,
            container.block(then_blk).unwrap().first_instruction().unwrap()));
        assert!(liveness.is_live_out(else_blk,
            container.block(else_blk).unwrap().first_instruction().unwrap()));
        assert!(!liveness.is_live_out(join, container.block(join).unwrap().first_instruction().unwrap()));
    }

    #[test]
    fn function_analysis_cache_recomputes_after_invalidation() {
        let (container, entry, ..) = diamond_container();
        let mut analysis = FunctionAnalysis::new();
        let first = analysis.dominators(&container, entry).unwrap().clone();
        analysis.invalidate();
        let second = analysis.dominators(&container, entry).unwrap().clone();
        assert_eq!(first.immediate_dominator(entry), second.immediate_dominator(entry));
    }
}
