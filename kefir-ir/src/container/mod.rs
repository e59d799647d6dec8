//! The per-function code container: the arena-plus-index pool that owns
//! every instruction, block, phi, call node and inline-assembly node
//! (`spec.md` §3, "code_container"; §9, "Arena-plus-index discipline").

mod bigint_const;
mod switch_table;

pub use bigint_const::BigIntConst;
pub use switch_table::SwitchTable;

use hashbrown::HashMap;
use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::{
    block::Block,
    call_node::CallNode,
    inline_asm::InlineAssemblyNode,
    instruction::{
        Instruction,
        OperandData,
    },
    opcode::Opcode,
    phi::Phi,
    refs::{
        BigIntConstId,
        BlockId,
        CallNodeId,
        InlineAsmId,
        InstructionRef,
        PhiId,
        SwitchTableId,
    },
};

/// The pool of instructions, blocks, phis, call nodes, inline-assembly
/// nodes and out-of-line constant tables that together make up one
/// function's SSA body.
#[derive(Debug, Default)]
pub struct CodeContainer {
    instructions: Vec<Instruction>,
    free_instructions: Vec<InstructionRef>,
    blocks: Vec<Block>,
    phis: Vec<Phi>,
    call_nodes: Vec<CallNode>,
    inline_asm_nodes: Vec<InlineAssemblyNode>,
    bigint_consts: Vec<BigIntConst>,
    switch_tables: Vec<SwitchTable>,
}

impl CodeContainer {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- blocks ----------------------------------------------------

    /// Allocate a new, empty block.
    pub fn new_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Block::new(id, label));
        id
    }

    /// Read access to a block.
    pub fn block(&self, id: BlockId) -> KefirResult<&Block> {
        self.blocks
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.blocks.len()))
    }

    /// Mutable access to a block.
    pub fn block_mut(&mut self, id: BlockId) -> KefirResult<&mut Block> {
        let len = self.blocks.len();
        self.blocks
            .get_mut(id.as_usize())
            .ok_or(KefirError::out_of_bounds(id.as_usize(), len))
    }

    /// Every block, live and dead, in allocation order. Passes that must
    /// skip removed blocks should check [`Block::is_alive`].
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Iterate over live blocks, in allocation order.
    pub fn live_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.is_alive())
    }

    // ---- instructions ------------------------------------------------

    /// Append `opcode`/`operands` to the end of `block`, returning its ref.
    pub fn append_instruction(
        &mut self,
        block: BlockId,
        opcode: Opcode,
        operands: OperandData,
    ) -> KefirResult<InstructionRef> {
        let sequence = self.block(block)?.last_instruction().map_or(0, |last| {
            self.instructions[last.as_usize()].sequence + 1
        });
        let instr = Instruction {
            opcode,
            operands,
            block,
            sequence,
        };
        let id = self.alloc_instruction(instr);
        let block_ref = self.block_mut(block)?;
        block_ref.set_first(id);
        block_ref.set_last(id);
        Ok(id)
    }

    /// Insert `opcode`/`operands` into `block` immediately before its
    /// current terminator, instead of after it. `append_instruction` always
    /// makes the newly appended instruction `Block::last_instruction()`,
    /// which is correct only while a block has no terminator yet; a pass
    /// that needs to splice a new value-producing instruction into a block
    /// that is already terminated (mem2reg placing a block input, constant
    /// folding materializing a folded constant) must use this instead, or
    /// the terminator stops being `last_instruction()` and
    /// [`crate::analysis::successors_of`] silently stops finding the
    /// block's successors (`spec.md` §3, invariant 2; §8).
    ///
    /// Falls back to [`Self::append_instruction`] if `block` has no
    /// terminator yet (e.g. during construction, before the block's body is
    /// built).
    pub fn insert_before_terminator(
        &mut self,
        block: BlockId,
        opcode: Opcode,
        operands: OperandData,
    ) -> KefirResult<InstructionRef> {
        let Some(terminator) = self.block(block)?.last_instruction() else {
            return self.append_instruction(block, opcode, operands);
        };
        let terminator_sequence = self.instructions[terminator.as_usize()].sequence;
        let instr = Instruction {
            opcode,
            operands,
            block,
            sequence: terminator_sequence,
        };
        let id = self.alloc_instruction(instr);
        self.instructions[terminator.as_usize()].sequence = terminator_sequence + 1;
        Ok(id)
    }

    fn alloc_instruction(&mut self, instr: Instruction) -> InstructionRef {
        if let Some(reused) = self.free_instructions.pop() {
            self.instructions[reused.as_usize()] = instr;
            reused
        } else {
            let id = InstructionRef::new(self.instructions.len() as u32);
            self.instructions.push(instr);
            id
        }
    }

    /// Read access to an instruction.
    pub fn instruction(&self, id: InstructionRef) -> KefirResult<&Instruction> {
        self.instructions
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.instructions.len()))
    }

    /// Mutable access to an instruction, used by rewrite helpers that
    /// replace one instruction's opcode/operands in place to preserve its
    /// ref and debug-info entry (`spec.md` §4.5).
    pub fn instruction_mut(&mut self, id: InstructionRef) -> KefirResult<&mut Instruction> {
        let len = self.instructions.len();
        self.instructions
            .get_mut(id.as_usize())
            .ok_or(KefirError::out_of_bounds(id.as_usize(), len))
    }

    /// Mark an instruction dead, replacing its slot with a tombstone and
    /// returning it to the free-list for reuse (`spec.md` §3,
    /// "Lifecycles").
    pub fn remove_instruction(&mut self, id: InstructionRef) -> KefirResult<()> {
        let slot = self
            .instructions
            .get_mut(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.instructions.len()))?;
        *slot = Instruction::tombstone();
        self.free_instructions.push(id);
        Ok(())
    }

    /// Number of instruction slots, including tombstones.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Iterate over all live (non-tombstone) instruction refs, in dense
    /// allocation order. Callers needing a specific traversal order
    /// (dominator-tree pre-order, reverse post-order) build it from the
    /// relevant [`crate::analysis`] object instead.
    pub fn live_instruction_refs(&self) -> impl Iterator<Item = InstructionRef> + '_ {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, instr)| !instr.is_tombstone())
            .map(|(idx, _)| InstructionRef::new(idx as u32))
    }

    // ---- phis ----------------------------------------------------------

    /// Allocate a new phi owned by `owner`.
    pub fn new_phi(&mut self, owner: BlockId) -> PhiId {
        let id = PhiId::new(self.phis.len() as u32);
        self.phis.push(Phi::new(owner));
        id
    }

    /// Read access to a phi.
    pub fn phi(&self, id: PhiId) -> KefirResult<&Phi> {
        self.phis
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.phis.len()))
    }

    /// Mutable access to a phi.
    pub fn phi_mut(&mut self, id: PhiId) -> KefirResult<&mut Phi> {
        let len = self.phis.len();
        self.phis
            .get_mut(id.as_usize())
            .ok_or(KefirError::out_of_bounds(id.as_usize(), len))
    }

    // ---- call nodes ------------------------------------------------------

    /// Allocate a new call node.
    pub fn new_call_node(&mut self, node: CallNode) -> CallNodeId {
        let id = CallNodeId::new(self.call_nodes.len() as u32);
        self.call_nodes.push(node);
        id
    }

    /// Read access to a call node.
    pub fn call_node(&self, id: CallNodeId) -> KefirResult<&CallNode> {
        self.call_nodes
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.call_nodes.len()))
    }

    /// Mutable access to a call node, used by tail-call marking.
    pub fn call_node_mut(&mut self, id: CallNodeId) -> KefirResult<&mut CallNode> {
        let len = self.call_nodes.len();
        self.call_nodes
            .get_mut(id.as_usize())
            .ok_or(KefirError::out_of_bounds(id.as_usize(), len))
    }

    // ---- inline assembly -------------------------------------------------

    /// Allocate a new inline-assembly node.
    pub fn new_inline_asm(&mut self, node: InlineAssemblyNode) -> InlineAsmId {
        let id = InlineAsmId::new(self.inline_asm_nodes.len() as u32);
        self.inline_asm_nodes.push(node);
        id
    }

    /// Read access to an inline-assembly node.
    pub fn inline_asm(&self, id: InlineAsmId) -> KefirResult<&InlineAssemblyNode> {
        self.inline_asm_nodes
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.inline_asm_nodes.len()))
    }

    // ---- bigint constants --------------------------------------------------

    /// Intern a wide `_BitInt` constant's digit sequence.
    pub fn push_bigint_const(&mut self, value: BigIntConst) -> BigIntConstId {
        let id = BigIntConstId::new(self.bigint_consts.len() as u32);
        self.bigint_consts.push(value);
        id
    }

    /// Read access to a bigint constant.
    pub fn bigint_const(&self, id: BigIntConstId) -> KefirResult<&BigIntConst> {
        self.bigint_consts
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.bigint_consts.len()))
    }

    // ---- switch tables -----------------------------------------------------

    /// Intern a switch case table.
    pub fn push_switch_table(&mut self, table: SwitchTable) -> SwitchTableId {
        let id = SwitchTableId::new(self.switch_tables.len() as u32);
        self.switch_tables.push(table);
        id
    }

    /// Read access to a switch table.
    pub fn switch_table(&self, id: SwitchTableId) -> KefirResult<&SwitchTable> {
        self.switch_tables
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.switch_tables.len()))
    }

    // ---- rewrites ----------------------------------------------------------

    /// Rewrite every operand across every live instruction and phi incoming
    /// value through `replacements`, the common cleanup every pass that
    /// eliminates an instruction needs to redirect its former users
    /// (`spec.md` §4.3). Chained replacements (`a -> b -> c`) resolve to
    /// their final target.
    pub fn apply_replacements(&mut self, replacements: &HashMap<InstructionRef, InstructionRef>) {
        if replacements.is_empty() {
            return;
        }
        let resolve = |mut current: InstructionRef| {
            let mut steps = 0;
            while let Some(&next) = replacements.get(&current) {
                if next == current || steps > replacements.len() {
                    break;
                }
                current = next;
                steps += 1;
            }
            current
        };
        for instr in &mut self.instructions {
            if instr.is_tombstone() {
                continue;
            }
            instr.map_refs(resolve);
        }
        for phi in &mut self.phis {
            let entries: Vec<_> = phi.entries().collect();
            for (pred, value) in entries {
                phi.set_incoming(pred, resolve(value));
            }
        }
    }
}
