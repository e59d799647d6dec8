//! Basic block records.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::refs::{
    BlockId,
    InstructionRef,
    PhiId,
};

bitflags! {
    /// Per-block flags (`spec.md` §3, "public/private flags").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u8 {
        /// The block is reachable from the function entry via a path that
        /// does not cross a call boundary the optimizer cannot see through;
        /// used by exception-landing-pad bookkeeping inherited from
        /// construction (`spec.md` §4.2, step 1).
        const LANDING_PAD = 0b0000_0001;
        /// The block's address is taken (e.g. for `&&label` computed
        /// gotos or inline-assembly jump targets) and must not be merged
        /// away even if it looks unreachable by static analysis alone.
        const ADDRESS_TAKEN = 0b0000_0010;
    }
}

/// A basic block: a maximal straight-line run of instructions ending in
/// exactly one terminator (`spec.md` §3, invariant 2).
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    label: String,
    first: Option<InstructionRef>,
    last: Option<InstructionRef>,
    predecessors: SmallVec<[BlockId; 4]>,
    inputs: Vec<(InstructionRef, PhiId)>,
    flags: BlockFlags,
    alive: bool,
}

impl Block {
    /// Construct an empty block with no instructions yet.
    pub fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            first: None,
            last: None,
            predecessors: SmallVec::new(),
            inputs: Vec::new(),
            flags: BlockFlags::empty(),
            alive: true,
        }
    }

    /// The block's id.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The block's textual label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The first instruction in the block, if any have been appended.
    pub fn first_instruction(&self) -> Option<InstructionRef> {
        self.first
    }

    /// The last instruction in the block, i.e. its terminator once the
    /// block is well-formed.
    pub fn last_instruction(&self) -> Option<InstructionRef> {
        self.last
    }

    /// Record that `instr` is the first instruction appended to this block.
    pub fn set_first(&mut self, instr: InstructionRef) {
        if self.first.is_none() {
            self.first = Some(instr);
        }
    }

    /// Record that `instr` is the most recently appended instruction.
    pub fn set_last(&mut self, instr: InstructionRef) {
        self.last = Some(instr);
    }

    /// Control predecessors of this block (`spec.md` §3, "control
    /// predecessor set").
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    /// Add a control predecessor if not already present.
    pub fn add_predecessor(&mut self, pred: BlockId) {
        if !self.predecessors.contains(&pred) {
            self.predecessors.push(pred);
        }
    }

    /// Remove a control predecessor, e.g. after unreachable simplification
    /// deletes the edge's source block.
    pub fn remove_predecessor(&mut self, pred: BlockId) {
        self.predecessors.retain(|&p| p != pred);
    }

    /// Block inputs (SSA merge parameters), each paired with the phi node
    /// that defines it (`spec.md` §3, invariant 3).
    pub fn inputs(&self) -> &[(InstructionRef, PhiId)] {
        &self.inputs
    }

    /// Append a new block input.
    pub fn push_input(&mut self, value: InstructionRef, phi: PhiId) {
        self.inputs.push((value, phi));
    }

    /// Per-block flags.
    pub fn flags(&self) -> BlockFlags {
        self.flags
    }

    /// Mutable access to per-block flags.
    pub fn flags_mut(&mut self) -> &mut BlockFlags {
        &mut self.flags
    }

    /// Whether the block is still part of the function (unreachable
    /// simplification marks removed blocks dead rather than compacting the
    /// array, matching the arena-plus-index discipline of `spec.md` §9).
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Mark the block as removed.
    pub fn kill(&mut self) {
        self.alive = false;
        self.predecessors.clear();
        self.inputs.clear();
    }
}
