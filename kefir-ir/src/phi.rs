//! Phi nodes: the predecessor-to-value maps backing each block input.

use hashbrown::HashMap;

use crate::refs::{
    BlockId,
    InstructionRef,
    PhiId,
};

/// One phi node: owned by a block, with one entry per control predecessor
/// mapping that predecessor to the value flowing in from it (`spec.md` §3,
/// invariant 3).
#[derive(Debug, Clone, Default)]
pub struct Phi {
    owner: Option<BlockId>,
    incoming: HashMap<BlockId, InstructionRef>,
}

impl Phi {
    /// Construct a phi owned by `owner` with no incoming values yet.
    pub fn new(owner: BlockId) -> Self {
        Self {
            owner: Some(owner),
            incoming: HashMap::new(),
        }
    }

    /// The block this phi's block input belongs to.
    pub fn owner(&self) -> Option<BlockId> {
        self.owner
    }

    /// Set (or overwrite) the value flowing in from `predecessor`.
    pub fn set_incoming(&mut self, predecessor: BlockId, value: InstructionRef) {
        self.incoming.insert(predecessor, value);
    }

    /// The value flowing in from `predecessor`, if recorded.
    pub fn incoming_from(&self, predecessor: BlockId) -> Option<InstructionRef> {
        self.incoming.get(&predecessor).copied()
    }

    /// Remove the entry for a predecessor, e.g. when unreachable
    /// simplification deletes that control edge.
    pub fn remove_incoming(&mut self, predecessor: BlockId) {
        self.incoming.remove(&predecessor);
    }

    /// All (predecessor, value) pairs.
    pub fn entries(&self) -> impl Iterator<Item = (BlockId, InstructionRef)> + '_ {
        self.incoming.iter().map(|(&b, &v)| (b, v))
    }

    /// Number of incoming entries, compared against the predecessor count
    /// by invariant checks (`spec.md` §8).
    pub fn len(&self) -> usize {
        self.incoming.len()
    }

    /// Whether this phi has no incoming entries yet.
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty()
    }

    /// Whether every incoming value is the same instruction, i.e. the phi
    /// is trivially redundant and can be replaced by that value (a common
    /// mem2reg/GVN cleanup).
    pub fn is_trivial(&self) -> Option<InstructionRef> {
        let mut values = self.incoming.values();
        let first = *values.next()?;
        if values.all(|&v| v == first) {
            Some(first)
        } else {
            None
        }
    }
}
