//! Dominator tree construction, via the iterative Cooper/Harvey/Kennedy
//! algorithm over a reverse-postorder block list.

use hashbrown::{
    HashMap,
    HashSet,
};

use crate::{
    container::CodeContainer,
    refs::BlockId,
};

/// The immediate-dominator relation for one function, rooted at its entry
/// block (`spec.md` §4, "dominators").
#[derive(Debug, Clone, Default)]
pub struct DominatorTree {
    entry: Option<BlockId>,
    idom: HashMap<BlockId, BlockId>,
    rpo_index: HashMap<BlockId, usize>,
}

impl DominatorTree {
    /// Compute the dominator tree over `order` (a reverse-postorder
    /// traversal starting at `entry`), consulting `container` for each
    /// block's predecessor set.
    pub fn compute(entry: BlockId, order: &[BlockId], container: &CodeContainer) -> Self {
        let rpo_index: HashMap<BlockId, usize> = order.iter().enumerate().map(|(i, &b)| (b, i)).collect();
        let mut idom: HashMap<BlockId, BlockId> = HashMap::new();
        idom.insert(entry, entry);

        let mut changed = true;
        while changed {
            changed = false;
            for &block in order.iter().skip(1) {
                let Ok(blk) = container.block(block) else { continue };
                let mut processed_preds = blk
                    .predecessors()
                    .iter()
                    .copied()
                    .filter(|p| idom.contains_key(p));
                let Some(mut new_idom) = processed_preds.next() else {
                    continue;
                };
                for pred in processed_preds {
                    new_idom = intersect(new_idom, pred, &rpo_index, &idom);
                }
                if idom.get(&block) != Some(&new_idom) {
                    idom.insert(block, new_idom);
                    changed = true;
                }
            }
        }

        Self {
            entry: Some(entry),
            idom,
            rpo_index,
        }
    }

    /// `block`'s immediate dominator, `None` for the entry block or a
    /// block never reached by the traversal this tree was built from.
    pub fn immediate_dominator(&self, block: BlockId) -> Option<BlockId> {
        if Some(block) == self.entry {
            return None;
        }
        self.idom.get(&block).copied()
    }

    /// Whether `a` dominates `b` (every block dominates itself).
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if !self.idom.contains_key(&b) && Some(b) != self.entry {
            return false;
        }
        let mut current = b;
        loop {
            if current == a {
                return true;
            }
            let Some(&parent) = self.idom.get(&current) else {
                return false;
            };
            if parent == current {
                return current == a;
            }
            current = parent;
        }
    }

    /// Immediate children of `block` in the dominator tree, i.e. every
    /// block whose immediate dominator is `block`.
    pub fn children(&self, block: BlockId) -> Vec<BlockId> {
        self.idom
            .iter()
            .filter(|&(&b, &p)| p == block && b != block)
            .map(|(&b, _)| b)
            .collect()
    }

    /// The dominance frontier of every block: `b` is in `frontier[a]` when
    /// `a` dominates some predecessor of `b` but does not strictly dominate
    /// `b` itself (Cytron/Ferrante/Rosen/Zadeck), the standard basis for
    /// placing block inputs during local-to-SSA promotion.
    pub fn dominance_frontiers(&self, container: &CodeContainer) -> HashMap<BlockId, HashSet<BlockId>> {
        let mut frontier: HashMap<BlockId, HashSet<BlockId>> = HashMap::new();
        for &block in self.rpo_index.keys() {
            let Ok(blk) = container.block(block) else { continue };
            let preds = blk.predecessors();
            if preds.len() < 2 {
                continue;
            }
            let Some(dominator) = self.immediate_dominator(block) else { continue };
            for &pred in preds {
                let mut runner = pred;
                while runner != dominator {
                    frontier.entry(runner).or_default().insert(block);
                    match self.idom.get(&runner) {
                        Some(&next) if next != runner => runner = next,
                        _ => break,
                    }
                }
            }
        }
        frontier
    }
}

fn intersect(mut a: BlockId, mut b: BlockId, rpo_index: &HashMap<BlockId, usize>, idom: &HashMap<BlockId, BlockId>) -> BlockId {
    while a != b {
        while rpo_index[&a] > rpo_index[&b] {
            a = idom[&a];
        }
        while rpo_index[&b] > rpo_index[&a] {
            b = idom[&b];
        }
    }
    a
}
