//! Use-def chains: for every value-producing instruction, the set of
//! instructions that read it (`spec.md` §4, "use-def chains").

use hashbrown::HashMap;
use kefir_diagnostics::KefirResult;

use crate::{
    container::CodeContainer,
    instruction::OperandData,
    refs::InstructionRef,
};

/// Reverse of the operand relation: `users_of(v)` lists every instruction
/// whose operands (direct or via a block input's incoming value) mention
/// `v`.
#[derive(Debug, Clone, Default)]
pub struct UseDefChains {
    users: HashMap<InstructionRef, Vec<InstructionRef>>,
}

impl UseDefChains {
    /// Build the chains by scanning every live instruction in `container`.
    pub fn compute(container: &CodeContainer) -> KefirResult<Self> {
        let mut users: HashMap<InstructionRef, Vec<InstructionRef>> = HashMap::new();
        for id in container.live_instruction_refs() {
            let instr = container.instruction(id)?;
            for operand in instr.operand_refs() {
                users.entry(operand).or_default().push(id);
            }
            if let OperandData::BlockInput(phi) = &instr.operands {
                let phi = container.phi(*phi)?;
                for (_, value) in phi.entries() {
                    users.entry(value).or_default().push(id);
                }
            }
        }
        Ok(Self { users })
    }

    /// Every instruction that uses `value`, empty if it has no users.
    pub fn users_of(&self, value: InstructionRef) -> &[InstructionRef] {
        self.users.get(&value).map_or(&[], Vec::as_slice)
    }

    /// Whether `value` has no recorded users, i.e. is dead per the
    /// current use-def chains (a pure instruction with no users is
    /// removable).
    pub fn is_unused(&self, value: InstructionRef) -> bool {
        self.users_of(value).is_empty()
    }
}
