//! `AsmFunction`: a linear (non-block-based) arena-plus-tombstone sequence
//! of [`AsmInstruction`]s, mirroring the pooled-arena discipline
//! `kefir_ir::container::CodeContainer` uses for the SSA IR, but without
//! the block structure — asmcmp instructions already encode control flow
//! via `Label`/`Jmp`/`Jcc` operands (`spec.md` §4.4).

use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::{
    instruction::{
        AsmInstruction,
        AsmOpcode,
        AsmOperandData,
    },
    refs::{
        InstructionRef,
        LabelId,
        VirtualRegisterId,
    },
    register::RegisterClass,
};

/// A linear sequence of asm instructions for one function, plus the label
/// and virtual-register namespaces it owns.
pub struct AsmFunction {
    instructions: Vec<AsmInstruction>,
    label_count: u32,
    virtual_register_classes: Vec<RegisterClass>,
}

impl AsmFunction {
    /// An empty function body.
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            label_count: 0,
            virtual_register_classes: Vec::new(),
        }
    }

    /// Allocate a fresh, as-yet-undefined label.
    pub fn new_label(&mut self) -> LabelId {
        let id = LabelId::new(self.label_count);
        self.label_count += 1;
        id
    }

    /// Allocate a fresh virtual register of the given class.
    pub fn new_virtual_register(&mut self, class: RegisterClass) -> VirtualRegisterId {
        let id = VirtualRegisterId::new(self.virtual_register_classes.len() as u32);
        self.virtual_register_classes.push(class);
        id
    }

    /// The class a previously allocated virtual register was created with.
    pub fn virtual_register_class(&self, id: VirtualRegisterId) -> KefirResult<RegisterClass> {
        self.virtual_register_classes
            .get(id.as_usize())
            .copied()
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.virtual_register_classes.len()))
    }

    /// Append an instruction to the end of the sequence, returning its ref.
    pub fn push(&mut self, instruction: AsmInstruction) -> InstructionRef {
        let id = InstructionRef::new(self.instructions.len() as u32);
        self.instructions.push(instruction);
        id
    }

    /// Look up an instruction by ref.
    pub fn instruction(&self, id: InstructionRef) -> KefirResult<&AsmInstruction> {
        let limit = self.instructions.len();
        self.instructions
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), limit))
    }

    /// Look up an instruction by ref, mutably.
    pub fn instruction_mut(&mut self, id: InstructionRef) -> KefirResult<&mut AsmInstruction> {
        let limit = self.instructions.len();
        self.instructions
            .get_mut(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), limit))
    }

    /// Tombstone an instruction's slot; the ref remains allocated (and
    /// sequence positions remain stable) but the slot no longer carries a
    /// real instruction.
    pub fn remove(&mut self, id: InstructionRef) -> KefirResult<()> {
        *self.instruction_mut(id)? = AsmInstruction::tombstone();
        Ok(())
    }

    /// Every non-tombstoned instruction ref, in sequence order.
    pub fn live_instruction_refs(&self) -> impl Iterator<Item = InstructionRef> + '_ {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, instr)| !instr.is_tombstone())
            .map(|(index, _)| InstructionRef::new(index as u32))
    }

    /// The sequence position of the `Label` pseudo-instruction defining
    /// `label`, if it has been emitted.
    pub fn label_position(&self, label: LabelId) -> Option<InstructionRef> {
        self.live_instruction_refs().find(|&id| {
            matches!(
                self.instructions[id.as_usize()],
                AsmInstruction {
                    opcode: AsmOpcode::Label,
                    operands: AsmOperandData::LabelDef(defined),
                } if defined == label
            )
        })
    }

    /// The first live instruction strictly after `id`, if any — the
    /// "fallthrough" instruction a jump to the position right after `id`
    /// would land on.
    pub fn next_live(&self, id: InstructionRef) -> Option<InstructionRef> {
        ((id.index() + 1)..self.instructions.len() as u32)
            .map(InstructionRef::new)
            .find(|&candidate| !self.instructions[candidate.as_usize()].is_tombstone())
    }
}

impl Default for AsmFunction {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_instructions_are_retrievable_by_ref() {
        let mut function = AsmFunction::new();
        let id = function.push(AsmInstruction {
            opcode: AsmOpcode::Nop,
            operands: AsmOperandData::None,
        });
        assert_eq!(function.instruction(id).unwrap().opcode, AsmOpcode::Nop);
    }

    #[test]
    fn removed_instructions_are_excluded_from_live_refs() {
        let mut function = AsmFunction::new();
        let a = function.push(AsmInstruction {
            opcode: AsmOpcode::Nop,
            operands: AsmOperandData::None,
        });
        let b = function.push(AsmInstruction {
            opcode: AsmOpcode::Nop,
            operands: AsmOperandData::None,
        });
        function.remove(a).unwrap();
        let live: Vec<_> = function.live_instruction_refs().collect();
        assert_eq!(live, vec![b]);
    }

    #[test]
    fn label_position_finds_its_defining_instruction() {
        let mut function = AsmFunction::new();
        let label = function.new_label();
        function.push(AsmInstruction {
            opcode: AsmOpcode::Nop,
            operands: AsmOperandData::None,
        });
        let def = function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(label),
        });
        assert_eq!(function.label_position(label), Some(def));
    }
}
