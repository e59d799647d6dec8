//! `amd64-eliminate-label`: drops `Label` pseudo-instructions no longer
//! referenced by any jump, once devirtualization and jump propagation have
//! had a chance to retarget everything (`spec.md` §4.4, "Amd64EliminateLabel
//! (Devirtual): a label with no remaining referrer carries no runtime
//! effect and is removed").

use hashbrown::HashSet;
use kefir_diagnostics::KefirResult;

use crate::{
    function::AsmFunction,
    instruction::{
        AsmOpcode,
        AsmOperandData,
    },
    pass::{
        AsmPass,
        PassKind,
    },
    refs::LabelId,
};

/// Removes unreferenced `Label` pseudo-instructions.
pub struct Amd64EliminateLabel;

impl AsmPass for Amd64EliminateLabel {
    fn name(&self) -> &'static str {
        "amd64-eliminate-label"
    }

    fn kind(&self) -> PassKind {
        PassKind::Devirtual
    }

    fn run(&self, function: &mut AsmFunction) -> KefirResult<bool> {
        let mut referenced: HashSet<LabelId> = HashSet::new();
        for id in function.live_instruction_refs() {
            match function.instruction(id)?.operands {
                AsmOperandData::Jump(target) => {
                    referenced.insert(target);
                }
                AsmOperandData::CondJump { target, .. } => {
                    referenced.insert(target);
                }
                _ => {}
            }
        }

        let mut changed = false;
        let ids: Vec<_> = function.live_instruction_refs().collect();
        for id in ids {
            let instr = function.instruction(id)?;
            if instr.opcode != AsmOpcode::Label {
                continue;
            }
            let AsmOperandData::LabelDef(label) = instr.operands else {
                continue;
            };
            if !referenced.contains(&label) {
                function.remove(id)?;
                changed = true;
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::AsmInstruction;

    #[test]
    fn removes_a_label_with_no_referring_jump() {
        let mut function = AsmFunction::new();
        let dead = function.new_label();
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(dead),
        });
        let changed = Amd64EliminateLabel.run(&mut function).unwrap();
        assert!(changed);
        assert_eq!(function.live_instruction_refs().count(), 0);
    }

    #[test]
    fn keeps_a_label_referenced_by_a_jump() {
        let mut function = AsmFunction::new();
        let target = function.new_label();
        function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(target),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(target),
        });
        let changed = Amd64EliminateLabel.run(&mut function).unwrap();
        assert!(!changed);
        assert_eq!(function.live_instruction_refs().count(), 2);
    }
}
