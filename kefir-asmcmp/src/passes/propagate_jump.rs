//! `amd64-propagate-jump`: collapses jump-to-jump chains (`spec.md` §4.4,
//! "Amd64PropagateJump (Both): when a jump's target label is immediately
//! followed by nothing but an unconditional jump, retargets to that jump's
//! own target; cycles are left as the infinite loop they represent").

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

/// Collapses chains of `label: jmp other_label` into a direct jump to the
/// chain's end. Runs under both allocation stages: it only ever touches
/// `Jump`/`CondJump` operand data, never register operands.
pub struct Amd64PropagateJump;

impl AsmPass for Amd64PropagateJump {
    fn name(&self) -> &'static str {
        "amd64-propagate-jump"
    }

    fn kind(&self) -> PassKind {
        PassKind::Both
    }

    fn run(&self, function: &mut AsmFunction) -> KefirResult<bool> {
        let mut changed = false;
        let ids: Vec<_> = function.live_instruction_refs().collect();

        for id in ids {
            let instr = *function.instruction(id)?;
            let resolved = match instr.operands {
                AsmOperandData::Jump(target) => resolve_chain(function, target).map(AsmOperandData::Jump),
                AsmOperandData::CondJump { condition, target } => {
                    resolve_chain(function, target).map(|target| AsmOperandData::CondJump { condition, target })
                }
                _ => None,
            };
            if let Some(resolved) = resolved {
                function.instruction_mut(id)?.operands = resolved;
                changed = true;
            }
        }

        Ok(changed)
    }
}

/// Follow `label`'s chain of pass-through jumps to its end. Returns `None`
/// if `label` was already the chain's end (no rewrite needed) or a cycle
/// was detected.
fn resolve_chain(function: &AsmFunction, label: LabelId) -> Option<LabelId> {
    let mut visited = HashSet::new();
    let mut current = label;

    loop {
        if !visited.insert(current) {
            return None;
        }
        let Some(next) = trivial_jump_target(function, current) else {
            break;
        };
        current = next;
    }

    if current == label {
        None
    } else {
        Some(current)
    }
}

/// If `label`'s block is exactly `[Label(label), Jmp(target)]` — i.e. the
/// label's defining instruction is immediately followed by an
/// unconditional jump and nothing else precedes it — returns `target`.
fn trivial_jump_target(function: &AsmFunction, label: LabelId) -> Option<LabelId> {
    let label_pos = function.label_position(label)?;
    let next = function.next_live(label_pos)?;
    let next_instr = function.instruction(next).ok()?;
    match (next_instr.opcode, next_instr.operands) {
        (AsmOpcode::Jmp, AsmOperandData::Jump(target)) => Some(target),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::AsmInstruction;

    #[test]
    fn retargets_through_a_single_hop_chain() {
        let mut function = AsmFunction::new();
        let a = function.new_label();
        let b = function.new_label();
        let c = function.new_label();

        let jump_to_a = function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(a),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(a),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(b),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(b),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(c),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(c),
        });

        let changed = Amd64PropagateJump.run(&mut function).unwrap();
        assert!(changed);
        assert_eq!(function.instruction(jump_to_a).unwrap().operands, AsmOperandData::Jump(c));
    }

    #[test]
    fn leaves_a_cycle_unresolved() {
        let mut function = AsmFunction::new();
        let a = function.new_label();
        let b = function.new_label();

        let jump_to_a = function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(a),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(a),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(b),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(b),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(a),
        });

        let changed = Amd64PropagateJump.run(&mut function).unwrap();
        assert!(!changed);
        assert_eq!(function.instruction(jump_to_a).unwrap().operands, AsmOperandData::Jump(a));
    }

    #[test]
    fn does_not_touch_a_jump_whose_target_has_real_instructions() {
        let mut function = AsmFunction::new();
        let a = function.new_label();
        let jump_to_a = function.push(AsmInstruction {
            opcode: AsmOpcode::Jmp,
            operands: AsmOperandData::Jump(a),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Label,
            operands: AsmOperandData::LabelDef(a),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::Ret,
            operands: AsmOperandData::None,
        });

        let changed = Amd64PropagateJump.run(&mut function).unwrap();
        assert!(!changed);
        assert_eq!(function.instruction(jump_to_a).unwrap().operands, AsmOperandData::Jump(a));
    }
}
