//! `amd64-drop-virtual`: erases the virtual-lifetime bookkeeping
//! pseudo-instructions once register allocation has run, and verifies no
//! virtual register operand survived it (`spec.md` §4.4, "Amd64DropVirtual
//! (Devirtual): removes lifetime markers; a virtual register surviving
//! into this pass is an allocator bug").

use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::{
    function::AsmFunction,
    instruction::AsmOpcode,
    pass::{
        AsmPass,
        PassKind,
    },
};

/// Post-allocation cleanup of virtual-lifetime pseudo-instructions.
pub struct Amd64DropVirtual;

impl AsmPass for Amd64DropVirtual {
    fn name(&self) -> &'static str {
        "amd64-drop-virtual"
    }

    fn kind(&self) -> PassKind {
        PassKind::Devirtual
    }

    fn run(&self, function: &mut AsmFunction) -> KefirResult<bool> {
        let mut changed = false;
        let ids: Vec<_> = function.live_instruction_refs().collect();

        for id in ids {
            let instr = function.instruction(id)?;
            match instr.opcode {
                AsmOpcode::VirtualLifetimeStart | AsmOpcode::VirtualLifetimeEnd => {
                    function.remove(id)?;
                    changed = true;
                }
                _ => {
                    for reg in instr.registers() {
                        if reg.is_virtual() {
                            return Err(KefirError::internal(
                                "virtual register survived into the devirtual pipeline",
                            ));
                        }
                    }
                }
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        instruction::{
            AsmInstruction,
            AsmOperandData,
        },
        register::{
            PhysicalRegister,
            Register,
            RegisterClass,
        },
    };

    #[test]
    fn removes_lifetime_markers() {
        let mut function = AsmFunction::new();
        let reg = Register::Physical(PhysicalRegister::new(RegisterClass::General, 0));
        function.push(AsmInstruction {
            opcode: AsmOpcode::VirtualLifetimeStart,
            operands: AsmOperandData::Lifetime(reg),
        });
        function.push(AsmInstruction {
            opcode: AsmOpcode::VirtualLifetimeEnd,
            operands: AsmOperandData::Lifetime(reg),
        });
        let changed = Amd64DropVirtual.run(&mut function).unwrap();
        assert!(changed);
        assert_eq!(function.live_instruction_refs().count(), 0);
    }

    #[test]
    fn errors_when_a_virtual_register_survives() {
        use crate::{
            instruction::AsmOperand,
            refs::VirtualRegisterId,
        };
        let mut function = AsmFunction::new();
        let vreg = Register::Virtual(VirtualRegisterId::new(0), RegisterClass::General);
        function.push(AsmInstruction {
            opcode: AsmOpcode::Mov,
            operands: AsmOperandData::Binary(AsmOperand::Reg(vreg), AsmOperand::Immediate(1)),
        });
        let err = Amd64DropVirtual.run(&mut function).unwrap_err();
        assert!(matches!(err, KefirError::Internal { .. }));
    }
}
