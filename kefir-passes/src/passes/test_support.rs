//! Hand-built functions for exercising one pass in isolation, independent of
//! stack-IR construction (mirrors `kefir_ir::analysis`'s own test fixtures).

use kefir_ir::{
    container::CodeContainer,
    function::OptFunction,
    instruction::OperandData,
    ir_type::{
        IrType,
        IrTypeKind,
    },
    module::Module,
    opcode::Opcode,
    refs::{
        BlockId,
        FunctionId,
        TypeId,
    },
};

/// Intern a trivial `() -> int8` signature and an empty locals type.
pub fn int8_signature(module: &mut Module) -> (TypeId, TypeId) {
    let int8 = module.types_mut().intern(IrType {
        kind: IrTypeKind::Int {
            width: 8,
            signed: true,
        },
        alignment: 1,
    });
    let locals = module.types_mut().intern(IrType {
        kind: IrTypeKind::Struct { members: Vec::new() },
        alignment: 1,
    });
    let signature = module.types_mut().intern(IrType {
        kind: IrTypeKind::Function {
            params: Vec::new(),
            return_type: Some(int8),
            variadic: false,
        },
        alignment: 1,
    });
    (signature, locals)
}

/// A module containing exactly one function named `name`, whose body is
/// built by `build` (which receives the empty container and returns the
/// entry block id).
pub fn module_with_function(name: &str, build: impl FnOnce(&mut CodeContainer) -> BlockId) -> Module {
    let mut module = Module::new();
    let (signature, locals) = int8_signature(&mut module);
    let mut container = CodeContainer::new();
    let entry = build(&mut container);
    let function = OptFunction::new(FunctionId::new(0), name, signature, locals, entry, container);
    module.add_function(function);
    module
}

/// `return 42;` as a one-block function, used by pipeline-level tests that
/// only care about traversal, not any particular rewrite.
pub fn single_block_function(name: &str) -> Module {
    module_with_function(name, |container| {
        let entry = container.new_block("entry");
        let value = container
            .append_instruction(entry, Opcode::ConstInt8, OperandData::IntConst(42))
            .unwrap();
        container
            .append_instruction(entry, Opcode::Return, OperandData::Return(value))
            .unwrap();
        entry
    })
}
