//! The optimizer IR: the SSA-form value graph every transformation pass
//! reads and rewrites, plus the construction step that lifts stack-IR
//! bytecode into it (`spec.md` §3, §4.2).

#![warn(missing_docs)]

pub mod analysis;
pub mod block;
pub mod call_node;
pub mod container;
pub mod construct;
pub mod debug;
pub mod function;
pub mod inline_asm;
pub mod instruction;
pub mod ir_type;
pub mod module;
pub mod opcode;
pub mod phi;
pub mod refs;
pub mod stack_ir;
pub mod target;

pub use block::{
    Block,
    BlockFlags,
};
pub use call_node::{
    CallNode,
    Callee,
};
pub use container::{
    BigIntConst,
    CodeContainer,
    SwitchTable,
};
pub use construct::construct_module;
pub use debug::{
    DebugCursor,
    DebugInfo,
};
pub use function::OptFunction;
pub use inline_asm::{
    InlineAsmBinding,
    InlineAssemblyNode,
};
pub use instruction::{
    Instruction,
    OperandData,
};
pub use ir_type::{
    IrType,
    IrTypeKind,
    IrTypeTable,
};
pub use module::Module;
pub use opcode::{
    CompareKind,
    Opcode,
};
pub use phi::Phi;
pub use refs::{
    BigIntConstId,
    BlockId,
    CallNodeId,
    FunctionId,
    InlineAsmId,
    InstructionRef,
    LocalIndex,
    PhiId,
    SwitchTableId,
    TypeId,
};
pub use stack_ir::{
    ConstantValue,
    DataSegment,
    StackFunction,
    StackModule,
    StackOpcode,
};
pub use target::{
    struct_type,
    BitfieldAllocation,
    ReferencePlatform,
    TargetLayout,
    TargetPlatform,
};

/// Re-exports intended for `use kefir_ir::prelude::*;`.
pub mod prelude {
    pub use crate::{
        analysis::{
            AnalysisCache,
            DominatorTree,
            FunctionAnalysis,
            Liveness,
            LoopForest,
            UseDefChains,
        },
        construct_module,
        Block,
        BlockId,
        CodeContainer,
        CompareKind,
        FunctionId,
        Instruction,
        InstructionRef,
        IrType,
        IrTypeKind,
        IrTypeTable,
        Module,
        Opcode,
        OperandData,
        OptFunction,
        PhiId,
        StackFunction,
        StackModule,
        StackOpcode,
        TargetPlatform,
        TypeId,
    };
}
