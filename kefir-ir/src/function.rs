//! Optimizer functions: a code container, a debug-info sidecar, and the
//! locals layout, scoped to one stack-IR function (`spec.md` §3, "Optimizer
//! function").

use crate::{
    container::CodeContainer,
    debug::DebugInfo,
    refs::{
        BlockId,
        FunctionId,
        TypeId,
    },
};

/// One optimized function: owns its [`CodeContainer`] and [`DebugInfo`]
/// exclusively (`spec.md` §3, "Ownership model").
#[derive(Debug)]
pub struct OptFunction {
    id: FunctionId,
    name: String,
    signature: TypeId,
    locals_type: TypeId,
    entry: BlockId,
    container: CodeContainer,
    debug_info: DebugInfo,
}

impl OptFunction {
    /// Construct a function with an already-allocated entry block and an
    /// otherwise empty body; callers populate it via [`Self::container_mut`]
    /// (typically from [`crate::construct`]).
    pub fn new(
        id: FunctionId,
        name: impl Into<String>,
        signature: TypeId,
        locals_type: TypeId,
        entry: BlockId,
        container: CodeContainer,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            signature,
            locals_type,
            entry,
            container,
            debug_info: DebugInfo::new(),
        }
    }

    /// This function's id within its owning module.
    pub fn id(&self) -> FunctionId {
        self.id
    }

    /// The function's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The function's signature type.
    pub fn signature(&self) -> TypeId {
        self.signature
    }

    /// The locals layout type (`spec.md` GLOSSARY, "Locals type").
    pub fn locals_type(&self) -> TypeId {
        self.locals_type
    }

    /// The function's entry block.
    pub fn entry(&self) -> BlockId {
        self.entry
    }

    /// Read access to the SSA body.
    pub fn container(&self) -> &CodeContainer {
        &self.container
    }

    /// Mutable access to the SSA body, used by construction and every
    /// transformation pass.
    pub fn container_mut(&mut self) -> &mut CodeContainer {
        &mut self.container
    }

    /// Simultaneous mutable access to the SSA body and its debug-info
    /// sidecar, for passes that transfer sidecar entries while rewriting or
    /// removing instructions (`spec.md` §4.5).
    pub fn container_and_debug_mut(&mut self) -> (&mut CodeContainer, &mut DebugInfo) {
        (&mut self.container, &mut self.debug_info)
    }

    /// Read access to the debug-info sidecar.
    pub fn debug_info(&self) -> &DebugInfo {
        &self.debug_info
    }

    /// Mutable access to the debug-info sidecar.
    pub fn debug_info_mut(&mut self) -> &mut DebugInfo {
        &mut self.debug_info
    }
}
