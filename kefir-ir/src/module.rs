//! The optimizer module: the type table plus every optimized function
//! (`spec.md` §3, "Optimizer module").

use hashbrown::HashMap;
use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::{
    function::OptFunction,
    ir_type::IrTypeTable,
    refs::{
        FunctionId,
        TypeId,
    },
    target::{
        TargetLayout,
        TargetPlatform,
    },
};

/// The module exclusively owns its functions and its type table (`spec.md`
/// §3, "Ownership model"); there is exactly one `Module` per compilation
/// unit handed between construction, the optimizer pipeline, and lowering.
#[derive(Debug, Default)]
pub struct Module {
    types: IrTypeTable,
    functions: Vec<OptFunction>,
    by_name: HashMap<String, FunctionId>,
}

impl Module {
    /// An empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the type table.
    pub fn types(&self) -> &IrTypeTable {
        &self.types
    }

    /// Mutable access to the type table.
    pub fn types_mut(&mut self) -> &mut IrTypeTable {
        &mut self.types
    }

    /// `ty`'s target layout, computed and cached on first query.
    pub fn layout_of(&mut self, ty: TypeId, platform: &dyn TargetPlatform) -> KefirResult<&TargetLayout> {
        self.types
            .layout_of(ty, platform)
            .ok_or_else(|| KefirError::out_of_bounds(ty.as_usize(), self.types.len()))
    }

    /// Register a new, already-constructed function and take ownership of
    /// it, returning its id.
    pub fn add_function(&mut self, function: OptFunction) -> FunctionId {
        let id = FunctionId::new(self.functions.len() as u32);
        self.by_name.insert(function.name().to_string(), id);
        self.functions.push(function);
        id
    }

    /// Look up a function by id.
    pub fn function(&self, id: FunctionId) -> KefirResult<&OptFunction> {
        self.functions
            .get(id.as_usize())
            .ok_or_else(|| KefirError::out_of_bounds(id.as_usize(), self.functions.len()))
    }

    /// Mutable access to a function, used by the pipeline's function-at-a-
    /// time traversal (`spec.md` §4.3, "Execution").
    pub fn function_mut(&mut self, id: FunctionId) -> KefirResult<&mut OptFunction> {
        let len = self.functions.len();
        self.functions
            .get_mut(id.as_usize())
            .ok_or(KefirError::out_of_bounds(id.as_usize(), len))
    }

    /// Resolve a function by its declared name.
    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.by_name.get(name).copied()
    }

    /// Every function, in declaration order.
    pub fn functions(&self) -> &[OptFunction] {
        &self.functions
    }

    /// Mutable access to every function, in declaration order.
    pub fn functions_mut(&mut self) -> &mut [OptFunction] {
        &mut self.functions
    }
}
