//! The `lowering` pass name: a thin wrapper that hands the module off to a
//! target-specific [`LoweringHook`] supplied by the embedding driver
//! (`spec.md` §4.3, "lowering").

use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::FunctionAnalysis,
    module::Module,
    refs::FunctionId,
};

use crate::pass::{
    LoweringHook,
    Pass,
};

/// Invokes an installed [`LoweringHook`]; the registry only ever
/// constructs this when a hook has been supplied (`spec.md` §4.3).
pub struct Lowering {
    hook: LoweringHook,
}

impl Lowering {
    /// Wrap `hook` as a pass.
    pub fn new(hook: LoweringHook) -> Self {
        Self { hook }
    }
}

impl Pass for Lowering {
    fn name(&self) -> &'static str {
        "lowering"
    }

    fn run(&self, module: &mut Module, function: FunctionId, analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        let changed = (self.hook)(module, function)?;
        if changed {
            analysis.invalidate();
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kefir_ir::refs::FunctionId;

    use super::*;
    use crate::passes::test_support::single_block_function;

    #[test]
    fn invokes_the_installed_hook() {
        let hook: LoweringHook = Arc::new(|_module, _function| Ok(true));
        let pass = Lowering::new(hook);
        let mut module = single_block_function("f");
        let mut analysis = FunctionAnalysis::new();
        let changed = pass.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(changed);
    }
}
