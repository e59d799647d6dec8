//! The identity pass: changes nothing, used as a pipeline placeholder and in
//! tests (`original_source/source/optimizer/pipeline/noop.c`).

use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::FunctionAnalysis,
    module::Module,
    refs::FunctionId,
};

use crate::pass::Pass;

/// Does nothing; always reports no change.
#[derive(Debug, Default)]
pub struct Noop;

impl Pass for Noop {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn run(&self, _module: &mut Module, _function: FunctionId, _analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::test_support::single_block_function;

    #[test]
    fn noop_never_reports_a_change() {
        let mut module = single_block_function("f");
        let mut analysis = FunctionAnalysis::new();
        let changed = Noop.run(&mut module, FunctionId::new(0), &mut analysis).unwrap();
        assert!(!changed);
    }
}
