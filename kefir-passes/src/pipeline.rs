//! Pipeline execution: function-at-a-time, analyses invalidated between
//! passes, pass failure poisoning the function it was applied to
//! (`spec.md` §4.3, "Execution"/"Failure semantics").

use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::AnalysisCache,
    module::Module,
    refs::FunctionId,
};

use crate::pass::Pass;

/// An ordered, already-resolved sequence of passes.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    /// Build a pipeline from already-resolved passes, e.g. the output of
    /// [`crate::registry::PassRegistry::resolve`].
    pub fn new(passes: Vec<Box<dyn Pass>>) -> Self {
        Self { passes }
    }

    /// The resolved pass names, in execution order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass, in order, over every function in `module`. Traversal
    /// is pass-outer / function-inner: a pass completes for every function
    /// before the next pass begins (`spec.md` §4.3, "Execution... passes
    /// run function-at-a-time, not the whole pipeline at once per
    /// function"). On the first pass failure, the offending function is
    /// left in its partial state and the error propagates; functions
    /// already processed by earlier passes keep their rewrites.
    #[tracing::instrument(skip_all, fields(passes = self.passes.len(), functions = module.functions().len()))]
    pub fn run(&self, module: &mut Module, cache: &mut AnalysisCache) -> KefirResult<()> {
        let function_ids: Vec<FunctionId> = (0..module.functions().len())
            .map(|index| FunctionId::new(index as u32))
            .collect();

        for pass in &self.passes {
            tracing::debug!(pass = pass.name(), "running pass over every function");
            for &id in &function_ids {
                let changed = {
                    let analysis = cache.get_mut(id);
                    pass.run(module, id, analysis).map_err(|err| {
                        tracing::error!(
                            pass = pass.name(),
                            function = id.index(),
                            error = %err,
                            "pass failed; function left poisoned"
                        );
                        err
                    })?
                };
                cache.invalidate(id);
                if changed {
                    tracing::trace!(pass = pass.name(), function = id.index(), "pass changed the function");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kefir_diagnostics::KefirError;
    use kefir_ir::analysis::FunctionAnalysis;

    use super::*;
    use crate::pass::Pass;

    struct AlwaysFails;
    impl Pass for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }
        fn run(&self, _module: &mut Module, _function: FunctionId, _analysis: &mut FunctionAnalysis) -> KefirResult<bool> {
            Err(KefirError::internal("deliberate test failure"))
        }
    }

    #[test]
    fn empty_module_runs_every_pass_with_no_functions() {
        let pipeline = Pipeline::new(vec![Box::new(crate::passes::noop::Noop)]);
        let mut module = Module::new();
        let mut cache = AnalysisCache::new();
        pipeline.run(&mut module, &mut cache).unwrap();
    }

    #[test]
    fn pass_failure_propagates_as_an_error() {
        let pipeline = Pipeline::new(vec![Box::new(AlwaysFails)]);
        let mut module = crate::passes::test_support::single_block_function("f");
        let mut cache = AnalysisCache::new();
        let err = pipeline.run(&mut module, &mut cache).unwrap_err();
        assert!(matches!(err, KefirError::Internal { .. }));
    }

    #[test]
    fn pipeline_reports_its_resolved_pass_names_in_order() {
        let pipeline = Pipeline::new(vec![
            Box::new(crate::passes::noop::Noop),
            Box::new(crate::passes::noop::Noop),
        ]);
        assert_eq!(pipeline.pass_names(), vec!["noop", "noop"]);
    }
}
