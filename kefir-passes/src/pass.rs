//! The pass trait every optimizer stage implements.

use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::FunctionAnalysis,
    module::Module,
    refs::FunctionId,
};

/// One transformation stage, applied function-at-a-time by [`crate::pipeline::Pipeline`]
/// (`spec.md` §4.3, "a process-wide registry maps pass names... to pass
/// descriptors (each a `{name, apply-function, payload}` triple)").
pub trait Pass: Send + Sync {
    /// The pass's registry name.
    fn name(&self) -> &'static str;

    /// Apply this pass to `function`, using (and populating) `analysis` for
    /// whatever dominance/loop/use-def/liveness information it needs.
    /// Returns whether the pass changed anything, for pipeline logging.
    /// Pass failure aborts the pipeline; the function's `CodeContainer` is
    /// left in whatever partial state the pass reached (`spec.md` §4.3,
    /// "Failure semantics").
    fn run(
        &self,
        module: &mut Module,
        function: FunctionId,
        analysis: &mut FunctionAnalysis,
    ) -> KefirResult<bool>;
}

/// A target-lowering callback, supplied by the driver embedding the
/// optimizer and invoked by the `lowering` pass (`spec.md` §4.3, "lowering").
/// `Arc` rather than a bare `fn` because the hook typically closes over a
/// `TargetPlatform` handle.
pub type LoweringHook = std::sync::Arc<
    dyn Fn(&mut Module, FunctionId) -> KefirResult<bool> + Send + Sync,
>;
