//! The facade crate: wires the optimizer IR, the optimizer pass pipeline,
//! the asmcmp backend pipeline and the target-lowering bridge into the
//! handful of entry points a driver actually calls (`spec.md` §2).
//!
//! A driver's control flow, per `spec.md` §2: hand a `StackModule` to
//! [`build_module`], run [`run_pipeline`] (which resolves and installs the
//! target-lowering hook under the `"lowering"` pass name), hand the
//! optimized module to instruction selection (external, `spec.md` §1),
//! then run [`run_asmcmp_pipeline`] once per allocation stage.

pub mod bridge;
pub mod config;

use kefir_asmcmp::{
    AsmPassRegistry,
    AsmPipeline,
    PassKind,
};
use kefir_diagnostics::KefirResult;
use kefir_ir::{
    analysis::AnalysisCache,
    construct,
    module::Module,
    stack_ir::StackModule,
    target::TargetPlatform,
};
use kefir_passes::{
    PassRegistry,
    Pipeline,
};

pub use bridge::TargetLoweringBridge;
pub use config::{
    AsmcmpConfiguration,
    OptimizerConfiguration,
};

/// Translate a stack-IR module into an (unoptimized) SSA optimizer module
/// (`spec.md` §4.2).
#[tracing::instrument(skip_all, fields(functions = stack_module.functions.len()))]
pub fn build_module(stack_module: &StackModule, platform: &dyn TargetPlatform) -> KefirResult<Module> {
    construct::construct_module(stack_module, platform)
}

/// Resolve `config.pipeline_passes` against the registry (installing
/// `config.lowering_hook` under the `"lowering"` name if present) and run
/// them over every function in `module` (`spec.md` §4.3).
#[tracing::instrument(skip_all, fields(passes = config.pipeline_passes.len()))]
pub fn run_pipeline(module: &mut Module, config: &OptimizerConfiguration) -> KefirResult<()> {
    let mut registry = PassRegistry::new();
    if let Some(hook) = config.lowering_hook.clone() {
        registry = registry.with_lowering_hook(hook);
    }
    let passes = registry.resolve(&config.pipeline_passes)?;
    let pipeline = Pipeline::new(passes);
    let mut cache = AnalysisCache::new();
    pipeline.run(module, &mut cache)
}

/// Resolve `config.passes` against the asmcmp registry and run every pass
/// whose [`PassKind`] matches `filter` over `function` (`spec.md` §4.4).
/// Called once per allocation stage: `PassKind::Virtual` before register
/// allocation, `PassKind::Devirtual` after.
#[tracing::instrument(skip_all, fields(passes = config.passes.len(), filter = ?filter))]
pub fn run_asmcmp_pipeline(
    function: &mut kefir_asmcmp::AsmFunction,
    config: &AsmcmpConfiguration,
    filter: PassKind,
) -> KefirResult<()> {
    let registry = AsmPassRegistry::new();
    let passes = registry.resolve(&config.passes)?;
    let pipeline = AsmPipeline::new(passes);
    pipeline.run(function, filter)
}

/// Re-exports intended for `use kefir_optimizer::prelude::*;`.
pub mod prelude {
    pub use crate::{
        bridge::TargetLoweringBridge,
        build_module,
        config::{
            AsmcmpConfiguration,
            OptimizerConfiguration,
        },
        run_asmcmp_pipeline,
        run_pipeline,
    };
}

#[cfg(test)]
mod tests {
    use kefir_ir::{
        stack_ir::StackModule,
        target::ReferencePlatform,
    };

    use super::*;

    #[test]
    fn build_module_on_an_empty_stack_module_yields_an_empty_module() {
        let stack_module = StackModule::new();
        let module = build_module(&stack_module, &ReferencePlatform).unwrap();
        assert_eq!(module.functions().len(), 0);
    }

    #[test]
    fn run_pipeline_with_no_passes_is_a_no_op() {
        let mut module = Module::new();
        let config = OptimizerConfiguration::empty();
        run_pipeline(&mut module, &config).unwrap();
    }

    #[test]
    fn run_pipeline_with_an_unknown_pass_name_fails_before_running_anything() {
        let mut module = Module::new();
        let config = OptimizerConfiguration {
            pipeline_passes: vec!["does-not-exist".to_string()],
            ..OptimizerConfiguration::empty()
        };
        assert!(run_pipeline(&mut module, &config).is_err());
    }

    #[test]
    fn run_asmcmp_pipeline_with_no_passes_is_a_no_op() {
        let mut function = kefir_asmcmp::AsmFunction::new();
        let config = AsmcmpConfiguration::empty();
        run_asmcmp_pipeline(&mut function, &config, PassKind::Both).unwrap();
    }

    #[test]
    fn run_asmcmp_pipeline_with_an_unknown_pass_name_fails() {
        let mut function = kefir_asmcmp::AsmFunction::new();
        let config = AsmcmpConfiguration {
            passes: vec!["does-not-exist".to_string()],
        };
        assert!(run_asmcmp_pipeline(&mut function, &config, PassKind::Both).is_err());
    }
}
