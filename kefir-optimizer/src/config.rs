//! Pipeline configuration: a plain struct with named fields, not a map or
//! a builder with variadic arguments (`spec.md` §9, "Configuration as
//! enumerated options"; `spec.md` §6, "Pipeline configuration (consumed
//! from driver)").

use kefir_passes::LoweringHook;

/// Everything the driver supplies to configure one run of the optimizer
/// pipeline over a module.
#[derive(Clone)]
pub struct OptimizerConfiguration {
    /// The ordered list of optimizer-pipeline pass names, resolved against
    /// `kefir_passes::PassRegistry`.
    pub pipeline_passes: Vec<String>,
    /// Whether the driver wants debug-info entries preserved through the
    /// pipeline (omitting this work is cheaper when debug info was never
    /// requested).
    pub emit_debug_info: bool,
    /// The maximum depth of nested inlining the front-end's inliner may
    /// have already performed — recorded here only so passes that reason
    /// about call-graph shape (none yet) have it available.
    pub max_inline_depth: u32,
    /// The maximum number of inline expansions permitted per function.
    pub max_inlines_per_function: u32,
    /// The target-lowering hook installed under the `"lowering"` pass
    /// name, if the driver's pipeline references it.
    pub lowering_hook: Option<LoweringHook>,
}

impl OptimizerConfiguration {
    /// A configuration with no passes and debug info disabled; callers
    /// build up from here with struct-update syntax.
    pub fn empty() -> Self {
        Self {
            pipeline_passes: Vec::new(),
            emit_debug_info: false,
            max_inline_depth: 0,
            max_inlines_per_function: 0,
            lowering_hook: None,
        }
    }
}

impl Default for OptimizerConfiguration {
    fn default() -> Self {
        Self::empty()
    }
}

/// Asmcmp pipeline configuration: an ordered list of asmcmp pass names
/// (`spec.md` §6, "Asmcmp configuration (consumed from backend): Ordered
/// list of asmcmp pass names, tagged by the kind filter under which they
/// run"). The kind tag lives with each pass's own registration
/// (`kefir_asmcmp::AsmPass::kind`), not in this list; the filter applied at
/// `run_asmcmp_pipeline` time selects among them.
#[derive(Clone)]
pub struct AsmcmpConfiguration {
    /// The ordered list of asmcmp pass names, resolved against
    /// `kefir_asmcmp::AsmPassRegistry`.
    pub passes: Vec<String>,
}

impl AsmcmpConfiguration {
    /// A configuration with no passes.
    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }
}

impl Default for AsmcmpConfiguration {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configuration_has_no_passes() {
        let config = OptimizerConfiguration::empty();
        assert!(config.pipeline_passes.is_empty());
        assert!(config.lowering_hook.is_none());
    }

    #[test]
    fn struct_update_overrides_only_named_fields() {
        let config = OptimizerConfiguration {
            pipeline_passes: vec!["mem2reg".to_string()],
            emit_debug_info: true,
            ..OptimizerConfiguration::empty()
        };
        assert_eq!(config.pipeline_passes, vec!["mem2reg".to_string()]);
        assert_eq!(config.max_inline_depth, 0);
    }
}
