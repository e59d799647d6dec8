//! Pass-name resolution: a process-wide registry mapping pass names to
//! descriptors, failing at pipeline-construction time for unknown names
//! (`spec.md` §4.3, "Unknown names cause configuration failure at pipeline
//! construction time, not at apply time").

use hashbrown::HashMap;
use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::pass::{
    LoweringHook,
    Pass,
};

type Factory = fn() -> Box<dyn Pass>;

/// Resolves pass names to freshly constructed [`Pass`] instances. Pass
/// names match the snake-case identifiers used by
/// `original_source/source/optimizer/pipeline/*.c`.
pub struct PassRegistry {
    factories: HashMap<&'static str, Factory>,
    lowering_hook: Option<LoweringHook>,
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PassRegistry {
    /// A registry with every statically-known pass registered under its
    /// canonical name. The `lowering` name additionally requires a hook
    /// installed via [`Self::with_lowering_hook`].
    pub fn new() -> Self {
        let mut factories: HashMap<&'static str, Factory> = HashMap::new();
        factories.insert("noop", || Box::new(crate::passes::noop::Noop));
        factories.insert("mem2reg", || Box::new(crate::passes::mem2reg::Mem2Reg));
        factories.insert("compare-branch-fuse", || {
            Box::new(crate::passes::compare_branch_fuse::CompareBranchFuse)
        });
        factories.insert("operation-simplification", || {
            Box::new(crate::passes::operation_simplification::OperationSimplification)
        });
        factories.insert("global-value-numbering", || {
            Box::new(crate::passes::global_value_numbering::GlobalValueNumbering)
        });
        factories.insert("constant-folding", || {
            Box::new(crate::passes::constant_folding::ConstantFolding)
        });
        factories.insert("tail-call-marking", || {
            Box::new(crate::passes::tail_call_marking::TailCallMarking)
        });
        factories.insert("unreachable-simplification", || {
            Box::new(crate::passes::unreachable_simplification::UnreachableSimplification)
        });
        Self {
            factories,
            lowering_hook: None,
        }
    }

    /// Install the target-lowering hook the `lowering` pass name resolves
    /// to. A pipeline referencing `"lowering"` without one fails to
    /// construct.
    pub fn with_lowering_hook(mut self, hook: LoweringHook) -> Self {
        self.lowering_hook = Some(hook);
        self
    }

    /// Register (or replace) a pass under a caller-chosen name, e.g. a
    /// backend-specific stage the core registry does not know about.
    pub fn register(&mut self, name: &'static str, factory: Factory) {
        self.factories.insert(name, factory);
    }

    /// Resolve every name in `names`, in order, to a fresh [`Pass`]
    /// instance. Fails on the first unknown name.
    pub fn resolve(&self, names: &[String]) -> KefirResult<Vec<Box<dyn Pass>>> {
        names.iter().map(|name| self.resolve_one(name)).collect()
    }

    fn resolve_one(&self, name: &str) -> KefirResult<Box<dyn Pass>> {
        if name == "lowering" {
            let hook = self.lowering_hook.clone().ok_or_else(|| {
                KefirError::not_found("pass \"lowering\" (no target-lowering hook installed)")
            })?;
            return Ok(Box::new(crate::passes::lowering::Lowering::new(hook)));
        }
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| KefirError::not_found(format!("pass \"{name}\"")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pass_name_fails_at_resolve_time() {
        let registry = PassRegistry::new();
        let err = registry
            .resolve(&["does-not-exist".to_string()])
            .unwrap_err();
        assert!(matches!(err, KefirError::NotFound { .. }));
    }

    #[test]
    fn every_documented_pass_resolves() {
        let registry = PassRegistry::new();
        let names = [
            "noop",
            "mem2reg",
            "compare-branch-fuse",
            "operation-simplification",
            "global-value-numbering",
            "constant-folding",
            "tail-call-marking",
            "unreachable-simplification",
        ]
        .map(str::to_string);
        let passes = registry.resolve(&names).unwrap();
        assert_eq!(passes.len(), names.len());
    }

    #[test]
    fn lowering_without_a_hook_fails_to_resolve() {
        let registry = PassRegistry::new();
        let err = registry.resolve(&["lowering".to_string()]).unwrap_err();
        assert!(matches!(err, KefirError::NotFound { .. }));
    }

    #[test]
    fn lowering_with_a_hook_resolves() {
        let registry = PassRegistry::new().with_lowering_hook(std::sync::Arc::new(|_, _| Ok(false)));
        let passes = registry.resolve(&["lowering".to_string()]).unwrap();
        assert_eq!(passes.len(), 1);
    }
}
