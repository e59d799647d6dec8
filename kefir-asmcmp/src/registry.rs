//! Asmcmp pass-name resolution, mirroring `kefir_passes::registry`
//! (`spec.md` §4.4, §6 "Asmcmp configuration... ordered list of asmcmp
//! pass names, tagged by the kind filter under which they run").

use hashbrown::HashMap;
use kefir_diagnostics::{
    KefirError,
    KefirResult,
};

use crate::pass::AsmPass;

type Factory = fn() -> Box<dyn AsmPass>;

/// Resolves asmcmp pass names to freshly constructed [`AsmPass`] instances.
pub struct AsmPassRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl Default for AsmPassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AsmPassRegistry {
    /// A registry with every documented asmcmp pass registered under its
    /// canonical name.
    pub fn new() -> Self {
        let mut factories: HashMap<&'static str, Factory> = HashMap::new();
        factories.insert("amd64-peephole", || Box::new(crate::passes::peephole::Amd64Peephole));
        factories.insert("amd64-drop-virtual", || Box::new(crate::passes::drop_virtual::Amd64DropVirtual));
        factories.insert("amd64-propagate-jump", || Box::new(crate::passes::propagate_jump::Amd64PropagateJump));
        factories.insert("amd64-eliminate-label", || Box::new(crate::passes::eliminate_label::Amd64EliminateLabel));
        Self { factories }
    }

    /// Register (or replace) a pass under a caller-chosen name.
    pub fn register(&mut self, name: &'static str, factory: Factory) {
        self.factories.insert(name, factory);
    }

    /// Resolve every name in `names`, in order, to a fresh [`AsmPass`]
    /// instance. Fails on the first unknown name, at construction time
    /// rather than when the pipeline runs.
    pub fn resolve(&self, names: &[String]) -> KefirResult<Vec<Box<dyn AsmPass>>> {
        names.iter().map(|name| self.resolve_one(name)).collect()
    }

    fn resolve_one(&self, name: &str) -> KefirResult<Box<dyn AsmPass>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| KefirError::not_found(format!("asmcmp pass \"{name}\"")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pass_name_fails_at_resolve_time() {
        let registry = AsmPassRegistry::new();
        let err = registry.resolve(&["does-not-exist".to_string()]).unwrap_err();
        assert!(matches!(err, KefirError::NotFound { .. }));
    }

    #[test]
    fn every_documented_pass_resolves() {
        let registry = AsmPassRegistry::new();
        let names = [
            "amd64-peephole",
            "amd64-drop-virtual",
            "amd64-propagate-jump",
            "amd64-eliminate-label",
        ]
        .map(str::to_string);
        let passes = registry.resolve(&names).unwrap();
        assert_eq!(passes.len(), names.len());
    }
}
