//! Asmcmp pipeline execution: an ordered pass list, filtered by
//! [`PassKind`] and applied to one function's instruction sequence at a
//! time (`spec.md` §4.4).

use kefir_diagnostics::KefirResult;

use crate::{
    function::AsmFunction,
    pass::{
        AsmPass,
        PassKind,
    },
};

/// An ordered, already-resolved sequence of asmcmp passes.
pub struct AsmPipeline {
    passes: Vec<Box<dyn AsmPass>>,
}

impl AsmPipeline {
    /// Build a pipeline from already-resolved passes, e.g. the output of
    /// [`crate::registry::AsmPassRegistry::resolve`].
    pub fn new(passes: Vec<Box<dyn AsmPass>>) -> Self {
        Self { passes }
    }

    /// The resolved pass names, in execution order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Run every pass whose [`PassKind`] matches `filter`, in order, over
    /// `function`. Register allocation itself is an external collaborator
    /// invoked between a `Virtual`-filtered run and a `Devirtual`-filtered
    /// one (`spec.md` §4.4, "the pipeline runs once pre-allocation... and
    /// once post-allocation").
    #[tracing::instrument(skip_all, fields(passes = self.passes.len()))]
    pub fn run(&self, function: &mut AsmFunction, filter: PassKind) -> KefirResult<()> {
        for pass in &self.passes {
            if !pass.kind().matches(filter) {
                continue;
            }
            let changed = pass.run(function).map_err(|err| {
                tracing::error!(pass = pass.name(), error = %err, "asmcmp pass failed");
                err
            })?;
            if changed {
                tracing::trace!(pass = pass.name(), "asmcmp pass changed the function");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kefir_diagnostics::KefirError;

    use super::*;
    use crate::instruction::{
        AsmInstruction,
        AsmOpcode,
        AsmOperandData,
    };

    struct MarksVirtual;
    impl AsmPass for MarksVirtual {
        fn name(&self) -> &'static str {
            "marks-virtual"
        }
        fn kind(&self) -> PassKind {
            PassKind::Virtual
        }
        fn run(&self, function: &mut AsmFunction) -> KefirResult<bool> {
            function.push(AsmInstruction {
                opcode: AsmOpcode::Nop,
                operands: AsmOperandData::None,
            });
            Ok(true)
        }
    }

    struct AlwaysFails;
    impl AsmPass for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }
        fn kind(&self) -> PassKind {
            PassKind::Both
        }
        fn run(&self, _function: &mut AsmFunction) -> KefirResult<bool> {
            Err(KefirError::internal("deliberate test failure"))
        }
    }

    #[test]
    fn a_virtual_only_pass_is_skipped_under_the_devirtual_filter() {
        let pipeline = AsmPipeline::new(vec![Box::new(MarksVirtual)]);
        let mut function = AsmFunction::new();
        pipeline.run(&mut function, PassKind::Devirtual).unwrap();
        assert_eq!(function.live_instruction_refs().count(), 0);
    }

    #[test]
    fn a_virtual_only_pass_runs_under_the_virtual_filter() {
        let pipeline = AsmPipeline::new(vec![Box::new(MarksVirtual)]);
        let mut function = AsmFunction::new();
        pipeline.run(&mut function, PassKind::Virtual).unwrap();
        assert_eq!(function.live_instruction_refs().count(), 1);
    }

    #[test]
    fn pass_failure_propagates_as_an_error() {
        let pipeline = AsmPipeline::new(vec![Box::new(AlwaysFails)]);
        let mut function = AsmFunction::new();
        let err = pipeline.run(&mut function, PassKind::Both).unwrap_err();
        assert!(matches!(err, KefirError::Internal { .. }));
    }
}
