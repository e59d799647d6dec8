//! The optimizer pass registry, pipeline driver and the documented
//! transformation passes themselves (`spec.md` §4.3).

pub mod pass;
pub mod passes;
pub mod pipeline;
pub mod registry;

pub use pass::{
    LoweringHook,
    Pass,
};
pub use pipeline::Pipeline;
pub use registry::PassRegistry;

/// Re-exports intended for `use kefir_passes::prelude::*;`.
pub mod prelude {
    pub use crate::{
        LoweringHook,
        Pass,
        PassRegistry,
        Pipeline,
    };
}
