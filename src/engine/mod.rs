//! Container engine access
//!
//! The engine is an external collaborator. Lifecycle steps reach it only
//! through [`ContainerEngine`], which runs one [`EngineStep`] and reports
//! what the engine said.

pub mod compose;
pub mod step;

pub use compose::{ComposeEngine, EngineFlavor};
pub use step::{EngineStep, StepKind, StepOutput};

use crate::error::Result;

/// Something that can carry out lifecycle steps
///
/// `run` returns `Err` only when the engine could not be invoked at all.
/// A nonzero exit is an `Ok` output; the caller decides what it means.
#[allow(async_fn_in_trait)]
pub trait ContainerEngine {
    /// Run a single step to completion
    async fn run(&self, step: &EngineStep) -> Result<StepOutput>;
}
