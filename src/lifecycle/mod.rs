//! Service group lifecycle
//!
//! Start and stop sequences for registered groups, and the outcomes they
//! report.

pub mod executor;
pub mod outcome;

pub use executor::LifecycleExecutor;
pub use outcome::{LifecycleOutcome, Operation, StepReport};
