//! groupctl - Service group lifecycle manager
//!
//! groupctl brings named groups of containers up and tears them down by
//! driving a compose-capable container engine. It provides:
//!
//! - A registry of named service groups, loaded from a groups file or
//!   falling back to the built-in `database` and `server` groups
//! - Ordered start (build, then detached start) and stop (teardown)
//!   sequences that stop at the first failing step
//! - Per-step reports with the engine's exit status and diagnostics

pub mod engine;
pub mod error;
pub mod group;
pub mod lifecycle;

pub use error::{GroupError, Result};
