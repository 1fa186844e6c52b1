//! Service group definitions
//!
//! This module holds the named service groups a process can bring up and
//! tear down, and the groups file format they are loaded from.

pub mod config;
pub mod parser;
pub mod registry;

pub use config::{GroupsConfig, ServiceGroup, StartFlag, TeardownFlag};
pub use parser::{GroupsParser, GroupsSource, LoadedGroups};
pub use registry::GroupRegistry;
