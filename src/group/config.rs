//! Service group configuration types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Groups file configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsConfig {
    /// Group definitions, in file order
    #[serde(default)]
    pub groups: Vec<ServiceGroup>,
}

/// A named collection of lifecycle steps treated as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceGroup {
    /// Group name (unique within a registry)
    pub name: String,
    /// Build images before starting
    #[serde(default, rename = "build")]
    pub build_required: bool,
    /// Compose file to use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose_file: Option<PathBuf>,
    /// Compose project name (defaults to the engine's own project)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Compose services addressed by build and start
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<String>,
    /// Options applied to the start step
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub start_flags: BTreeSet<StartFlag>,
    /// Options applied to the teardown step
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub teardown_flags: BTreeSet<TeardownFlag>,
    /// Extra environment for the engine process
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// Directory the engine runs in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl ServiceGroup {
    /// Create a group with no build step and no flags
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            build_required: false,
            compose_file: None,
            project: None,
            services: Vec::new(),
            start_flags: BTreeSet::new(),
            teardown_flags: BTreeSet::new(),
            environment: BTreeMap::new(),
            working_dir: None,
        }
    }

    /// Set whether images are built before starting
    pub fn build(mut self, required: bool) -> Self {
        self.build_required = required;
        self
    }

    /// Set the compose file
    pub fn compose_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.compose_file = Some(path.into());
        self
    }

    /// Set the compose project name
    pub fn project(mut self, project: &str) -> Self {
        self.project = Some(project.to_string());
        self
    }

    /// Add a compose service
    pub fn service(mut self, service: &str) -> Self {
        self.services.push(service.to_string());
        self
    }

    /// Add a start flag
    pub fn start_flag(mut self, flag: StartFlag) -> Self {
        self.start_flags.insert(flag);
        self
    }

    /// Add a teardown flag
    pub fn teardown_flag(mut self, flag: TeardownFlag) -> Self {
        self.teardown_flags.insert(flag);
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.environment.insert(key.to_string(), value.to_string());
        self
    }

    /// Compose project name, if one is configured
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_deref()
    }
}

/// Options for the start step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartFlag {
    /// Remove containers for services not in the compose file
    RemoveOrphans,
    /// Recreate containers even if unchanged
    ForceRecreate,
    /// Don't start linked services
    NoDeps,
    /// Wait for services to be running or healthy
    Wait,
}

impl StartFlag {
    /// Compose command-line argument
    pub fn as_arg(&self) -> &'static str {
        match self {
            StartFlag::RemoveOrphans => "--remove-orphans",
            StartFlag::ForceRecreate => "--force-recreate",
            StartFlag::NoDeps => "--no-deps",
            StartFlag::Wait => "--wait",
        }
    }
}

/// Options for the teardown step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeardownFlag {
    /// Remove named and anonymous volumes
    RemoveVolumes,
    /// Remove images built for the group
    RemoveLocalImages,
    /// Remove every image used by the group
    RemoveAllImages,
    /// Remove containers for services not in the compose file
    RemoveOrphans,
}

impl TeardownFlag {
    /// Compose command-line arguments
    pub fn as_args(&self) -> &'static [&'static str] {
        match self {
            TeardownFlag::RemoveVolumes => &["-v"],
            TeardownFlag::RemoveLocalImages => &["--rmi", "local"],
            TeardownFlag::RemoveAllImages => &["--rmi", "all"],
            TeardownFlag::RemoveOrphans => &["--remove-orphans"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_group() {
        let yaml = r#"
name: server
build: true
services: [server]
start_flags: [wait, remove-orphans]
teardown_flags: [remove-volumes, remove-local-images]
environment:
  PORT: "8000"
"#;

        let group: ServiceGroup = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(group.name, "server");
        assert!(group.build_required);
        assert_eq!(group.services, vec!["server"]);
        assert!(group.start_flags.contains(&StartFlag::Wait));
        assert!(group.teardown_flags.contains(&TeardownFlag::RemoveLocalImages));
        assert_eq!(group.environment.get("PORT").map(String::as_str), Some("8000"));
        assert_eq!(group.project_name(), None);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let yaml = r#"
name: server
teardown_flags: [remove-everything]
"#;

        assert!(serde_yaml::from_str::<ServiceGroup>(yaml).is_err());
    }

    #[test]
    fn test_project_override() {
        let group = ServiceGroup::new("database").project("shop-db");
        assert_eq!(group.project_name(), Some("shop-db"));
    }
}
