//! Service group registry

use super::config::{ServiceGroup, TeardownFlag};
use crate::error::{GroupError, Result};
use std::collections::BTreeMap;

/// Names of the groups available without a groups file
pub const BUILTIN_GROUPS: &[&str] = &["database", "server"];

/// Registry of service groups, keyed by name
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: BTreeMap<String, ServiceGroup>,
}

impl GroupRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in groups
    ///
    /// Both live in the engine's default project and are addressed by
    /// service name.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for name in BUILTIN_GROUPS {
            let group = ServiceGroup::new(name)
                .build(true)
                .service(name)
                .teardown_flag(TeardownFlag::RemoveVolumes)
                .teardown_flag(TeardownFlag::RemoveLocalImages);
            registry.groups.insert(group.name.clone(), group);
        }
        registry
    }

    /// Build a registry from groups, failing on the first duplicate name
    pub fn from_groups<I>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = ServiceGroup>,
    {
        let mut registry = Self::new();
        for group in groups {
            registry.register(group)?;
        }
        Ok(registry)
    }

    /// Register a group
    pub fn register(&mut self, group: ServiceGroup) -> Result<()> {
        if self.groups.contains_key(&group.name) {
            return Err(GroupError::DuplicateGroup(group.name));
        }

        tracing::debug!("Registered group {}", group.name);
        self.groups.insert(group.name.clone(), group);
        Ok(())
    }

    /// Look up a group by name
    pub fn resolve(&self, name: &str) -> Result<&ServiceGroup> {
        self.groups
            .get(name)
            .ok_or_else(|| GroupError::UnknownGroup(name.to_string()))
    }

    /// Registered group names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.groups.keys().map(|s| s.as_str()).collect()
    }

    /// Iterate over groups, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &ServiceGroup> {
        self.groups.values()
    }

    /// Number of registered groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no groups are registered
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = GroupRegistry::new();
        registry.register(ServiceGroup::new("database").build(true)).unwrap();

        let group = registry.resolve("database").unwrap();
        assert!(group.build_required);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_leaves_registry_unchanged() {
        let mut registry = GroupRegistry::new();
        registry.register(ServiceGroup::new("server").build(true)).unwrap();

        let result = registry.register(ServiceGroup::new("server").service("other"));
        assert!(matches!(result, Err(GroupError::DuplicateGroup(ref n)) if n == "server"));

        assert_eq!(registry.len(), 1);
        let group = registry.resolve("server").unwrap();
        assert!(group.build_required);
        assert!(group.services.is_empty());
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = GroupRegistry::builtin();
        let result = registry.resolve("cache");
        assert!(matches!(result, Err(GroupError::UnknownGroup(ref n)) if n == "cache"));
    }

    #[test]
    fn test_builtin_groups() {
        let registry = GroupRegistry::builtin();
        assert_eq!(registry.names(), vec!["database", "server"]);

        for group in registry.iter() {
            assert!(group.build_required);
            assert_eq!(group.services, vec![group.name.clone()]);
            assert!(group.teardown_flags.contains(&TeardownFlag::RemoveVolumes));
            assert!(group.teardown_flags.contains(&TeardownFlag::RemoveLocalImages));
        }
    }

    #[test]
    fn test_builtin_groups_share_the_default_project() {
        use crate::engine::EngineStep;

        let registry = GroupRegistry::builtin();

        let database = registry.resolve("database").unwrap();
        assert_eq!(database.project_name(), None);
        assert_eq!(EngineStep::build(database).args, vec!["build", "database"]);
        assert_eq!(EngineStep::start(database).args, vec!["up", "-d", "database"]);
        assert_eq!(
            EngineStep::teardown(database).args,
            vec!["down", "-v", "--rmi", "local", "database"]
        );

        let server = registry.resolve("server").unwrap();
        let teardown = EngineStep::teardown(server);
        assert!(!teardown.args.contains(&"-p".to_string()));
        assert_eq!(teardown.args.last().map(String::as_str), Some("server"));
    }

    #[test]
    fn test_from_groups_stops_at_duplicate() {
        let result = GroupRegistry::from_groups(vec![
            ServiceGroup::new("a"),
            ServiceGroup::new("b"),
            ServiceGroup::new("a"),
        ]);
        assert!(matches!(result, Err(GroupError::DuplicateGroup(_))));
    }
}
