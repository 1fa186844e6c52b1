//! Groups file parser

use super::config::{GroupsConfig, ServiceGroup, TeardownFlag};
use super::registry::GroupRegistry;
use crate::error::{GroupError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Default groups file names, searched in the working directory
pub const DEFAULT_GROUPS_FILES: &[&str] = &["groupctl.yaml", "groupctl.yml", ".groupctl.yaml"];

/// Where the registered groups came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupsSource {
    /// Built-in database and server groups
    Builtin,
    /// A groups file
    File(PathBuf),
}

impl std::fmt::Display for GroupsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupsSource::Builtin => write!(f, "built-in groups"),
            GroupsSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Result of loading groups for a process
#[derive(Debug)]
pub struct LoadedGroups {
    /// Populated registry
    pub registry: GroupRegistry,
    /// Origin of the definitions
    pub source: GroupsSource,
    /// Non-fatal validation findings
    pub warnings: Vec<String>,
}

/// Groups file parser
pub struct GroupsParser;

impl GroupsParser {
    /// Find a groups file in directory
    pub fn find_groups_file(dir: &Path) -> Option<PathBuf> {
        for name in DEFAULT_GROUPS_FILES {
            let path = dir.join(name);
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Per-user groups file location
    pub fn user_groups_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("groupctl").join("groups.yaml"))
    }

    /// Pick the groups file to load, if any
    ///
    /// An explicit path always wins, then the working directory, then the
    /// per-user file. `None` means the built-in groups apply. A relative
    /// explicit path is taken from `working_dir`.
    pub fn discover(
        explicit: Option<&Path>,
        working_dir: &Path,
        user_file: Option<PathBuf>,
    ) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            let path = working_dir.join(path);
            if !path.exists() {
                return Err(GroupError::Config(format!(
                    "Groups file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        if let Some(path) = Self::find_groups_file(working_dir) {
            return Ok(Some(path));
        }

        Ok(user_file.filter(|p| p.exists()))
    }

    /// Parse groups file from path
    pub fn parse_file(path: &Path) -> Result<GroupsConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GroupError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_str(&content)
    }

    /// Parse groups file from string
    pub fn parse_str(content: &str) -> Result<GroupsConfig> {
        if content.trim().is_empty() {
            return Ok(GroupsConfig::default());
        }

        serde_yaml::from_str(content)
            .map_err(|e| GroupError::Config(format!("Failed to parse YAML: {}", e)))
    }

    /// Load groups for this process and register them
    pub fn load(
        explicit: Option<&Path>,
        working_dir: &Path,
        env: &HashMap<String, String>,
    ) -> Result<LoadedGroups> {
        let Some(path) = Self::discover(explicit, working_dir, Self::user_groups_file())? else {
            tracing::debug!("No groups file found, using built-in groups");
            return Ok(LoadedGroups {
                registry: GroupRegistry::builtin(),
                source: GroupsSource::Builtin,
                warnings: Vec::new(),
            });
        };

        tracing::debug!("Loading groups from {}", path.display());

        let mut config = Self::parse_file(&path)?;
        Self::interpolate(&mut config, env);

        // Engine steps run with `working_dir` as their cwd, so both paths
        // must be absolute before they reach it
        let base_dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => working_dir.join(parent),
            None => working_dir.to_path_buf(),
        };
        Self::resolve_paths(&mut config, &base_dir);

        let warnings = Self::validate(&config)?;
        let registry = GroupRegistry::from_groups(config.groups)?;

        Ok(LoadedGroups {
            registry,
            source: GroupsSource::File(path),
            warnings,
        })
    }

    /// Make relative compose files and working directories absolute
    pub fn resolve_paths(config: &mut GroupsConfig, base_dir: &Path) {
        for group in &mut config.groups {
            if let Some(ref mut file) = group.compose_file {
                if file.is_relative() {
                    *file = base_dir.join(&*file);
                }
            }
            if let Some(ref mut dir) = group.working_dir {
                if dir.is_relative() {
                    *dir = base_dir.join(&*dir);
                }
            }
        }
    }

    /// Validate groups configuration
    pub fn validate(config: &GroupsConfig) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if config.groups.is_empty() {
            warnings.push("No groups defined".to_string());
        }

        for group in &config.groups {
            Self::validate_group(group, &mut warnings)?;
        }

        Ok(warnings)
    }

    fn validate_group(group: &ServiceGroup, warnings: &mut Vec<String>) -> Result<()> {
        if !is_valid_name(&group.name) {
            return Err(GroupError::Config(format!(
                "Invalid group name '{}': use lowercase letters, digits, '-' and '_'",
                group.name
            )));
        }

        if let Some(ref project) = group.project {
            if !is_valid_name(project) {
                return Err(GroupError::Config(format!(
                    "Group '{}' has invalid project name '{}'",
                    group.name, project
                )));
            }
        }

        if group.services.iter().any(|s| s.trim().is_empty()) {
            return Err(GroupError::Config(format!(
                "Group '{}' lists an empty service name",
                group.name
            )));
        }

        if group.teardown_flags.contains(&TeardownFlag::RemoveLocalImages)
            && group.teardown_flags.contains(&TeardownFlag::RemoveAllImages)
        {
            return Err(GroupError::Config(format!(
                "Group '{}' sets both remove-local-images and remove-all-images",
                group.name
            )));
        }

        if let Some(ref file) = group.compose_file {
            if !file.exists() {
                warnings.push(format!(
                    "Group '{}' references missing compose file {}",
                    group.name,
                    file.display()
                ));
            }
        }

        if let Some(ref dir) = group.working_dir {
            if !dir.is_dir() {
                warnings.push(format!(
                    "Group '{}' working directory {} does not exist",
                    group.name,
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Interpolate environment variables in config
    pub fn interpolate(config: &mut GroupsConfig, env: &HashMap<String, String>) {
        for group in &mut config.groups {
            if let Some(ref mut project) = group.project {
                *project = interpolate_string(project, env);
            }

            if let Some(ref mut file) = group.compose_file {
                *file = PathBuf::from(interpolate_string(&file.to_string_lossy(), env));
            }

            if let Some(ref mut dir) = group.working_dir {
                *dir = PathBuf::from(interpolate_string(&dir.to_string_lossy(), env));
            }

            for value in group.environment.values_mut() {
                *value = interpolate_string(value, env);
            }
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid name pattern"))
        .is_match(name)
}

/// Interpolate `$VAR`, `${VAR}` and `${VAR:-default}`; `$$` is a literal `$`
fn interpolate_string(s: &str, env: &HashMap<String, String>) -> String {
    static VAR: OnceLock<Regex> = OnceLock::new();
    let re = VAR.get_or_init(|| {
        Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("valid interpolation pattern")
    });

    re.replace_all(s, |caps: &regex::Captures| {
        if &caps[0] == "$$" {
            return "$".to_string();
        }

        let var = caps.get(1).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        match (env.get(var), caps.get(2)) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => String::new(),
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
groups:
  - name: database
    build: true
    compose_file: docker-compose.yml
    services: [database]
    teardown_flags: [remove-volumes, remove-local-images]
    environment:
      POSTGRES_PASSWORD: ${DATABASE_PASSWORD:-postgres}
  - name: server
    build: true
    services: [server]
    start_flags: [wait]
"#;

    #[test]
    fn test_parse_groups_file() {
        let config = GroupsParser::parse_str(SAMPLE).unwrap();
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[0].name, "database");
        assert_eq!(config.groups[1].name, "server");
    }

    #[test]
    fn test_parse_empty_file() {
        let config = GroupsParser::parse_str("   \n").unwrap();
        assert!(config.groups.is_empty());

        let warnings = GroupsParser::validate(&config).unwrap();
        assert_eq!(warnings, vec!["No groups defined".to_string()]);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = GroupsParser::parse_str("groups: [name: {");
        assert!(matches!(result, Err(GroupError::Config(_))));
    }

    #[test]
    fn test_interpolate() {
        let mut env = HashMap::new();
        env.insert("TAG".to_string(), "1.0.0".to_string());

        assert_eq!(interpolate_string("nginx:${TAG}", &env), "nginx:1.0.0");
        assert_eq!(interpolate_string("nginx:$TAG", &env), "nginx:1.0.0");
        assert_eq!(interpolate_string("${MISSING:-fallback}", &env), "fallback");
        assert_eq!(interpolate_string("${TAG:-fallback}", &env), "1.0.0");
        assert_eq!(interpolate_string("x${MISSING}y", &env), "xy");
        assert_eq!(interpolate_string("cost: $$5", &env), "cost: $5");
    }

    #[test]
    fn test_interpolate_config() {
        let mut config = GroupsParser::parse_str(SAMPLE).unwrap();
        let mut env = HashMap::new();
        env.insert("DATABASE_PASSWORD".to_string(), "hunter2".to_string());

        GroupsParser::interpolate(&mut config, &env);
        assert_eq!(
            config.groups[0].environment.get("POSTGRES_PASSWORD").map(String::as_str),
            Some("hunter2")
        );
    }

    #[test]
    fn test_validate_rejects_bad_name() {
        let config = GroupsParser::parse_str("groups:\n  - name: My Group\n").unwrap();
        assert!(matches!(GroupsParser::validate(&config), Err(GroupError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_conflicting_image_flags() {
        let yaml = r#"
groups:
  - name: server
    teardown_flags: [remove-local-images, remove-all-images]
"#;
        let config = GroupsParser::parse_str(yaml).unwrap();
        assert!(GroupsParser::validate(&config).is_err());
    }

    #[test]
    fn test_validate_warns_on_missing_compose_file() {
        let dir = tempdir().unwrap();
        let mut config = GroupsParser::parse_str(SAMPLE).unwrap();
        GroupsParser::resolve_paths(&mut config, dir.path());

        let warnings = GroupsParser::validate(&config).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("database"));
    }

    #[test]
    fn test_resolve_paths_relative_to_file() {
        let dir = tempdir().unwrap();
        let mut config = GroupsParser::parse_str(SAMPLE).unwrap();
        GroupsParser::resolve_paths(&mut config, dir.path());

        assert_eq!(
            config.groups[0].compose_file.as_deref(),
            Some(dir.path().join("docker-compose.yml").as_path())
        );
        assert!(config.groups[1].compose_file.is_none());
    }

    #[test]
    fn test_discover_order() {
        let dir = tempdir().unwrap();
        let user_dir = tempdir().unwrap();
        let user_file = user_dir.path().join("groups.yaml");

        // Nothing anywhere: built-ins
        let found = GroupsParser::discover(None, dir.path(), Some(user_file.clone())).unwrap();
        assert!(found.is_none());

        // User file only
        std::fs::write(&user_file, SAMPLE).unwrap();
        let found = GroupsParser::discover(None, dir.path(), Some(user_file.clone())).unwrap();
        assert_eq!(found, Some(user_file.clone()));

        // Working directory beats user file
        let local = dir.path().join("groupctl.yml");
        std::fs::write(&local, SAMPLE).unwrap();
        let found = GroupsParser::discover(None, dir.path(), Some(user_file.clone())).unwrap();
        assert_eq!(found, Some(local));

        // Explicit beats everything
        let found =
            GroupsParser::discover(Some(user_file.as_path()), dir.path(), Some(user_file.clone())).unwrap();
        assert_eq!(found, Some(user_file));
    }

    #[test]
    fn test_discover_missing_explicit_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let result = GroupsParser::discover(Some(missing.as_path()), dir.path(), None);
        assert!(matches!(result, Err(GroupError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groupctl.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();

        let loaded = GroupsParser::load(Some(path.as_path()), dir.path(), &HashMap::new()).unwrap();
        assert_eq!(loaded.source, GroupsSource::File(path));
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.registry.names(), vec!["database", "server"]);

        let database = loaded.registry.resolve("database").unwrap();
        assert_eq!(
            database.environment.get("POSTGRES_PASSWORD").map(String::as_str),
            Some("postgres")
        );
    }

    #[test]
    fn test_load_relative_groups_file() {
        let dir = tempdir().unwrap();
        let deploy = dir.path().join("deploy");
        std::fs::create_dir(&deploy).unwrap();
        std::fs::write(deploy.join("docker-compose.yml"), "services: {}\n").unwrap();
        std::fs::write(
            deploy.join("groupctl.yaml"),
            "groups:\n  - name: server\n    compose_file: docker-compose.yml\n    working_dir: .\n    services: [server]\n",
        )
        .unwrap();

        let loaded =
            GroupsParser::load(Some(Path::new("deploy/groupctl.yaml")), dir.path(), &HashMap::new())
                .unwrap();
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.source, GroupsSource::File(deploy.join("groupctl.yaml")));

        let server = loaded.registry.resolve("server").unwrap();
        let compose_file = server.compose_file.clone().unwrap();
        let run_dir = server.working_dir.clone().unwrap();
        assert!(compose_file.is_absolute());
        assert!(run_dir.is_absolute());
        assert_eq!(compose_file, deploy.join("docker-compose.yml"));

        // The engine resolves -f against its cwd; an absolute path ignores it
        let effective = run_dir.join(&compose_file);
        assert_eq!(effective, compose_file);
        assert!(effective.exists());

        let step = crate::engine::EngineStep::start(server);
        assert_eq!(step.args[1], compose_file.to_string_lossy());
    }

    #[test]
    fn test_load_duplicate_groups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groupctl.yaml");
        std::fs::write(&path, "groups:\n  - name: server\n  - name: server\n").unwrap();

        let result = GroupsParser::load(Some(path.as_path()), dir.path(), &HashMap::new());
        assert!(matches!(result, Err(GroupError::DuplicateGroup(ref n)) if n == "server"));
    }
}
