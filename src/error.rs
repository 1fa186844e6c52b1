//! Error types for groupctl

use thiserror::Error;

/// Result type for groupctl operations
pub type Result<T> = std::result::Result<T, GroupError>;

/// groupctl error types
#[derive(Error, Debug)]
pub enum GroupError {
    #[error("Group already registered: {0}")]
    DuplicateGroup(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Build failed for group {group} ({}): {diagnostics}", describe_status(.status))]
    BuildFailed {
        group: String,
        status: Option<i32>,
        diagnostics: String,
    },

    #[error("Start failed for group {group} ({}): {diagnostics}", describe_status(.status))]
    StartFailed {
        group: String,
        status: Option<i32>,
        diagnostics: String,
    },

    #[error("Teardown failed for group {group} ({}): {diagnostics}", describe_status(.status))]
    TeardownFailed {
        group: String,
        status: Option<i32>,
        diagnostics: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GroupError {
    /// Exit status reported by the engine for a failed step, if any
    pub fn engine_status(&self) -> Option<i32> {
        match self {
            GroupError::BuildFailed { status, .. }
            | GroupError::StartFailed { status, .. }
            | GroupError::TeardownFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this error came from a lifecycle step rather than from
    /// registry lookup or configuration
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self,
            GroupError::BuildFailed { .. }
                | GroupError::StartFailed { .. }
                | GroupError::TeardownFailed { .. }
        )
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        if self.is_step_failure() {
            match self.engine_status() {
                Some(code) if (1..=255).contains(&code) => code as u8,
                _ => 1,
            }
        } else {
            match self {
                GroupError::Io(_) | GroupError::Json(_) => 1,
                _ => 2,
            }
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failure_exit_code_follows_engine() {
        let err = GroupError::StartFailed {
            group: "server".to_string(),
            status: Some(17),
            diagnostics: "port is already allocated".to_string(),
        };
        assert!(err.is_step_failure());
        assert_eq!(err.exit_code(), 17);
        assert!(err.to_string().contains("exit status 17"));
        assert!(err.to_string().contains("port is already allocated"));
    }

    #[test]
    fn test_step_failure_without_status_exits_one() {
        let err = GroupError::BuildFailed {
            group: "database".to_string(),
            status: None,
            diagnostics: "No such file or directory".to_string(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("no exit status"));

        let err = GroupError::TeardownFailed {
            group: "database".to_string(),
            status: Some(300),
            diagnostics: String::new(),
        };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_registry_errors_exit_two() {
        assert_eq!(GroupError::UnknownGroup("x".to_string()).exit_code(), 2);
        assert_eq!(GroupError::DuplicateGroup("x".to_string()).exit_code(), 2);
        assert_eq!(GroupError::Config("bad".to_string()).exit_code(), 2);
        assert!(!GroupError::UnknownGroup("x".to_string()).is_step_failure());
    }
}
