//! Lifecycle steps issued to the container engine

use crate::group::ServiceGroup;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Kind of lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Build images
    Build,
    /// Create and start containers, detached
    Start,
    /// Stop and remove containers, plus flagged volumes and images
    Teardown,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Build => write!(f, "build"),
            StepKind::Start => write!(f, "start"),
            StepKind::Teardown => write!(f, "teardown"),
        }
    }
}

/// One invocation of the container engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStep {
    /// Step kind
    pub kind: StepKind,
    /// Group this step belongs to
    pub group: String,
    /// Compose arguments (after the engine's own program and prefix)
    pub args: Vec<String>,
    /// Extra environment for the engine process
    pub environment: BTreeMap<String, String>,
    /// Directory to run in
    pub working_dir: Option<PathBuf>,
}

impl EngineStep {
    /// Image build step: `build [services]`
    pub fn build(group: &ServiceGroup) -> Self {
        let mut args = project_args(group);
        args.push("build".to_string());
        args.extend(group.services.iter().cloned());
        Self::new(StepKind::Build, group, args)
    }

    /// Detached start step: `up -d [flags] [services]`
    pub fn start(group: &ServiceGroup) -> Self {
        let mut args = project_args(group);
        args.push("up".to_string());
        args.push("-d".to_string());
        args.extend(group.start_flags.iter().map(|f| f.as_arg().to_string()));
        args.extend(group.services.iter().cloned());
        Self::new(StepKind::Start, group, args)
    }

    /// Teardown step: `down [flags] [services]`
    pub fn teardown(group: &ServiceGroup) -> Self {
        let mut args = project_args(group);
        args.push("down".to_string());
        for flag in &group.teardown_flags {
            args.extend(flag.as_args().iter().map(|a| a.to_string()));
        }
        args.extend(group.services.iter().cloned());
        Self::new(StepKind::Teardown, group, args)
    }

    fn new(kind: StepKind, group: &ServiceGroup, args: Vec<String>) -> Self {
        Self {
            kind,
            group: group.name.clone(),
            args,
            environment: group.environment.clone(),
            working_dir: group.working_dir.clone(),
        }
    }
}

fn project_args(group: &ServiceGroup) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(ref file) = group.compose_file {
        args.push("-f".to_string());
        args.push(file.to_string_lossy().into_owned());
    }
    if let Some(project) = group.project_name() {
        args.push("-p".to_string());
        args.push(project.to_string());
    }
    args
}

/// Captured result of an engine invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl StepOutput {
    /// Successful output with no text
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            ..Default::default()
        }
    }

    /// Failed output with an exit code and error text
    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Whether the engine reported success
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Diagnostic text for a failed step
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

impl From<std::process::Output> for StepOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}
