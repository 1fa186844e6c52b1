//! Compose CLI engine

use super::step::{EngineStep, StepOutput};
use super::ContainerEngine;
use crate::error::Result;
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;

/// Which compose command line to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineFlavor {
    /// Detect from `PATH`
    #[default]
    Auto,
    /// `docker compose`
    Docker,
    /// Standalone `docker-compose`
    DockerCompose,
    /// `podman compose`
    Podman,
}

impl FromStr for EngineFlavor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(EngineFlavor::Auto),
            "docker" => Ok(EngineFlavor::Docker),
            "docker-compose" => Ok(EngineFlavor::DockerCompose),
            "podman" => Ok(EngineFlavor::Podman),
            other => Err(format!(
                "unknown engine '{}' (expected auto, docker, docker-compose or podman)",
                other
            )),
        }
    }
}

impl std::fmt::Display for EngineFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineFlavor::Auto => write!(f, "auto"),
            EngineFlavor::Docker => write!(f, "docker"),
            EngineFlavor::DockerCompose => write!(f, "docker-compose"),
            EngineFlavor::Podman => write!(f, "podman"),
        }
    }
}

impl EngineFlavor {
    /// Resolve `Auto` against the binaries on `PATH`
    ///
    /// Prefers `docker`, then standalone `docker-compose`, then `podman`.
    /// With none installed this still resolves to `docker`; the missing
    /// binary surfaces as a step failure.
    pub fn resolve(self) -> Self {
        if self != EngineFlavor::Auto {
            return self;
        }

        let flavor = if which::which("docker").is_ok() {
            EngineFlavor::Docker
        } else if which::which("docker-compose").is_ok() {
            EngineFlavor::DockerCompose
        } else if which::which("podman").is_ok() {
            EngineFlavor::Podman
        } else {
            EngineFlavor::Docker
        };

        tracing::debug!("Detected compose engine: {}", flavor);
        flavor
    }
}

/// Container engine driven through its compose command line
#[derive(Debug, Clone)]
pub struct ComposeEngine {
    program: String,
    prefix: Vec<String>,
}

impl ComposeEngine {
    /// Create an engine for a flavor, resolving `Auto`
    pub fn new(flavor: EngineFlavor) -> Self {
        match flavor.resolve() {
            EngineFlavor::DockerCompose => Self::with_program("docker-compose", &[]),
            EngineFlavor::Podman => Self::with_program("podman", &["compose"]),
            EngineFlavor::Docker | EngineFlavor::Auto => Self::with_program("docker", &["compose"]),
        }
    }

    /// Create an engine running an arbitrary program with a fixed prefix
    pub fn with_program(program: &str, prefix: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Full command line for a step
    pub fn command_line(&self, step: &EngineStep) -> Vec<String> {
        let mut line = Vec::with_capacity(1 + self.prefix.len() + step.args.len());
        line.push(self.program.clone());
        line.extend(self.prefix.iter().cloned());
        line.extend(step.args.iter().cloned());
        line
    }
}

impl ContainerEngine for ComposeEngine {
    async fn run(&self, step: &EngineStep) -> Result<StepOutput> {
        tracing::debug!("Running: {}", self.command_line(step).join(" "));

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix)
            .args(&step.args)
            .envs(&step.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(ref dir) = step.working_dir {
            cmd.current_dir(dir);
        }

        let output = StepOutput::from(cmd.output().await?);

        for line in output.stdout.lines().chain(output.stderr.lines()) {
            tracing::debug!("[{} {}] {}", step.group, step.kind, line);
        }

        Ok(output)
    }
}
