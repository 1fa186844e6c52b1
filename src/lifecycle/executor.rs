//! Group lifecycle execution

use super::outcome::{LifecycleOutcome, Operation, StepReport};
use crate::engine::{ContainerEngine, EngineStep, StepKind};
use crate::error::{GroupError, Result};
use crate::group::{GroupRegistry, ServiceGroup};
use chrono::Utc;
use std::time::Instant;

/// Runs start and stop sequences for registered groups
///
/// Steps run strictly in order. The first failing step ends the sequence
/// and nothing already applied is rolled back.
pub struct LifecycleExecutor<'a, E> {
    registry: &'a GroupRegistry,
    engine: E,
}

impl<'a, E: ContainerEngine> LifecycleExecutor<'a, E> {
    /// Create an executor over a registry
    pub fn new(registry: &'a GroupRegistry, engine: E) -> Self {
        Self { registry, engine }
    }

    /// The engine steps are issued to
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Steps an operation would issue, without running them
    pub fn plan(&self, name: &str, operation: Operation) -> Result<Vec<EngineStep>> {
        let group = self.registry.resolve(name)?;
        Ok(plan_steps(group, operation))
    }

    /// Build (if required) and start a group
    pub async fn start(&self, name: &str) -> Result<Vec<StepReport>> {
        self.execute(name, Operation::Start).await.into_result()
    }

    /// Tear a group down
    pub async fn stop(&self, name: &str) -> Result<Vec<StepReport>> {
        self.execute(name, Operation::Stop).await.into_result()
    }

    /// Run an operation and fold the result into an outcome
    pub async fn execute(&self, name: &str, operation: Operation) -> LifecycleOutcome {
        let mut reports = Vec::new();
        let result = self.run_operation(name, operation, &mut reports).await;

        match result {
            Ok(()) => {
                tracing::info!("Group {} {} complete", name, operation);
                LifecycleOutcome::new(name, operation, reports, None)
            }
            Err(e) => LifecycleOutcome::new(name, operation, reports, Some(e)),
        }
    }

    async fn run_operation(
        &self,
        name: &str,
        operation: Operation,
        reports: &mut Vec<StepReport>,
    ) -> Result<()> {
        let steps = self.plan(name, operation)?;
        tracing::info!("Group {}: {} ({} steps)", name, operation, steps.len());

        for step in &steps {
            self.run_step(step, reports).await?;
        }

        Ok(())
    }

    async fn run_step(&self, step: &EngineStep, reports: &mut Vec<StepReport>) -> Result<()> {
        tracing::info!("Running {} step for group {}", step.kind, step.group);

        let started_at = Utc::now();
        let timer = Instant::now();
        let result = self.engine.run(step).await;
        let duration_ms = timer.elapsed().as_millis() as u64;

        let (exit_code, failure) = match result {
            Ok(output) if output.success() => (output.exit_code, None),
            Ok(output) => (output.exit_code, Some(output.diagnostics())),
            Err(e) => (None, Some(e.to_string())),
        };

        reports.push(StepReport {
            kind: step.kind,
            args: step.args.clone(),
            exit_code,
            started_at,
            duration_ms,
        });

        match failure {
            None => Ok(()),
            Some(diagnostics) => {
                tracing::warn!(
                    "{} step for group {} failed (exit code {:?})",
                    step.kind,
                    step.group,
                    exit_code
                );
                Err(step_error(step, exit_code, diagnostics))
            }
        }
    }
}

fn plan_steps(group: &ServiceGroup, operation: Operation) -> Vec<EngineStep> {
    match operation {
        Operation::Start => {
            let mut steps = Vec::with_capacity(2);
            if group.build_required {
                steps.push(EngineStep::build(group));
            }
            steps.push(EngineStep::start(group));
            steps
        }
        Operation::Stop => vec![EngineStep::teardown(group)],
    }
}

fn step_error(step: &EngineStep, status: Option<i32>, diagnostics: String) -> GroupError {
    let group = step.group.clone();
    match step.kind {
        StepKind::Build => GroupError::BuildFailed {
            group,
            status,
            diagnostics,
        },
        StepKind::Start => GroupError::StartFailed {
            group,
            status,
            diagnostics,
        },
        StepKind::Teardown => GroupError::TeardownFailed {
            group,
            status,
            diagnostics,
        },
    }
}
