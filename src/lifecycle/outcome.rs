//! Lifecycle operation results

use crate::engine::StepKind;
use crate::error::GroupError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Build (optionally) and start a group
    Start,
    /// Tear a group down
    Stop,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Start => write!(f, "start"),
            Operation::Stop => write!(f, "stop"),
        }
    }
}

/// Record of one engine invocation
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Step kind
    pub kind: StepKind,
    /// Compose arguments issued
    pub args: Vec<String>,
    /// Engine exit code, if the engine ran and exited normally
    pub exit_code: Option<i32>,
    /// When the step was issued
    pub started_at: DateTime<Utc>,
    /// Wall time spent in the engine
    pub duration_ms: u64,
}

/// Aggregated result of a start or stop invocation
#[derive(Debug, Serialize)]
pub struct LifecycleOutcome {
    /// Group name as requested
    pub group: String,
    /// Operation performed
    pub operation: Operation,
    /// Whether every step succeeded
    pub succeeded: bool,
    /// Error text of the failure, if any
    pub error_detail: Option<String>,
    /// Steps issued, in order
    pub steps: Vec<StepReport>,
    #[serde(skip)]
    error: Option<GroupError>,
}

impl LifecycleOutcome {
    pub(crate) fn new(
        group: &str,
        operation: Operation,
        steps: Vec<StepReport>,
        error: Option<GroupError>,
    ) -> Self {
        Self {
            group: group.to_string(),
            operation,
            succeeded: error.is_none(),
            error_detail: error.as_ref().map(|e| e.to_string()),
            steps,
            error,
        }
    }

    /// The error that ended the operation
    pub fn error(&self) -> Option<&GroupError> {
        self.error.as_ref()
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        self.error.as_ref().map_or(0, GroupError::exit_code)
    }

    /// Convert into a `Result`, keeping the step reports on success
    pub fn into_result(self) -> Result<Vec<StepReport>, GroupError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.steps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(kind: StepKind, exit_code: Option<i32>) -> StepReport {
        StepReport {
            kind,
            args: vec!["down".to_string(), "server".to_string()],
            exit_code,
            started_at: Utc::now(),
            duration_ms: 5,
        }
    }

    #[test]
    fn test_successful_outcome() {
        let outcome = LifecycleOutcome::new(
            "server",
            Operation::Stop,
            vec![report(StepKind::Teardown, Some(0))],
            None,
        );
        assert!(outcome.succeeded);
        assert!(outcome.error_detail.is_none());
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(outcome.into_result().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_outcome_serializes_detail() {
        let err = GroupError::StartFailed {
            group: "server".to_string(),
            status: Some(1),
            diagnostics: "no such service: server".to_string(),
        };
        let outcome = LifecycleOutcome::new(
            "server",
            Operation::Start,
            vec![report(StepKind::Build, Some(0)), report(StepKind::Start, Some(1))],
            Some(err),
        );
        assert!(!outcome.succeeded);
        assert_eq!(outcome.exit_code(), 1);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["group"], "server");
        assert_eq!(json["operation"], "start");
        assert_eq!(json["succeeded"], false);
        assert_eq!(json["steps"][1]["kind"], "start");
        assert!(json["error_detail"]
            .as_str()
            .unwrap()
            .contains("no such service: server"));
        assert!(json.get("error").is_none());
    }
}
