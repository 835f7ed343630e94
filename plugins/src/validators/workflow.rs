use chrono::{Duration, Utc};
use unistate_core::api::{
    Severity, StateType, StateValidator, StateValue, ValidationError, ValidationReport,
    WorkflowStatus,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowStateValidator;

/// Workflows idle this long while running are flagged.
const STALE_AFTER_HOURS: i64 = 4;

impl StateValidator for WorkflowStateValidator {
    fn name(&self) -> &str {
        "workflow"
    }

    fn validate(&self, state_type: StateType, value: &StateValue) -> Result<(), ValidationError> {
        self.report(state_type, value).into_result()
    }

    fn report(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let mut report = ValidationReport::new(self.name(), state_type);
        let Some(workflow) = value.as_workflow() else {
            report.error(
                Severity::Critical,
                ValidationError::UnexpectedPayload {
                    expected: StateType::Workflow,
                    actual: value.kind(),
                },
            );
            return report;
        };

        if workflow.session_id.trim().is_empty() {
            report.error(Severity::Critical, ValidationError::MissingField("session_id"));
        }
        if workflow.current_stage.trim().is_empty() {
            report.error(Severity::High, ValidationError::MissingField("current_stage"));
        }
        if !(0.0..=100.0).contains(&workflow.progress) {
            report.error(
                Severity::High,
                ValidationError::OutOfRange {
                    field: "progress",
                    value: workflow.progress,
                    min: 0.0,
                    max: 100.0,
                },
            );
        }

        if workflow.status == WorkflowStatus::Completed && workflow.progress < 100.0 {
            report.warn(
                "inconsistent_completion",
                Severity::Medium,
                Some("status"),
                format!("completed with progress {}", workflow.progress),
            );
        }
        let idle = Utc::now() - workflow.updated_at;
        if workflow.status == WorkflowStatus::Running && idle > Duration::hours(STALE_AFTER_HOURS) {
            report.warn(
                "stale_running_workflow",
                Severity::Medium,
                Some("updated_at"),
                format!("running without updates for {}m", idle.num_minutes()),
            );
        }
        report
    }
}
