use unistate_core::api::{
    Severity, StateType, StateValidator, StateValue, ValidationConfig, ValidationError,
    ValidationReport,
};

/// Checks identity, creation time and disk usage of session payloads.
#[derive(Debug, Clone, Default)]
pub struct SessionStateValidator {
    /// Fallback limit when a session carries none; 0 disables it.
    max_disk_usage_bytes: i64,
}

impl SessionStateValidator {
    pub fn new(max_disk_usage_bytes: i64) -> Self {
        Self { max_disk_usage_bytes }
    }

    pub fn from_config(cfg: &ValidationConfig) -> Self {
        Self::new(cfg.max_disk_usage_bytes)
    }
}

impl StateValidator for SessionStateValidator {
    fn name(&self) -> &str {
        "session"
    }

    fn validate(&self, state_type: StateType, value: &StateValue) -> Result<(), ValidationError> {
        self.report(state_type, value).into_result()
    }

    fn report(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let mut report = ValidationReport::new(self.name(), state_type);
        let Some(session) = value.as_session() else {
            report.error(
                Severity::Critical,
                ValidationError::UnexpectedPayload {
                    expected: StateType::Session,
                    actual: value.kind(),
                },
            );
            return report;
        };

        if session.session_id.trim().is_empty() {
            report.error(Severity::Critical, ValidationError::MissingField("session_id"));
        }
        if !session.has_creation_time() {
            report.error(Severity::High, ValidationError::MissingField("created_at"));
        }
        if session.disk_usage < 0 {
            report.error(
                Severity::High,
                ValidationError::invalid_field("disk_usage", "must not be negative"),
            );
        }

        let limit = if session.max_disk_usage > 0 {
            session.max_disk_usage
        } else {
            self.max_disk_usage_bytes
        };
        if limit > 0 && session.disk_usage > limit {
            report.error(
                Severity::High,
                ValidationError::invalid_field(
                    "disk_usage",
                    format!("{} bytes exceeds limit of {} bytes", session.disk_usage, limit),
                ),
            );
        } else if limit > 0 && session.disk_usage as f64 > limit as f64 * 0.9 {
            report.warn(
                "disk_usage_near_limit",
                Severity::Medium,
                Some("disk_usage"),
                format!("{} of {} bytes used", session.disk_usage, limit),
            );
        }

        if session.is_expired() {
            report.warn("session_expired", Severity::Medium, Some("expires_at"), "session has expired");
        }
        report
    }
}
