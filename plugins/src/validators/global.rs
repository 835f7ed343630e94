use serde_json::Value;
use unistate_core::api::{
    Severity, StateType, StateValidator, StateValue, ValidationError, ValidationReport,
};

/// Keys flagged when they appear verbatim at the top level.
const SENSITIVE_KEYS: [&str; 5] = ["password", "secret", "key", "token", "credential"];
const LARGE_OBJECT_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalStateValidator;

impl StateValidator for GlobalStateValidator {
    fn name(&self) -> &str {
        "global"
    }

    fn validate(&self, state_type: StateType, value: &StateValue) -> Result<(), ValidationError> {
        self.report(state_type, value).into_result()
    }

    fn report(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let mut report = ValidationReport::new(self.name(), state_type);
        let body = match value {
            StateValue::Global(body) => body,
            other => {
                report.error(
                    Severity::Critical,
                    ValidationError::UnexpectedPayload {
                        expected: StateType::Global,
                        actual: other.kind(),
                    },
                );
                return report;
            }
        };

        match body {
            Value::Null => {
                report.error(Severity::Critical, ValidationError::MissingField("value"));
            }
            Value::Object(map) if map.is_empty() => {
                report.warn("empty_global_state", Severity::Low, None, "global state is empty");
            }
            Value::Object(map) => {
                if map.len() > LARGE_OBJECT_ENTRIES {
                    report.warn(
                        "large_global_state",
                        Severity::Medium,
                        None,
                        format!("{} top-level entries", map.len()),
                    );
                }
                for key in map.keys().filter(|k| SENSITIVE_KEYS.contains(&k.as_str())) {
                    report.warn(
                        "sensitive_global_key",
                        Severity::Medium,
                        Some(key),
                        format!("potentially sensitive key: {key}"),
                    );
                }
            }
            _ => {}
        }
        report
    }
}
