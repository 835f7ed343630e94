use std::sync::Arc;

use serde_json::Value;
use unistate_core::api::{
    Severity, StateType, StateValidator, StateValue, ValidationError, ValidationReport,
};

/// Check for one field; receives `None` when the field is absent.
pub type FieldCheck = Arc<dyn Fn(Option<&Value>) -> Result<(), String> + Send + Sync>;

/// Tool payloads must be JSON objects; registered fields are checked in order.
#[derive(Clone, Default)]
pub struct ToolStateValidator {
    fields: Vec<(String, FieldCheck)>,
}

impl ToolStateValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field<F>(mut self, field: impl Into<String>, check: F) -> Self
    where
        F: Fn(Option<&Value>) -> Result<(), String> + Send + Sync + 'static,
    {
        self.fields.push((field.into(), Arc::new(check)));
        self
    }
}

const ID_FIELDS: [&str; 3] = ["id", "tool_id", "session_id"];
const TIME_FIELDS: [&str; 3] = ["created_at", "updated_at", "timestamp"];

impl StateValidator for ToolStateValidator {
    fn name(&self) -> &str {
        "tool"
    }

    fn validate(&self, state_type: StateType, value: &StateValue) -> Result<(), ValidationError> {
        self.report(state_type, value).into_result()
    }

    fn report(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let mut report = ValidationReport::new(self.name(), state_type);
        let StateValue::Tool(body) = value else {
            report.error(
                Severity::Critical,
                ValidationError::UnexpectedPayload {
                    expected: StateType::Tool,
                    actual: value.kind(),
                },
            );
            return report;
        };
        let Some(object) = body.as_object() else {
            report.error(
                Severity::High,
                ValidationError::invalid_field("value", "tool state must be a JSON object"),
            );
            return report;
        };

        for (field, check) in &self.fields {
            if let Err(reason) = check(object.get(field)) {
                report.error(Severity::High, ValidationError::invalid_field(field.clone(), reason));
            }
        }

        if object.is_empty() {
            report.warn("empty_tool_state", Severity::Low, None, "tool state has no fields");
            return report;
        }
        match ID_FIELDS.iter().find_map(|f| object.get(*f).map(|v| (*f, v))) {
            None => {
                report.warn(
                    "no_tool_identifier",
                    Severity::Medium,
                    None,
                    "tool state lacks id, tool_id or session_id",
                );
            }
            Some((field, Value::String(s))) if s.is_empty() => {
                report.warn("empty_tool_identifier", Severity::Medium, Some(field), "identifier is empty");
            }
            Some(_) => {}
        }
        if !TIME_FIELDS.iter().any(|f| object.contains_key(*f)) {
            report.warn("no_tool_timestamp", Severity::Low, None, "tool state lacks a timestamp");
        }
        report
    }
}
