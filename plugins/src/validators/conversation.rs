use unistate_core::api::{
    ConversationStage, Severity, StateType, StateValidator, StateValue, ValidationError,
    ValidationReport,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationStateValidator;

impl StateValidator for ConversationStateValidator {
    fn name(&self) -> &str {
        "conversation"
    }

    fn validate(&self, state_type: StateType, value: &StateValue) -> Result<(), ValidationError> {
        self.report(state_type, value).into_result()
    }

    fn report(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let mut report = ValidationReport::new(self.name(), state_type);
        let Some(conversation) = value.as_conversation() else {
            report.error(
                Severity::Critical,
                ValidationError::UnexpectedPayload {
                    expected: StateType::Conversation,
                    actual: value.kind(),
                },
            );
            return report;
        };

        if conversation.session_id.trim().is_empty() {
            report.error(Severity::Critical, ValidationError::MissingField("session_id"));
        }
        if conversation.conversation_id.trim().is_empty() {
            report.error(Severity::Critical, ValidationError::MissingField("conversation_id"));
        }
        // An empty stage means the conversation has not started yet.
        let stage = conversation.current_stage.as_str();
        if !stage.is_empty() && ConversationStage::parse(stage).is_none() {
            report.error(Severity::High, ValidationError::InvalidStage(stage.to_string()));
        }

        if conversation.updated_at < conversation.created_at {
            report.warn(
                "updated_before_created",
                Severity::Low,
                Some("updated_at"),
                "updated_at precedes created_at",
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unistate_core::api::ConversationState;

    fn check(c: ConversationState) -> Result<(), ValidationError> {
        ConversationStateValidator.validate(StateType::Conversation, &StateValue::Conversation(c))
    }

    #[test]
    fn test_stage_must_be_known() {
        assert!(check(ConversationState::new("s", "c")).is_ok());
        assert!(check(ConversationState::new("s", "c").with_stage("monitoring")).is_ok());
        assert_eq!(
            check(ConversationState::new("s", "c").with_stage("shipping")),
            Err(ValidationError::InvalidStage("shipping".into()))
        );
    }

    #[test]
    fn test_ids_required() {
        assert_eq!(
            check(ConversationState::new("s", "")),
            Err(ValidationError::MissingField("conversation_id"))
        );
    }

    #[test]
    fn test_report_lists_all_errors() {
        let report = ConversationStateValidator.report(
            StateType::Conversation,
            &StateValue::Conversation(ConversationState::new("", "").with_stage("shipping")),
        );
        let codes: Vec<_> = report.errors.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["missing_field", "missing_field", "invalid_stage"]);
        assert_eq!(report.score(), 20);
    }
}
