use thiserror::Error;

use crate::state::types::StateType;

/// Errors produced by [`StateValidator`](crate::state::StateValidator) implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("invalid payload: expected {expected} state, got {actual}")]
    UnexpectedPayload {
        expected: StateType,
        actual: StateType,
    },

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("validator {index} ({name}) failed: {source}")]
    Composite {
        index: usize,
        name: String,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::OutOfRange { .. } => "out_of_range",
            Self::InvalidStage(_) => "invalid_stage",
            Self::UnexpectedPayload { .. } => "unexpected_payload",
            Self::InvalidField { .. } => "invalid_field",
            Self::Composite { .. } => "composite",
        }
    }

    /// Field the error is about, when there is one.
    pub fn field(&self) -> Option<String> {
        match self {
            Self::MissingField(field) | Self::OutOfRange { field, .. } => Some(field.to_string()),
            Self::InvalidStage(_) => Some("current_stage".to_string()),
            Self::InvalidField { field, .. } => Some(field.clone()),
            Self::UnexpectedPayload { .. } => None,
            Self::Composite { source, .. } => source.field(),
        }
    }
}
