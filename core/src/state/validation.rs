use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

use super::traits::StateValidator;
use super::types::StateType;
use super::value::StateValue;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

/// Every finding a validator has about one value.
///
/// Errors make the value invalid; warnings only lower the score.
/// [`ValidationReport::into_result`] is the fail-fast view used on writes:
/// it yields the first error recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub validator: String,
    pub state_type: StateType,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    first_error: Option<ValidationError>,
}

impl ValidationReport {
    pub fn new(validator: impl Into<String>, state_type: StateType) -> Self {
        Self {
            validator: validator.into(),
            state_type,
            errors: Vec::new(),
            warnings: Vec::new(),
            first_error: None,
        }
    }

    pub fn error(&mut self, severity: Severity, error: ValidationError) -> &mut Self {
        self.errors.push(ValidationIssue {
            code: error.code().to_string(),
            severity,
            field: error.field(),
            message: error.to_string(),
        });
        if self.first_error.is_none() {
            self.first_error = Some(error);
        }
        self
    }

    pub fn warn(
        &mut self,
        code: &str,
        severity: Severity,
        field: Option<&str>,
        message: impl Into<String>,
    ) -> &mut Self {
        self.warnings.push(ValidationIssue {
            code: code.to_string(),
            severity,
            field: field.map(str::to_string),
            message: message.into(),
        });
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&ValidationError> {
        self.first_error.as_ref()
    }

    /// 0-100. Errors cost 30/20/10/5 by severity, warnings 10/10/5/2.
    pub fn score(&self) -> u8 {
        let errors: u32 = self
            .errors
            .iter()
            .map(|i| match i.severity {
                Severity::Critical => 30,
                Severity::High => 20,
                Severity::Medium => 10,
                Severity::Low => 5,
            })
            .sum();
        let warnings: u32 = self
            .warnings
            .iter()
            .map(|i| match i.severity {
                Severity::Critical | Severity::High => 10,
                Severity::Medium => 5,
                Severity::Low => 2,
            })
            .sum();
        100u32.saturating_sub(errors + warnings) as u8
    }

    pub fn risk_level(&self) -> RiskLevel {
        let critical = self.errors.iter().any(|i| i.severity == Severity::Critical);
        match self.score() {
            _ if critical => RiskLevel::Critical,
            s if s < 40 => RiskLevel::Critical,
            s if s < 60 => RiskLevel::High,
            s if s < 80 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    /// Appends `other`'s findings; the earliest error stays first.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        if self.first_error.is_none() {
            self.first_error = other.first_error;
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ValidationReport", 7)?;
        s.serialize_field("validator", &self.validator)?;
        s.serialize_field("state_type", &self.state_type)?;
        s.serialize_field("valid", &self.is_valid())?;
        s.serialize_field("score", &self.score())?;
        s.serialize_field("risk_level", &self.risk_level())?;
        s.serialize_field("errors", &self.errors)?;
        s.serialize_field("warnings", &self.warnings)?;
        s.end()
    }
}

/// Runs validators in order and stops at the first violation.
///
/// [`StateValidator::report`] instead runs every validator and merges their
/// findings.
#[derive(Clone, Default)]
pub struct CompositeValidator {
    validators: Vec<Arc<dyn StateValidator>>,
}

impl CompositeValidator {
    pub fn new(validators: Vec<Arc<dyn StateValidator>>) -> Self {
        Self { validators }
    }

    pub fn push(mut self, validator: Arc<dyn StateValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl StateValidator for CompositeValidator {
    fn name(&self) -> &str {
        "composite"
    }

    fn validate(&self, state_type: StateType, value: &StateValue) -> Result<(), ValidationError> {
        for (index, validator) in self.validators.iter().enumerate() {
            validator
                .validate(state_type, value)
                .map_err(|e| ValidationError::Composite {
                    index,
                    name: validator.name().to_string(),
                    source: Box::new(e),
                })?;
        }
        Ok(())
    }

    fn report(&self, state_type: StateType, value: &StateValue) -> ValidationReport {
        let mut report = ValidationReport::new(self.name(), state_type);
        for validator in &self.validators {
            report.merge(validator.report(state_type, value));
        }
        report
    }
}
