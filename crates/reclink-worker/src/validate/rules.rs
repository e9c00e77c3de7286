//! Validator registry
//!
//! Resolves a declarative [`ValidatorRule`] into a runnable validator, one
//! constructor per rule kind. Construction happens once per job at filter
//! compilation; a malformed rule (e.g. a bad pattern) fails there, before
//! any queue work starts.

use anyhow::Result;
use regex::Regex;

use reclink_common::record::Record;
use reclink_common::types::{ValidateOptions, ValidatorRule};
use reclink_common::LinkError;

/// Outcome of one validator run
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: Option<String>,
}

impl ValidationOutcome {
    fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// A compiled, runnable validation rule
///
/// Validators may fail (the `Result`); such failures are not recovered by
/// the validation stage and abort the job's pass.
pub trait RecordValidator: Send + Sync {
    fn validate(&self, record: &Record, options: &ValidateOptions) -> Result<ValidationOutcome>;
}

/// Build the runnable validator for a declarative rule
pub fn build_validator(
    rule: &ValidatorRule,
) -> std::result::Result<Box<dyn RecordValidator>, LinkError> {
    match rule {
        ValidatorRule::FieldPresent { tag } => Ok(Box::new(FieldPresent { tag: tag.clone() })),
        ValidatorRule::FieldAbsent { tag } => Ok(Box::new(FieldAbsent { tag: tag.clone() })),
        ValidatorRule::SubfieldPattern { tag, code, pattern } => {
            // Patterns match whole subfield values
            let anchored = format!("^(?:{pattern})$");
            let regex = Regex::new(&anchored).map_err(|e| {
                LinkError::InvalidFilter(format!(
                    "invalid pattern {pattern:?} for {tag} ${code}: {e}"
                ))
            })?;
            Ok(Box::new(SubfieldPattern {
                tag: tag.clone(),
                code: *code,
                regex,
            }))
        },
    }
}

struct FieldPresent {
    tag: String,
}

impl RecordValidator for FieldPresent {
    fn validate(&self, record: &Record, _options: &ValidateOptions) -> Result<ValidationOutcome> {
        if record.has_field(&self.tag) {
            Ok(ValidationOutcome::valid())
        } else {
            Ok(ValidationOutcome::invalid(format!(
                "field {} missing",
                self.tag
            )))
        }
    }
}

struct FieldAbsent {
    tag: String,
}

impl RecordValidator for FieldAbsent {
    fn validate(&self, record: &Record, _options: &ValidateOptions) -> Result<ValidationOutcome> {
        if record.has_field(&self.tag) {
            Ok(ValidationOutcome::invalid(format!(
                "field {} present",
                self.tag
            )))
        } else {
            Ok(ValidationOutcome::valid())
        }
    }
}

struct SubfieldPattern {
    tag: String,
    code: char,
    regex: Regex,
}

impl RecordValidator for SubfieldPattern {
    fn validate(&self, record: &Record, _options: &ValidateOptions) -> Result<ValidationOutcome> {
        let matched = record
            .subfield_values(&self.tag, self.code)
            .any(|value| self.regex.is_match(value));

        if matched {
            Ok(ValidationOutcome::valid())
        } else {
            Ok(ValidationOutcome::invalid(format!(
                "no {} ${} value matches pattern",
                self.tag, self.code
            )))
        }
    }
}
