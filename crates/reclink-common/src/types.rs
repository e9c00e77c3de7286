//! Job lifecycle and link data types
//!
//! A job moves through the states in [`JobState`]; its immutable
//! [`JobConfig`] carries the source record, the ordered filter
//! specifications and the import profile. Filters produce [`LinkData`]
//! entries, which the merge step collapses per distinct record skeleton.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LinkError;
use crate::record::{DataField, Record};

/// Job lifecycle states handled by the worker
///
/// `PendingExternal` and `Done` are terminal here: the downstream import
/// service owns the final `PendingExternal` -> `Done` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    PendingValidation,
    ProcessingValidation,
    PendingImport,
    ProcessingImport,
    PendingExternal,
    Done,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::PendingValidation => "pending_validation",
            JobState::ProcessingValidation => "processing_validation",
            JobState::PendingImport => "pending_import",
            JobState::ProcessingImport => "processing_import",
            JobState::PendingExternal => "pending_external",
            JobState::Done => "done",
        }
    }

    /// States the scheduler never dispatches
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::PendingExternal | JobState::Done)
    }
}

impl std::str::FromStr for JobState {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_validation" => Ok(JobState::PendingValidation),
            "processing_validation" => Ok(JobState::ProcessingValidation),
            "pending_import" => Ok(JobState::PendingImport),
            "processing_import" => Ok(JobState::ProcessingImport),
            "pending_external" => Ok(JobState::PendingExternal),
            "done" => Ok(JobState::Done),
            other => Err(LinkError::UnknownJobState(other.to_string())),
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A linkage job as stored in the document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: Uuid,
    pub state: JobState,
    pub config: JobConfig,
    /// Identifiers returned by the batch-import service, append-only
    #[serde(default)]
    pub import_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a fresh job document with no import identifiers yet
    pub fn new(job_id: Uuid, state: JobState, config: JobConfig) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            state,
            config,
            import_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Immutable configuration of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub source_record: Record,
    /// Ordered filter specifications; order is preserved through compilation
    pub filters: Vec<FilterSpec>,
    pub import_profile_id: String,
}

/// One declarative validation filter
///
/// `selector` chooses which candidate records the filter applies to,
/// `rule` decides whether a selected record is valid, and `changes` are the
/// edits requested for every record that passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub selector: Selector,
    pub changes: Vec<Edit>,
    pub rule: ValidatorRule,
}

/// Condition choosing which candidate records a filter applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selector {
    /// Every record matches
    Any,
    /// Records carrying at least one field with the tag
    FieldPresent { tag: String },
    /// Records with a subfield equal to a literal value
    SubfieldEquals { tag: String, code: char, value: String },
    /// Records sharing a subfield value with the source record
    SharesSubfieldWithSource { tag: String, code: char },
}

/// Validation rule reference, resolved to a runnable validator at
/// filter-compilation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidatorRule {
    /// At least one field with the tag exists
    FieldPresent { tag: String },
    /// No field with the tag exists
    FieldAbsent { tag: String },
    /// Some subfield value matches the anchored regular expression
    SubfieldPattern { tag: String, code: char, pattern: String },
}

/// Options forwarded to a validator run
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValidateOptions {
    pub fix: bool,
    pub validate_fixes: bool,
}

/// An atomic requested change to a target record
///
/// Edits are forwarded to the import service, never applied here. Full
/// value equality is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddField { field: DataField },
    RemoveField { tag: String },
    ReplaceSubfield { tag: String, code: char, value: String },
}

/// One edit set against one target record
///
/// Produced per filter pass during validation; after merging, the unit
/// persisted to the import queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkData {
    pub source_record: Record,
    pub changes: Vec<Edit>,
    pub record: Record,
}

/// Drop full-equal duplicate edits, keeping first-occurrence order
pub fn dedupe_edits(edits: Vec<Edit>) -> Vec<Edit> {
    let mut out: Vec<Edit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if !out.contains(&edit) {
            out.push(edit);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Subfield;

    #[test]
    fn test_job_state_str_round_trip() {
        let states = [
            JobState::PendingValidation,
            JobState::ProcessingValidation,
            JobState::PendingImport,
            JobState::ProcessingImport,
            JobState::PendingExternal,
            JobState::Done,
        ];
        for state in states {
            assert_eq!(state.as_str().parse::<JobState>().unwrap(), state);
        }
        assert!("harvesting".parse::<JobState>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Done.is_terminal());
        assert!(JobState::PendingExternal.is_terminal());
        assert!(!JobState::PendingImport.is_terminal());
    }

    #[test]
    fn test_dedupe_edits_keeps_first_occurrence() {
        let add = Edit::AddField {
            field: DataField::new("856", vec![Subfield::new('u', "https://example.org")]),
        };
        let remove = Edit::RemoveField { tag: "035".to_string() };

        let deduped = dedupe_edits(vec![add.clone(), remove.clone(), add.clone()]);
        assert_eq!(deduped, vec![add, remove]);
    }

    #[test]
    fn test_filter_spec_json_shape() {
        let json = serde_json::json!({
            "selector": {"type": "shares_subfield_with_source", "tag": "100", "code": "a"},
            "changes": [
                {"op": "replace_subfield", "tag": "100", "code": "0", "value": "(FIN11)1234"}
            ],
            "rule": {"rule": "subfield_pattern", "tag": "100", "code": "a", "pattern": ".+"}
        });

        let spec: FilterSpec = serde_json::from_value(json).unwrap();
        assert_eq!(
            spec.selector,
            Selector::SharesSubfieldWithSource { tag: "100".to_string(), code: 'a' }
        );
        assert_eq!(spec.changes.len(), 1);
    }
}
