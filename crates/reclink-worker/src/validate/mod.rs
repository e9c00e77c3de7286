//! Validation stage
//!
//! Compiles a job's filter chain, pumps candidate records from the job's
//! validation queue through it and hands merged link data to the import
//! queue. The stage ends by routing the job: `pending_import` when link
//! data was produced, `done` when nothing survived.

use anyhow::{Context, Result};
use tracing::{debug, info};

use reclink_common::record::Record;
use reclink_common::types::{Edit, FilterSpec, LinkData, Selector, ValidateOptions};
use reclink_common::{Job, JobState, LinkError};

use crate::merge::merge_link_data;
use crate::queue::{queue_name, QueueDriver, QueuePump};
use crate::store::JobStore;

pub mod rules;
pub mod select;

pub use rules::{build_validator, RecordValidator, ValidationOutcome};
pub use select::select;

/// A filter spec compiled into runnable form
///
/// Stateless after construction; filter `i` corresponds to spec `i`.
pub struct CompiledFilter {
    pub validator: Box<dyn RecordValidator>,
    pub selector: Selector,
    pub changes: Vec<Edit>,
}

/// Compile filter specs, preserving their order
pub fn compile_filters(
    specs: &[FilterSpec],
) -> std::result::Result<Vec<CompiledFilter>, LinkError> {
    specs
        .iter()
        .map(|spec| {
            Ok(CompiledFilter {
                validator: build_validator(&spec.rule)?,
                selector: spec.selector.clone(),
                changes: spec.changes.clone(),
            })
        })
        .collect()
}

/// Run every filter over one batch of records
///
/// Filters run in spec order; each filter selects its own subset of the
/// batch and contributes one link data entry per selected record its
/// validator accepts. A filter whose selection is empty contributes
/// nothing. Validator failures are not caught here.
pub fn collect_candidates(
    source: &Record,
    records: &[Record],
    filters: &[CompiledFilter],
) -> Result<Vec<LinkData>> {
    let options = ValidateOptions::default();
    let mut candidates = Vec::new();

    for filter in filters {
        let selected = select(source, records, &filter.selector);
        if selected.is_empty() {
            continue;
        }
        debug!(selected = selected.len(), "records passed filter selection");

        for record in selected {
            let outcome = filter.validator.validate(&record, &options)?;
            if outcome.valid {
                candidates.push(LinkData {
                    source_record: source.clone(),
                    changes: filter.changes.clone(),
                    record,
                });
            }
        }
    }

    Ok(candidates)
}

/// Run the validation stage for one job
pub async fn run_validation(
    job: &Job,
    store: &dyn JobStore,
    queue: &dyn QueueDriver,
) -> Result<()> {
    let filters =
        compile_filters(&job.config.filters).context("failed to compile validation filters")?;
    let source = &job.config.source_record;

    let input_queue = queue_name(JobState::PendingValidation, job.job_id);
    let import_queue = queue_name(JobState::PendingImport, job.job_id);
    let pump = QueuePump::new(queue, input_queue.clone());

    while let Some(batch) = pump.next_batch().await? {
        let records: Vec<Record> = batch
            .decode()
            .context("failed to decode candidate records")?;
        debug!(
            job_id = %job.job_id,
            records = records.len(),
            "validating candidate record batch"
        );

        let candidates = collect_candidates(source, &records, &filters)?;
        let merged = merge_link_data(candidates);
        debug!(
            job_id = %job.job_id,
            link_data = merged.len(),
            "merged link data for batch"
        );

        for link in &merged {
            let payload = serde_json::to_value(link).context("failed to encode link data")?;
            queue.enqueue(&import_queue, job.job_id, &payload).await?;
        }
        queue.ack(&batch).await?;
    }

    // The pass wrote everything it produced; route the job on what is
    // actually waiting for import.
    let pending = queue.message_count(&import_queue).await?;
    if pending == 0 {
        info!(job_id = %job.job_id, "all records validated, no link data produced");
        store.set_state(job.job_id, JobState::Done).await?;
    } else {
        info!(job_id = %job.job_id, pending, "all records validated, link data queued for import");
        store.set_state(job.job_id, JobState::PendingImport).await?;
    }
    queue.delete_queue(&input_queue).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclink_common::record::{DataField, Subfield};
    use reclink_common::types::{Edit, ValidatorRule};

    fn record_with(tag: &str, code: char, value: &str) -> Record {
        Record {
            fields: vec![DataField::new(tag, vec![Subfield::new(code, value)])],
            ..Record::default()
        }
    }

    fn spec(selector: Selector, rule: ValidatorRule, change_value: &str) -> FilterSpec {
        FilterSpec {
            selector,
            changes: vec![Edit::ReplaceSubfield {
                tag: "100".to_string(),
                code: '0',
                value: change_value.to_string(),
            }],
            rule,
        }
    }

    #[test]
    fn test_compile_preserves_spec_order() {
        let specs = vec![
            spec(
                Selector::FieldPresent { tag: "100".to_string() },
                ValidatorRule::FieldPresent { tag: "100".to_string() },
                "first",
            ),
            spec(
                Selector::Any,
                ValidatorRule::FieldAbsent { tag: "035".to_string() },
                "second",
            ),
        ];

        let compiled = compile_filters(&specs).unwrap();
        assert_eq!(compiled.len(), 2);
        assert_eq!(compiled[0].selector, specs[0].selector);
        assert_eq!(compiled[0].changes, specs[0].changes);
        assert_eq!(compiled[1].selector, specs[1].selector);
        assert_eq!(compiled[1].changes, specs[1].changes);
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        let specs = vec![spec(
            Selector::Any,
            ValidatorRule::SubfieldPattern {
                tag: "024".to_string(),
                code: 'a',
                pattern: "[".to_string(),
            },
            "x",
        )];
        assert!(compile_filters(&specs).is_err());
    }

    #[test]
    fn test_empty_selection_contributes_nothing() {
        let filters = compile_filters(&[spec(
            Selector::FieldPresent { tag: "999".to_string() },
            ValidatorRule::FieldPresent { tag: "100".to_string() },
            "x",
        )])
        .unwrap();

        let records = vec![record_with("100", 'a', "one"), record_with("100", 'a', "two")];
        let candidates = collect_candidates(&Record::default(), &records, &filters).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_record_yields_one_candidate_per_accepting_filter() {
        let filters = compile_filters(&[
            spec(
                Selector::FieldPresent { tag: "100".to_string() },
                ValidatorRule::FieldPresent { tag: "100".to_string() },
                "from-first",
            ),
            spec(
                Selector::Any,
                ValidatorRule::FieldAbsent { tag: "035".to_string() },
                "from-second",
            ),
        ])
        .unwrap();

        let records = vec![record_with("100", 'a', "only one")];
        let candidates = collect_candidates(&Record::default(), &records, &filters).unwrap();

        // Both filters matched the same physical record
        assert_eq!(candidates.len(), 2);
        assert_eq!(
            candidates[0].changes,
            vec![Edit::ReplaceSubfield {
                tag: "100".to_string(),
                code: '0',
                value: "from-first".to_string(),
            }]
        );
        assert_eq!(
            candidates[1].changes,
            vec![Edit::ReplaceSubfield {
                tag: "100".to_string(),
                code: '0',
                value: "from-second".to_string(),
            }]
        );
    }

    #[test]
    fn test_rejected_records_are_dropped() {
        let filters = compile_filters(&[spec(
            Selector::Any,
            ValidatorRule::SubfieldPattern {
                tag: "100".to_string(),
                code: 'a',
                pattern: "keep.*".to_string(),
            },
            "x",
        )])
        .unwrap();

        let records = vec![
            record_with("100", 'a', "keep me"),
            record_with("100", 'a', "drop me"),
            record_with("100", 'a', "keep me too"),
        ];
        let candidates = collect_candidates(&Record::default(), &records, &filters).unwrap();
        assert_eq!(candidates.len(), 2);
    }
}
