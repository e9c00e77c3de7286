//! Record selection
//!
//! Applies a filter's selector to a batch of candidate records. Selection
//! is per filter: the same record may be selected by several filters and
//! contribute one link data entry per filter that accepts it.

use std::collections::HashSet;

use reclink_common::record::Record;
use reclink_common::types::Selector;

/// The subset of `records` a filter applies to, in batch order
pub fn select(source: &Record, records: &[Record], selector: &Selector) -> Vec<Record> {
    match selector {
        Selector::Any => records.to_vec(),
        Selector::FieldPresent { tag } => records
            .iter()
            .filter(|record| record.has_field(tag))
            .cloned()
            .collect(),
        Selector::SubfieldEquals { tag, code, value } => records
            .iter()
            .filter(|record| record.subfield_values(tag, *code).any(|v| v == value))
            .cloned()
            .collect(),
        Selector::SharesSubfieldWithSource { tag, code } => {
            let source_values: HashSet<&str> = source.subfield_values(tag, *code).collect();
            records
                .iter()
                .filter(|record| {
                    record
                        .subfield_values(tag, *code)
                        .any(|v| source_values.contains(v))
                })
                .cloned()
                .collect()
        },
    }
}
