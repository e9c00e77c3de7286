//! Link data merging
//!
//! Several filters may independently request edits against the same target
//! record; whether two entries describe the same record is decided by the
//! record's structural skeleton, since subfield text plays no role in the
//! field layout. [`merge_link_data`] collapses such entries into one edit
//! set per distinct skeleton and drops exact-duplicate edits.

use std::collections::VecDeque;

use reclink_common::types::{dedupe_edits, Edit, LinkData};

/// Collapse link data entries whose records are structurally equal
///
/// Single pass over the input: each head consumes every structural mate
/// remaining after it, so grouping never reaches back into already-emitted
/// output. The merged change set carries the mates' edits first, then the
/// head's, with full-equal duplicates removed in first-occurrence order.
/// Entries without a mate pass through unchanged.
pub fn merge_link_data(candidates: Vec<LinkData>) -> Vec<LinkData> {
    let mut remaining: VecDeque<LinkData> = candidates.into();
    let mut output = Vec::new();

    while let Some(head) = remaining.pop_front() {
        let (matches, others): (Vec<LinkData>, Vec<LinkData>) = remaining
            .into_iter()
            .partition(|candidate| candidate.record.structurally_eq(&head.record));
        remaining = others.into();

        if matches.is_empty() {
            output.push(head);
            continue;
        }

        let mut changes: Vec<Edit> = matches
            .into_iter()
            .flat_map(|candidate| candidate.changes)
            .collect();
        changes.extend(head.changes);

        output.push(LinkData {
            source_record: head.source_record,
            changes: dedupe_edits(changes),
            record: head.record,
        });
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclink_common::record::{DataField, Record, Subfield};

    /// Record whose skeleton is determined by the subfield codes of one field
    fn record(tag: &str, codes: &[char]) -> Record {
        Record {
            leader: String::new(),
            control_fields: vec![],
            fields: vec![DataField::new(
                tag,
                codes.iter().map(|c| Subfield::new(*c, "value")).collect(),
            )],
        }
    }

    fn replace(value: &str) -> Edit {
        Edit::ReplaceSubfield {
            tag: "100".to_string(),
            code: '0',
            value: value.to_string(),
        }
    }

    fn link(record: Record, changes: Vec<Edit>) -> LinkData {
        LinkData {
            source_record: Record::default(),
            changes,
            record,
        }
    }

    #[test]
    fn test_distinct_skeletons_pass_through_in_order() {
        let input = vec![
            link(record("100", &['a']), vec![replace("one")]),
            link(record("245", &['a']), vec![replace("two")]),
            link(record("700", &['a', 't']), vec![replace("three")]),
        ];

        let output = merge_link_data(input.clone());
        assert_eq!(output, input);
    }

    #[test]
    fn test_structural_mates_collapse_into_one_entry() {
        let input = vec![
            link(record("100", &['a']), vec![replace("one")]),
            link(record("100", &['a']), vec![replace("two")]),
        ];

        let output = merge_link_data(input);
        assert_eq!(output.len(), 1);
        // Mates' changes come first, then the head's
        assert_eq!(output[0].changes, vec![replace("two"), replace("one")]);
    }

    #[test]
    fn test_shared_edit_appears_exactly_once() {
        let shared = replace("shared");
        let input = vec![
            link(record("100", &['a']), vec![shared.clone(), replace("one")]),
            link(record("100", &['a']), vec![shared.clone(), replace("two")]),
        ];

        let output = merge_link_data(input);
        assert_eq!(output.len(), 1);
        assert_eq!(
            output[0].changes,
            vec![shared, replace("two"), replace("one")]
        );
    }

    #[test]
    fn test_merge_in_place_among_unrelated_entries() {
        // Five entries; the third and fourth share a skeleton and carry
        // disjoint two-edit sets
        let input = vec![
            link(record("100", &['a']), vec![replace("a")]),
            link(record("245", &['a']), vec![replace("b")]),
            link(record("700", &['a']), vec![replace("c1"), replace("c2")]),
            link(record("700", &['a']), vec![replace("d1"), replace("d2")]),
            link(record("800", &['a']), vec![replace("e")]),
        ];

        let output = merge_link_data(input.clone());
        assert_eq!(output.len(), 4);
        assert_eq!(output[0], input[0]);
        assert_eq!(output[1], input[1]);
        assert_eq!(output[3], input[4]);

        // The merged entry stands where the first mate stood
        assert!(output[2].record.structurally_eq(&input[2].record));
        assert_eq!(
            output[2].changes,
            vec![replace("d1"), replace("d2"), replace("c1"), replace("c2")]
        );
    }

    #[test]
    fn test_chains_collapse_for_any_length() {
        let input: Vec<LinkData> = (0..5)
            .map(|n| link(record("100", &['a']), vec![replace(&format!("e{n}"))]))
            .collect();

        let output = merge_link_data(input);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].changes.len(), 5);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = vec![
            link(record("100", &['a']), vec![replace("one")]),
            link(record("100", &['a']), vec![replace("two")]),
            link(record("245", &['a']), vec![replace("three")]),
        ];

        let once = merge_link_data(input);
        let twice = merge_link_data(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(merge_link_data(vec![]).is_empty());
    }
}
