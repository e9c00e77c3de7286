//! Bibliographic record model
//!
//! The record is the JSON document carried on the queues and inside the job
//! config. Parsing and encoding of exchange formats is out of scope; this
//! module only models the structure and the two equality relations the
//! pipeline needs:
//!
//! - **structural equality** (`structurally_eq`): field tags, indicators and
//!   subfield codes in the same order and cardinality, text values ignored
//! - **full equality**: the derived `PartialEq`, everything compared

use serde::{Deserialize, Serialize};

fn default_indicator() -> char {
    ' '
}

/// One subfield of a data field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    pub code: char,
    pub value: String,
}

impl Subfield {
    pub fn new(code: char, value: impl Into<String>) -> Self {
        Self {
            code,
            value: value.into(),
        }
    }
}

/// Control field: a tag with a single value, no indicators or subfields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlField {
    pub tag: String,
    pub value: String,
}

impl ControlField {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// Data field with two indicators and ordered subfields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataField {
    pub tag: String,
    #[serde(default = "default_indicator")]
    pub ind1: char,
    #[serde(default = "default_indicator")]
    pub ind2: char,
    #[serde(default)]
    pub subfields: Vec<Subfield>,
}

impl DataField {
    pub fn new(tag: impl Into<String>, subfields: Vec<Subfield>) -> Self {
        Self {
            tag: tag.into(),
            ind1: ' ',
            ind2: ' ',
            subfields,
        }
    }

    /// First value of the given subfield code, if present
    pub fn subfield_value(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.value.as_str())
    }
}

/// A bibliographic record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub leader: String,
    #[serde(default)]
    pub control_fields: Vec<ControlField>,
    #[serde(default)]
    pub fields: Vec<DataField>,
}

impl Record {
    /// Whether the record has at least one field (control or data) with the tag
    pub fn has_field(&self, tag: &str) -> bool {
        self.control_fields.iter().any(|f| f.tag == tag)
            || self.fields.iter().any(|f| f.tag == tag)
    }

    /// All data fields with the given tag, in record order
    pub fn fields_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DataField> {
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    /// All subfield values for a tag/code pair, in record order
    pub fn subfield_values<'a>(&'a self, tag: &'a str, code: char) -> impl Iterator<Item = &'a str> {
        self.fields_with_tag(tag)
            .flat_map(move |f| f.subfields.iter().filter(move |s| s.code == code))
            .map(|s| s.value.as_str())
    }

    /// Structural equality: same field tags, indicators and subfield codes in
    /// the same order and cardinality. Subfield values, control field values
    /// and the leader do not participate.
    pub fn structurally_eq(&self, other: &Record) -> bool {
        if self.control_fields.len() != other.control_fields.len()
            || self.fields.len() != other.fields.len()
        {
            return false;
        }

        let control_tags_match = self
            .control_fields
            .iter()
            .zip(&other.control_fields)
            .all(|(a, b)| a.tag == b.tag);
        if !control_tags_match {
            return false;
        }

        self.fields.iter().zip(&other.fields).all(|(a, b)| {
            a.tag == b.tag
                && a.ind1 == b.ind1
                && a.ind2 == b.ind2
                && a.subfields.len() == b.subfields.len()
                && a.subfields
                    .iter()
                    .zip(&b.subfields)
                    .all(|(x, y)| x.code == y.code)
        })
    }
}
