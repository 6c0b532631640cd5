//! Column projection: which keys are exported, in what order, under which labels.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::Record;

/// A caller-supplied column: the record key to read and the label to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    pub header: String,
}

/// The resolved, ordered column set used for row-to-cell extraction.
pub type Projection = Vec<ColumnDescriptor>;

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
        }
    }

    /// A column whose header is its own key.
    pub fn verbatim(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            header: key.clone(),
            key,
        }
    }
}

/// Parses `key` or `key:Header`.
impl FromStr for ColumnDescriptor {
    type Err = ColumnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, header) = match s.split_once(':') {
            Some((key, header)) => (key.trim(), header.trim()),
            None => (s.trim(), s.trim()),
        };
        if key.is_empty() {
            return Err(ColumnParseError {
                input: s.to_string(),
            });
        }
        let header = if header.is_empty() { key } else { header };
        Ok(Self::new(key, header))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid column `{input}`: expected `key` or `key:Header`")]
pub struct ColumnParseError {
    pub input: String,
}

/// Resolve the projection for a dataset.
///
/// Non-empty caller columns win unchanged. Otherwise the first record's keys
/// are used, in order, as both key and header. An empty dataset with no
/// columns yields an empty projection.
pub fn resolve(records: &[Record], columns: Option<&[ColumnDescriptor]>) -> Projection {
    match columns {
        Some(columns) if !columns.is_empty() => columns.to_vec(),
        _ => records
            .first()
            .map(|first| first.keys().map(ColumnDescriptor::verbatim).collect())
            .unwrap_or_default(),
    }
}
