//! Validated, read-only ratings table handed to the analysis engine.

use std::collections::BTreeSet;

use audience_core::error::{AnalysisError, Result};
use audience_core::models::ViewershipRecord;

/// Columns every complete ratings table carries.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "timestamp",
    "program_id",
    "rating",
    "age_band",
    "gender",
    "weekday",
];

/// An immutable table of viewership records plus the set of columns the
/// producing source actually supplied.
///
/// Records are kept in load order; that order fixes the reduction order
/// inside every group and therefore the exact bits of each mean.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingTable {
    columns: BTreeSet<String>,
    records: Vec<ViewershipRecord>,
}

impl RatingTable {
    /// Build a table that carries every required column.
    pub fn from_records(records: Vec<ViewershipRecord>) -> Result<Self> {
        Self::with_columns(REQUIRED_COLUMNS.iter().copied(), records)
    }

    /// Build a table from an explicit column list.
    ///
    /// Column presence is checked later by the engine; the record values are
    /// checked here. A negative or non-finite rating, or a weekday outside
    /// 0–6, is a schema violation.
    pub fn with_columns<I, S>(columns: I, records: Vec<ViewershipRecord>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for record in &records {
            validate_record(record)?;
        }
        Ok(Self {
            columns: columns.into_iter().map(Into::into).collect(),
            records,
        })
    }

    /// Fail with a schema error naming the first absent column.
    pub fn ensure_columns(&self, required: &[&str]) -> Result<()> {
        match required.iter().find(|c| !self.columns.contains(**c)) {
            Some(missing) => Err(AnalysisError::missing_column(missing)),
            None => Ok(()),
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn records(&self) -> &[ViewershipRecord] {
        &self.records
    }

    /// Records with a positive rating, in table order.
    pub fn observations(&self) -> impl Iterator<Item = &ViewershipRecord> {
        self.records.iter().filter(|r| r.is_observation())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn validate_record(record: &ViewershipRecord) -> Result<()> {
    if !record.rating.is_finite() || record.rating < 0.0 {
        return Err(AnalysisError::invalid_value("rating", record.rating));
    }
    if record.weekday > 6 {
        return Err(AnalysisError::invalid_value("weekday", record.weekday));
    }
    Ok(())
}
