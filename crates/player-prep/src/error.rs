// Error and warning types shared by the table and every pipeline stage.

use std::fmt;

// ---------------------------------------------------------------------------
// Fatal errors
// ---------------------------------------------------------------------------

/// Errors that abort a run. No partial output is written when one of these
/// is returned.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to parse `{value}` in column `{column}` (row {row}): {reason}")]
    Parse {
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    #[error("expected column `{column}` is missing from the table")]
    Schema { column: String },

    #[error("failed to access file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("failed to read or write table {path}: {source}")]
    Frame {
        path: String,
        source: polars::prelude::PolarsError,
    },

    #[error("column `{column}` has {found} values but the table has {expected} rows")]
    Length {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),
}

impl PipelineError {
    pub fn parse(
        column: &str,
        row: usize,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::Parse {
            column: column.to_string(),
            row,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(column: &str) -> Self {
        PipelineError::Schema {
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ---------------------------------------------------------------------------
// Non-fatal data quality warnings
// ---------------------------------------------------------------------------

/// A data problem the pipeline recovers from using a defined fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum DataQualityWarning {
    /// A categorical value had no mapping; the cell was left null.
    UnmappedCategory {
        column: String,
        row: usize,
        value: String,
    },
    /// A loaned player's origin club has no aggregate; the player's own
    /// club average was used instead.
    UnmatchedLoanClub { row: usize, club: String },
    /// A column had zero variance, so its z-scores are undefined (null).
    ZeroVariance { column: String },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::UnmappedCategory { column, row, value } => write!(
                f,
                "unmapped value `{value}` in column `{column}` (row {row}), left null"
            ),
            DataQualityWarning::UnmatchedLoanClub { row, club } => write!(
                f,
                "loan origin club `{club}` (row {row}) not found, using own club average"
            ),
            DataQualityWarning::ZeroVariance { column } => {
                write!(f, "column `{column}` has zero variance, z-scores left undefined")
            }
        }
    }
}

/// Collects warnings, logging each one as it is raised.
#[derive(Debug, Default)]
pub struct Warnings {
    items: Vec<DataQualityWarning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: DataQualityWarning) {
        tracing::warn!("{}", warning);
        self.items.push(warning);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataQualityWarning> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<DataQualityWarning> {
        self.items
    }
}
