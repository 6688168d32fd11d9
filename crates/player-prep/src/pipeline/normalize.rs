// Column pruning and z-score normalization.

use crate::error::{DataQualityWarning, Result, Warnings};
use crate::table;
use polars::prelude::*;
use tracing::debug;

/// Identifier, media and superseded raw columns removed before
/// normalization. Goalkeeping ratings go too since goalkeepers are split
/// off before the pipeline runs.
pub const DROPPED_COLUMNS: &[&str] = &[
    "Unnamed: 0",
    "ID",
    "Name",
    "Photo",
    "Flag",
    "Club Logo",
    "Jersey Number",
    "Body Type",
    "Club",
    "Nationality",
    "Position",
    "Value",
    "Work Rate",
    "Loaned From",
    "GKDiving",
    "GKHandling",
    "GKKicking",
    "GKPositioning",
    "GKReflexes",
];

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Mean and standard deviation of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    pub stdev: f64,
}

impl ColumnStats {
    /// Mean and population standard deviation (`ddof = 0`) over the
    /// non-null values. An all-null column yields zeros.
    pub fn of(values: &Float64Chunked) -> Self {
        ColumnStats {
            mean: values.mean().unwrap_or(0.0),
            stdev: values.std(0).unwrap_or(0.0),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.stdev < STDEV_EPSILON
    }
}

/// `(value - mean) / stdev`. With zero variance the result is undefined and
/// `None` is returned.
pub fn compute_zscore(value: f64, stats: &ColumnStats) -> Option<f64> {
    if stats.is_degenerate() {
        return None;
    }
    Some((value - stats.mean) / stats.stdev)
}

/// Remove the fixed set of non-feature columns. Names that are not present
/// are ignored.
pub fn prune_columns(df: &mut DataFrame) -> Result<Vec<String>> {
    let dropped = table::drop_columns(df, DROPPED_COLUMNS)?;
    debug!("pruned {} column(s): {:?}", dropped.len(), dropped);
    Ok(dropped)
}

/// Replace every value in every column with its z-score. Missing values stay
/// missing and are excluded from the statistics. A zero-variance column
/// becomes all-null.
pub fn normalize(df: &mut DataFrame, warnings: &mut Warnings) -> Result<()> {
    for name in table::column_names(df) {
        let values: Float64Chunked = table::float_values(df, &name)?.into_iter().collect();
        let stats = ColumnStats::of(&values);
        if stats.is_degenerate() {
            warnings.push(DataQualityWarning::ZeroVariance {
                column: name.clone(),
            });
        }

        let scores: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.and_then(|v| compute_zscore(v, &stats)))
            .collect();
        table::set_column(df, Series::new(name.as_str().into(), scores))?;
    }
    Ok(())
}
