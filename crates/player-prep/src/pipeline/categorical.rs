// Categorical encoders: binary flags, work-rate levels and one-hot columns.

use crate::error::{DataQualityWarning, PipelineError, Result, Warnings};
use crate::table;
use polars::prelude::*;
use std::collections::BTreeSet;
use tracing::debug;

pub const PREFERRED_FOOT: &str = "Preferred Foot";
pub const REAL_FACE: &str = "Real Face";
pub const WORK_RATE: &str = "Work Rate";
pub const WORK_RATE_ATTACK: &str = "Work Rate Attack";
pub const WORK_RATE_DEFENCE: &str = "Work Rate Defence";
pub const POSITION: &str = "Position";
pub const NATIONALITY: &str = "Nationality";

pub const POSITION_PREFIX: &str = "is_position";
pub const NATIONALITY_PREFIX: &str = "has_nationality";

const FOOT_LEVELS: &[(&str, i64)] = &[("Left", 0), ("Right", 1)];
const FACE_LEVELS: &[(&str, i64)] = &[("No", 0), ("Yes", 1)];
const WORK_RATE_LEVELS: &[(&str, i64)] = &[("Low", 0), ("Medium", 1), ("High", 2)];

fn lookup(levels: &[(&str, i64)], value: &str) -> Option<i64> {
    levels
        .iter()
        .find(|(label, _)| *label == value)
        .map(|(_, code)| *code)
}

/// Replace a categorical column with integer codes. Values with no code
/// become null and raise a warning.
fn encode_levels(
    df: &mut DataFrame,
    column: &str,
    levels: &[(&str, i64)],
    warnings: &mut Warnings,
) -> Result<()> {
    let codes: Vec<Option<i64>> = table::text_values(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let code = value.as_deref().and_then(|s| lookup(levels, s.trim()));
            if code.is_none() {
                warnings.push(DataQualityWarning::UnmappedCategory {
                    column: column.to_string(),
                    row,
                    value: value.unwrap_or_else(|| "nan".into()),
                });
            }
            code
        })
        .collect();
    table::set_column(df, Series::new(column.into(), codes))
}

/// `Left` → 0, `Right` → 1.
pub fn process_preferred_foot(df: &mut DataFrame, warnings: &mut Warnings) -> Result<()> {
    encode_levels(df, PREFERRED_FOOT, FOOT_LEVELS, warnings)
}

/// `No` → 0, `Yes` → 1.
pub fn process_real_face(df: &mut DataFrame, warnings: &mut Warnings) -> Result<()> {
    encode_levels(df, REAL_FACE, FACE_LEVELS, warnings)
}

/// Split a work rate such as `Medium/ High` into its attack and defence
/// halves.
pub fn split_work_rate(raw: &str) -> std::result::Result<(&str, &str), String> {
    match raw.trim().split("/ ").collect::<Vec<_>>().as_slice() {
        [attack, defence] => Ok((attack.trim(), defence.trim())),
        parts => Err(format!(
            "expected `<attack>/ <defence>`, got {} part(s)",
            parts.len()
        )),
    }
}

/// Work rate level to integer: `Low` → 0, `Medium` → 1, `High` → 2.
pub fn work_rate_level(level: &str) -> Option<i64> {
    lookup(WORK_RATE_LEVELS, level)
}

/// Derive the attack and defence work-rate columns. The raw column is left
/// in place for the pruning stage.
pub fn process_work_rate(df: &mut DataFrame, warnings: &mut Warnings) -> Result<()> {
    let rates = table::text_values(df, WORK_RATE)?;
    let mut attack: Vec<Option<i64>> = Vec::with_capacity(rates.len());
    let mut defence: Vec<Option<i64>> = Vec::with_capacity(rates.len());

    for (row, rate) in rates.iter().enumerate() {
        let Some(raw) = rate.as_deref() else {
            warnings.push(DataQualityWarning::UnmappedCategory {
                column: WORK_RATE.to_string(),
                row,
                value: "nan".into(),
            });
            attack.push(None);
            defence.push(None);
            continue;
        };
        let (att, def) =
            split_work_rate(raw).map_err(|reason| PipelineError::parse(WORK_RATE, row, raw, reason))?;
        for (level, target) in [(att, &mut attack), (def, &mut defence)] {
            let code = work_rate_level(level);
            if code.is_none() {
                warnings.push(DataQualityWarning::UnmappedCategory {
                    column: WORK_RATE.to_string(),
                    row,
                    value: level.to_string(),
                });
            }
            target.push(code);
        }
    }

    table::set_column(df, Series::new(WORK_RATE_ATTACK.into(), attack))?;
    table::set_column(df, Series::new(WORK_RATE_DEFENCE.into(), defence))
}

/// Append one boolean indicator column per distinct value of `column`,
/// named `<prefix>_<value>` and ordered by sorted category. Labels are
/// trimmed before comparison. Rows with a missing category get `false`
/// everywhere. Returns the new column names.
pub fn one_hot_encode(df: &mut DataFrame, column: &str, prefix: &str) -> Result<Vec<String>> {
    let trimmed: Vec<Option<String>> = table::text_values(df, column)?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect();
    let categories: BTreeSet<&str> = trimmed.iter().flatten().map(String::as_str).collect();
    let labels: StringChunked = trimmed.iter().map(Option::as_deref).collect();

    let mut added = Vec::with_capacity(categories.len());
    for category in &categories {
        let name = format!("{prefix}_{category}");
        let indicator: Vec<bool> = labels
            .equal(*category)
            .into_iter()
            .map(|hit| hit.unwrap_or(false))
            .collect();
        table::set_column(df, Series::new(name.as_str().into(), indicator))?;
        added.push(name);
    }
    debug!("one-hot encoded `{}` into {} column(s)", column, added.len());
    Ok(added)
}

pub fn position_one_hot_encode(df: &mut DataFrame) -> Result<Vec<String>> {
    one_hot_encode(df, POSITION, POSITION_PREFIX)
}

pub fn nationality_one_hot_encode(df: &mut DataFrame) -> Result<Vec<String>> {
    one_hot_encode(df, NATIONALITY, NATIONALITY_PREFIX)
}
