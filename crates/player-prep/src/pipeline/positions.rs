// Positional ratings: `base+modifier` strings summed into a single integer.

use crate::error::{PipelineError, Result};
use crate::table;
use polars::prelude::*;

/// Every on-pitch positional rating column in the source export.
pub const POSITION_COLUMNS: [&str; 26] = [
    "LS", "ST", "RS", "LW", "LF", "CF", "RF", "RW", "LAM", "CAM", "RAM", "LM", "LCM", "CM", "RCM",
    "RM", "LWB", "LDM", "CDM", "RDM", "RWB", "LB", "LCB", "CB", "RCB", "RB",
];

/// Sum a compound rating such as `88+2`. Exactly two integer parts are
/// required.
pub fn parse_compound_rating(raw: &str) -> std::result::Result<i64, String> {
    let parts: Vec<&str> = raw.trim().split('+').collect();
    let [base, modifier] = parts.as_slice() else {
        return Err(format!("expected `base+modifier`, got {} part(s)", parts.len()));
    };
    let base: i64 = base
        .trim()
        .parse()
        .map_err(|_| format!("base `{base}` is not an integer"))?;
    let modifier: i64 = modifier
        .trim()
        .parse()
        .map_err(|_| format!("modifier `{modifier}` is not an integer"))?;
    Ok(base + modifier)
}

/// Collapse every positional rating column to its integer sum. Absent
/// ratings stay null.
pub fn process_positions(df: &mut DataFrame) -> Result<()> {
    for column in POSITION_COLUMNS {
        let sums = table::map_text(df, column, |row, raw| {
            parse_compound_rating(raw)
                .map_err(|reason| PipelineError::parse(column, row, raw, reason))
        })?;
        table::set_column(df, Series::new(column.into(), sums))?;
    }
    Ok(())
}
