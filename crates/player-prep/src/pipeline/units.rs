// Imperial to metric conversion for Height and Weight.

use crate::error::{PipelineError, Result};
use crate::table;
use polars::prelude::*;

pub const HEIGHT: &str = "Height";
pub const WEIGHT: &str = "Weight";

const METERS_PER_FOOT: f64 = 0.3048;
const METERS_PER_INCH: f64 = 0.0254;
const KG_PER_POUND: f64 = 0.45359237;

/// Truncate (not round) toward zero at the given number of decimals.
pub fn truncate(number: f64, digits: i32) -> f64 {
    let stepper = 10f64.powi(digits);
    (number * stepper).trunc() / stepper
}

/// Convert a `feet'inches` string to meters, truncated to 2 decimals.
///
/// Returns `Ok(None)` when there is no apostrophe, meaning the value is not
/// in imperial form and should be left alone.
pub fn feet_to_meters(height: &str) -> std::result::Result<Option<f64>, String> {
    let Some((feet, inches)) = height.trim().split_once('\'') else {
        return Ok(None);
    };
    let feet: i64 = feet
        .trim()
        .parse()
        .map_err(|_| format!("feet `{feet}` is not an integer"))?;
    let inches: i64 = inches
        .trim()
        .parse()
        .map_err(|_| format!("inches `{inches}` is not an integer"))?;
    let meters = METERS_PER_FOOT * feet as f64 + METERS_PER_INCH * inches as f64;
    Ok(Some(truncate(meters, 2)))
}

/// Convert a pound string such as `170lbs` to kilograms, truncated to
/// 2 decimals. NaN input comes back as NaN.
pub fn lbs_to_kg(weight: &str) -> std::result::Result<f64, String> {
    let number = weight
        .trim()
        .trim_end_matches(|c: char| matches!(c.to_ascii_lowercase(), 'l' | 'b' | 's'));
    let pounds: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("`{number}` is not a weight"))?;
    let kg = KG_PER_POUND * pounds;
    if kg.is_nan() {
        return Ok(kg);
    }
    Ok(truncate(kg, 2))
}

/// Heights already in metric form (no apostrophe) are kept as numbers.
pub fn convert_height(df: &mut DataFrame) -> Result<()> {
    let meters = table::map_text(df, HEIGHT, |row, raw| match feet_to_meters(raw) {
        Ok(Some(meters)) => Ok(meters),
        Ok(None) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| PipelineError::parse(HEIGHT, row, raw, "not a height")),
        Err(reason) => Err(PipelineError::parse(HEIGHT, row, raw, reason)),
    })?;
    table::set_column(df, Series::new(HEIGHT.into(), meters))
}

pub fn convert_weight(df: &mut DataFrame) -> Result<()> {
    let kilograms = table::map_text(df, WEIGHT, |row, raw| {
        lbs_to_kg(raw).map_err(|reason| PipelineError::parse(WEIGHT, row, raw, reason))
    })?;
    let kilograms: Vec<Option<f64>> = kilograms
        .into_iter()
        .map(|kg| kg.filter(|x| !x.is_nan()))
        .collect();
    table::set_column(df, Series::new(WEIGHT.into(), kilograms))
}
