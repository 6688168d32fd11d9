// Currency parsing for the Wage, Value and Release Clause columns.
//
// Raw values look like `€565K` or `£1.5M`. Exports that went through a
// cp1252/UTF-8 mismatch carry the euro sign as the three characters `â‚¬`.

use crate::error::{PipelineError, Result};
use crate::table;
use polars::prelude::*;
use tracing::debug;

pub const WAGE: &str = "Wage";
pub const VALUE: &str = "Value";
pub const RELEASE_CLAUSE: &str = "Release Clause";

/// Every character that can appear in a currency prefix, including the
/// pieces of a mis-decoded euro sign.
const CURRENCY_SYMBOLS: &[char] = &['£', '$', '€', 'â', '‚', '¬'];

const MAGNITUDE_MARKERS: &[char] = &['k', 'K', 'm', 'M'];

/// Parse a currency string into a plain number.
///
/// A `K`/`k` anywhere in the input multiplies by 1,000 and an `M`/`m` by
/// 1,000,000. Without either marker the bare number is returned.
pub fn parse_currency(raw: &str) -> std::result::Result<f64, String> {
    let trimmed = raw.trim();
    let number = trimmed
        .trim_start_matches(CURRENCY_SYMBOLS)
        .trim_end_matches(MAGNITUDE_MARKERS);

    let value: f64 = number
        .parse()
        .map_err(|_| format!("`{number}` is not a number"))?;
    if value.is_infinite() {
        return Err("value is infinite".into());
    }

    let multiplier = if trimmed.contains(['K', 'k']) {
        1_000.0
    } else if trimmed.contains(['M', 'm']) {
        1_000_000.0
    } else {
        1.0
    };
    Ok(value * multiplier)
}

fn parse_currency_column(df: &mut DataFrame, column: &str) -> Result<()> {
    let parsed = table::map_text(df, column, |row, raw| {
        parse_currency(raw).map_err(|reason| PipelineError::parse(column, row, raw, reason))
    })?;
    table::set_column(df, Series::new(column.into(), parsed))?;
    debug!("parsed currency column `{}`", column);
    Ok(())
}

pub fn parse_wage(df: &mut DataFrame) -> Result<()> {
    parse_currency_column(df, WAGE)
}

pub fn parse_value(df: &mut DataFrame) -> Result<()> {
    parse_currency_column(df, VALUE)
}

/// Release Clause is optional in older exports; it is parsed when present.
pub fn parse_release_clause(df: &mut DataFrame) -> Result<()> {
    if table::has_column(df, RELEASE_CLAUSE) {
        parse_currency_column(df, RELEASE_CLAUSE)?;
    }
    Ok(())
}

/// Pull the parsed Value column out as a plain vector. Missing values
/// become NaN.
pub fn extract_values(df: &DataFrame) -> Result<Vec<f64>> {
    Ok(table::float_values(df, VALUE)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn thousands_marker() {
        assert!(approx_eq(parse_currency("£565K").unwrap(), 565_000.0));
        assert!(approx_eq(parse_currency("€565k").unwrap(), 565_000.0));
    }

    #[test]
    fn millions_marker() {
        assert!(approx_eq(parse_currency("€1.5M").unwrap(), 1_500_000.0));
        assert!(approx_eq(parse_currency("$110.5m").unwrap(), 110_500_000.0));
    }

    #[test]
    fn no_marker_returns_bare_number() {
        assert!(approx_eq(parse_currency("0").unwrap(), 0.0));
        assert!(approx_eq(parse_currency("€0").unwrap(), 0.0));
        assert!(approx_eq(parse_currency("1234.5").unwrap(), 1234.5));
    }

    #[test]
    fn mis_decoded_euro_prefix() {
        assert!(approx_eq(parse_currency("â‚¬110.5M").unwrap(), 110_500_000.0));
        assert!(approx_eq(parse_currency("â‚¬2K").unwrap(), 2_000.0));
    }

    #[test]
    fn malformed_input_is_error() {
        assert!(parse_currency("€abcK").is_err());
        assert!(parse_currency("").is_err());
        assert!(parse_currency("€").is_err());
    }

    #[test]
    fn wage_column_parsed_in_place() {
        let mut df = df!(
            WAGE => [Some("€565K"), Some("0"), None, Some("nan")]
        )
        .unwrap();
        parse_wage(&mut df).unwrap();
        assert_eq!(
            table::float_values(&df, WAGE).unwrap(),
            vec![Some(565_000.0), Some(0.0), None, None]
        );
    }

    #[test]
    fn numeric_column_passes_through() {
        let mut df = df!(VALUE => [1_000i64, 0]).unwrap();
        parse_value(&mut df).unwrap();
        assert_eq!(
            table::float_values(&df, VALUE).unwrap(),
            vec![Some(1_000.0), Some(0.0)]
        );
    }

    #[test]
    fn malformed_cell_reports_row() {
        let mut df = df!(VALUE => ["€1M", "€??"]).unwrap();
        let err = parse_value(&mut df).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { row: 1, ref column, .. } if column == VALUE));
    }

    #[test]
    fn missing_wage_column_is_schema_error() {
        let mut df = df!("Name" => ["L. Messi"]).unwrap();
        assert!(matches!(
            parse_wage(&mut df),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn release_clause_optional() {
        let mut df = df!("Name" => ["L. Messi"]).unwrap();
        parse_release_clause(&mut df).unwrap();
        assert!(!table::has_column(&df, RELEASE_CLAUSE));

        let mut df = df!(RELEASE_CLAUSE => ["€226.5M"]).unwrap();
        parse_release_clause(&mut df).unwrap();
        assert_eq!(
            table::float_values(&df, RELEASE_CLAUSE).unwrap(),
            vec![Some(226_500_000.0)]
        );
    }

    #[test]
    fn extract_values_maps_missing_to_nan() {
        let df = df!(VALUE => [Some(1.0), None]).unwrap();
        let values = extract_values(&df).unwrap();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
    }
}
