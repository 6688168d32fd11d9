// Contract and join-date normalization down to a bare year.

use crate::error::{PipelineError, Result};
use crate::table;
use polars::prelude::*;
use tracing::info;

pub const CONTRACT_VALID_UNTIL: &str = "Contract Valid Until";
pub const JOINED: &str = "Joined";

/// Players with no recorded join date are assumed to have joined this many
/// years before their contract expires.
pub const JOINED_BACKFILL_YEARS: i64 = 3;

/// Reduce a date to its year substring.
///
/// Anything longer than four characters is a `Month Day, Year` string and is
/// split on `", "`; a bare four-character year is returned unchanged.
pub fn extract_year(raw: &str) -> std::result::Result<&str, String> {
    if raw.chars().count() <= 4 {
        return Ok(raw);
    }
    match raw.split(", ").collect::<Vec<_>>().as_slice() {
        [_, year] => Ok(*year),
        parts => Err(format!(
            "expected `<month day>, <year>`, got {} part(s)",
            parts.len()
        )),
    }
}

fn parse_year(column: &str, row: usize, raw: &str) -> Result<i64> {
    // Integer columns with nulls can come back from a float round trip as
    // `2021.0`.
    if let Ok(number) = raw.trim().parse::<f64>() {
        if number.fract() == 0.0 {
            return Ok(number as i64);
        }
    }
    let year =
        extract_year(raw).map_err(|reason| PipelineError::parse(column, row, raw, reason))?;
    year.trim()
        .parse()
        .map_err(|_| PipelineError::parse(column, row, raw, format!("`{year}` is not a year")))
}

/// Drop rows without a contract year, then turn the column into integers.
/// Returns the number of rows dropped.
pub fn process_contract(df: &mut DataFrame) -> Result<usize> {
    let keep: Vec<bool> = table::text_values(df, CONTRACT_VALID_UNTIL)?
        .iter()
        .map(Option::is_some)
        .collect();
    let dropped = table::retain_rows(df, &keep)?;
    if dropped > 0 {
        info!("dropped {} row(s) with no contract end year", dropped);
    }

    let years = table::map_text(df, CONTRACT_VALID_UNTIL, |row, raw| {
        parse_year(CONTRACT_VALID_UNTIL, row, raw)
    })?;
    table::set_column(df, Series::new(CONTRACT_VALID_UNTIL.into(), years))?;
    Ok(dropped)
}

/// Reduce Joined to a year, back-filling missing values from the contract
/// end year. Must run after [`process_contract`].
pub fn process_joined(df: &mut DataFrame) -> Result<()> {
    let contract_years = table::int_values(df, CONTRACT_VALID_UNTIL)?;
    let joined = table::map_text(df, JOINED, |row, raw| parse_year(JOINED, row, raw))?;

    let mut backfilled = 0;
    let years: Vec<Option<i64>> = joined
        .into_iter()
        .zip(contract_years)
        .map(|(joined, contract)| {
            joined.or_else(|| {
                backfilled += 1;
                contract.map(|year| year - JOINED_BACKFILL_YEARS)
            })
        })
        .collect();
    table::set_column(df, Series::new(JOINED.into(), years))?;
    if backfilled > 0 {
        info!("back-filled {} missing join year(s) from contract end", backfilled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_date_keeps_year() {
        assert_eq!(extract_year("Jun 30, 2021").unwrap(), "2021");
        assert_eq!(extract_year("Jul 1, 2004").unwrap(), "2004");
    }

    #[test]
    fn bare_year_unchanged() {
        assert_eq!(extract_year("2021").unwrap(), "2021");
    }

    #[test]
    fn long_string_without_separator_is_error() {
        assert!(extract_year("June 2021").is_err());
    }

    #[test]
    fn contract_rows_without_year_dropped() {
        let mut df = df!(
            "Name" => ["Player 0", "Player 1", "Player 2", "Player 3"],
            CONTRACT_VALID_UNTIL => [Some("Jun 30, 2021"), None, Some("2020"), Some("nan")]
        )
        .unwrap();
        let dropped = process_contract(&mut df).unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(df.height(), 2);
        assert_eq!(
            table::int_values(&df, CONTRACT_VALID_UNTIL).unwrap(),
            vec![Some(2021), Some(2020)]
        );
        assert_eq!(
            table::text_values(&df, "Name").unwrap()[1],
            Some("Player 2".to_string())
        );
    }

    #[test]
    fn contract_float_years_accepted() {
        let mut df = df!(CONTRACT_VALID_UNTIL => [Some(2021.0), None]).unwrap();
        process_contract(&mut df).unwrap();
        assert_eq!(table::int_values(&df, CONTRACT_VALID_UNTIL).unwrap(), vec![Some(2021)]);
    }

    #[test]
    fn contract_bad_year_is_error() {
        let mut df = df!(CONTRACT_VALID_UNTIL => ["Jun 30, 20x1"]).unwrap();
        assert!(matches!(
            process_contract(&mut df),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn joined_year_and_backfill() {
        let mut df = df!(
            CONTRACT_VALID_UNTIL => [2021i64, 2020, 2022],
            JOINED => [Some("Jul 1, 2004"), None, Some("2018")]
        )
        .unwrap();
        process_joined(&mut df).unwrap();
        assert_eq!(
            table::int_values(&df, JOINED).unwrap(),
            vec![Some(2004), Some(2017), Some(2018)]
        );
    }

    #[test]
    fn joined_requires_normalized_contract() {
        let mut df = df!(
            CONTRACT_VALID_UNTIL => ["Jun 30, 2021"],
            JOINED => [None::<&str>]
        )
        .unwrap();
        assert!(process_joined(&mut df).is_err());
    }
}
