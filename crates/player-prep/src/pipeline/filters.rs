// Row filters.

use crate::error::Result;
use crate::pipeline::currency::VALUE;
use crate::table;
use polars::prelude::*;
use tracing::info;

/// Drop players whose parsed market value is exactly zero. Must run after
/// the Value column has been parsed. Returns the number of rows dropped.
pub fn drop_zero_value(df: &mut DataFrame) -> Result<usize> {
    let keep: Vec<bool> = table::float_values(df, VALUE)?
        .into_iter()
        .map(|v| v != Some(0.0))
        .collect();
    let dropped = table::retain_rows(df, &keep)?;
    if dropped > 0 {
        info!("dropped {} row(s) with zero market value", dropped);
    }
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_rows_removed() {
        let mut df = df!(
            VALUE => [Some(1_000_000.0), Some(0.0), None, Some(-0.0)],
            "Name" => ["P0", "P1", "P2", "P3"]
        )
        .unwrap();

        assert_eq!(drop_zero_value(&mut df).unwrap(), 2);
        assert_eq!(
            table::text_values(&df, "Name").unwrap(),
            vec![Some("P0".to_string()), Some("P2".to_string())]
        );
        assert!(table::float_values(&df, VALUE)
            .unwrap()
            .iter()
            .all(|v| *v != Some(0.0)));
    }

    #[test]
    fn missing_value_column_is_schema_error() {
        let mut df = df!("Name" => ["P0"]).unwrap();
        assert!(drop_zero_value(&mut df).is_err());
    }
}
