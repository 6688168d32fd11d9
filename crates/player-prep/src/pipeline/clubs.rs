// Club aggregates: mean Overall per club, and the loan-origin lookup.

use crate::error::{DataQualityWarning, PipelineError, Result, Warnings};
use crate::table;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

pub const CLUB: &str = "Club";
pub const OVERALL: &str = "Overall";
pub const LOANED_FROM: &str = "Loaned From";
pub const CLUB_OVERALL: &str = "Club_Overall";
pub const IS_LOANED: &str = "Is_Loaned";
pub const LOANED_FROM_OVERALL: &str = "Loaned_From_Overall";

/// Mean Overall rating for every club present in the table, computed once.
#[derive(Debug, Clone, Default)]
pub struct ClubAverages {
    means: HashMap<String, f64>,
}

impl ClubAverages {
    /// Group ratings by club with a polars group-by. Rows without a club
    /// are skipped.
    pub fn from_ratings(clubs: &[Option<String>], overall: &[f64]) -> Result<Self> {
        let frame = df!(
            CLUB => clubs.to_vec(),
            OVERALL => overall.to_vec()
        )?;
        let grouped = frame
            .lazy()
            .filter(col(CLUB).is_not_null())
            .group_by([col(CLUB)])
            .agg([col(OVERALL).mean()])
            .collect()?;

        let names = grouped.column(CLUB)?.str()?;
        let means = grouped.column(OVERALL)?.f64()?;
        let means = names
            .into_iter()
            .zip(means.into_iter())
            .filter_map(|(club, mean)| Some((club?.to_string(), mean?)))
            .collect();
        Ok(ClubAverages { means })
    }

    pub fn get(&self, club: &str) -> Option<f64> {
        self.means.get(club).copied()
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

fn overall_ratings(df: &DataFrame) -> Result<Vec<f64>> {
    table::float_values(df, OVERALL)?
        .into_iter()
        .enumerate()
        .map(|(row, rating)| {
            rating.ok_or_else(|| PipelineError::parse(OVERALL, row, "nan", "not a rating"))
        })
        .collect()
}

/// Append `Club_Overall`: the mean Overall of the row's club. A row with no
/// club keeps its own Overall as the club average.
pub fn add_club_overall(df: &mut DataFrame) -> Result<ClubAverages> {
    let overall = overall_ratings(df)?;
    let clubs = table::text_values(df, CLUB)?;
    let averages = ClubAverages::from_ratings(&clubs, &overall)?;

    let club_overall: Vec<f64> = clubs
        .iter()
        .zip(&overall)
        .map(|(club, own)| {
            club.as_deref()
                .and_then(|name| averages.get(name))
                .unwrap_or(*own)
        })
        .collect();
    table::set_column(df, Series::new(CLUB_OVERALL.into(), club_overall))?;

    debug!("computed Overall averages for {} club(s)", averages.len());
    Ok(averages)
}

/// Append `Is_Loaned` and `Loaned_From_Overall`.
///
/// Loaned players take the average of their origin club; everyone else,
/// and loaned players whose origin club is not in the table, take their
/// own `Club_Overall`. Must run after [`add_club_overall`].
pub fn resolve_loans(
    df: &mut DataFrame,
    averages: &ClubAverages,
    warnings: &mut Warnings,
) -> Result<()> {
    let own = table::float_values(df, CLUB_OVERALL)?;
    let origins = table::text_values(df, LOANED_FROM)?;

    let mut is_loaned: Vec<i64> = Vec::with_capacity(origins.len());
    let mut origin_overall: Vec<Option<f64>> = Vec::with_capacity(origins.len());

    for (row, origin) in origins.into_iter().enumerate() {
        let Some(origin) = origin else {
            is_loaned.push(0);
            origin_overall.push(own[row]);
            continue;
        };
        is_loaned.push(1);
        match averages.get(&origin) {
            Some(mean) => origin_overall.push(Some(mean)),
            None => {
                warnings.push(DataQualityWarning::UnmatchedLoanClub { row, club: origin });
                origin_overall.push(own[row]);
            }
        }
    }

    table::set_column(df, Series::new(IS_LOANED.into(), is_loaned))?;
    table::set_column(df, Series::new(LOANED_FROM_OVERALL.into(), origin_overall))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn club_frame() -> DataFrame {
        df!(
            CLUB => [Some("FC Porto"), Some("FC Porto"), Some("Ajax"), None, Some("Ajax")],
            OVERALL => [80i64, 70, 76, 65, 74],
            LOANED_FROM => [None, Some("Ajax"), None, Some("Atlantis United"), Some("FC Porto")]
        )
        .unwrap()
    }

    fn floats(df: &DataFrame, column: &str) -> Vec<f64> {
        table::float_values(df, column)
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn club_overall_is_group_mean() {
        let mut df = club_frame();
        let averages = add_club_overall(&mut df).unwrap();
        assert_eq!(averages.len(), 2);
        assert!(approx_eq(averages.get("FC Porto").unwrap(), 75.0));
        assert!(approx_eq(averages.get("Ajax").unwrap(), 75.0));

        let club_overall = floats(&df, CLUB_OVERALL);
        assert!(approx_eq(club_overall[0], 75.0));
        assert!(approx_eq(club_overall[2], 75.0));
    }

    #[test]
    fn missing_club_falls_back_to_own_overall() {
        let mut df = club_frame();
        add_club_overall(&mut df).unwrap();
        assert!(approx_eq(floats(&df, CLUB_OVERALL)[3], 65.0));
    }

    #[test]
    fn literal_nan_club_falls_back_to_own_overall() {
        let mut df = df!(CLUB => ["nan", "nan"], OVERALL => [60i64, 90]).unwrap();
        let averages = add_club_overall(&mut df).unwrap();
        assert!(averages.is_empty());
        assert_eq!(floats(&df, CLUB_OVERALL), vec![60.0, 90.0]);
    }

    #[test]
    fn non_numeric_overall_is_error() {
        let mut df = df!(CLUB => ["Ajax"], OVERALL => ["great"]).unwrap();
        assert!(matches!(
            add_club_overall(&mut df),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn loan_flags_and_origin_overall() {
        let mut df = club_frame();
        let averages = add_club_overall(&mut df).unwrap();
        let mut warnings = Warnings::new();
        resolve_loans(&mut df, &averages, &mut warnings).unwrap();

        assert_eq!(
            table::int_values(&df, IS_LOANED).unwrap(),
            vec![Some(0), Some(1), Some(0), Some(1), Some(1)]
        );
        let origin = floats(&df, LOANED_FROM_OVERALL);
        let own = floats(&df, CLUB_OVERALL);
        // Not loaned: own club average.
        assert!(approx_eq(origin[0], own[0]));
        assert!(approx_eq(origin[2], own[2]));
        // Loaned from a known club.
        assert!(approx_eq(origin[1], 75.0));
        assert!(approx_eq(origin[4], 75.0));
        // Unknown origin club falls back.
        assert!(approx_eq(origin[3], own[3]));
        assert_eq!(
            warnings.into_vec(),
            vec![DataQualityWarning::UnmatchedLoanClub {
                row: 3,
                club: "Atlantis United".into()
            }]
        );
    }

    #[test]
    fn loans_require_club_overall() {
        let mut df = club_frame();
        let mut warnings = Warnings::new();
        let err = resolve_loans(&mut df, &ClubAverages::default(), &mut warnings).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { ref column } if column == CLUB_OVERALL));
    }
}
