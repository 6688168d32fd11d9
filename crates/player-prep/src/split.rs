// Goalkeeper / outfield split of the raw player export.

use crate::config::SplitConfig;
use crate::error::Result;
use crate::pipeline::categorical::POSITION;
use crate::table;
use polars::prelude::*;
use tracing::info;

/// Output delimiter for the split files, which feed the feature pipeline.
pub const SPLIT_OUTPUT_DELIMITER: u8 = b',';

const GOALKEEPER: &str = "GK";

/// Row counts produced by a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSummary {
    pub without_position: usize,
    pub goalkeepers: usize,
    pub outfield: usize,
}

/// Drop rows with no Position, then partition into (goalkeepers, outfield).
pub fn split_goalkeepers(mut df: DataFrame) -> Result<(DataFrame, DataFrame, SplitSummary)> {
    let has_position: Vec<bool> = table::text_values(&df, POSITION)?
        .iter()
        .map(Option::is_some)
        .collect();
    let without_position = table::retain_rows(&mut df, &has_position)?;

    let is_goalkeeper: BooleanChunked = table::text_values(&df, POSITION)?
        .iter()
        .map(|p| p.as_deref().is_some_and(|p| p.trim() == GOALKEEPER))
        .collect();
    let goalkeepers = df.filter(&is_goalkeeper)?;
    let outfield = df.filter(&!&is_goalkeeper)?;

    let summary = SplitSummary {
        without_position,
        goalkeepers: goalkeepers.height(),
        outfield: outfield.height(),
    };
    Ok((goalkeepers, outfield, summary))
}

/// Read the raw export and write the goalkeeper and outfield files.
pub fn run_from_paths(config: &SplitConfig) -> Result<SplitSummary> {
    info!("reading {}", config.source_path.display());
    let df = table::load(&config.source_path, config.delimiter)?;

    let (mut goalkeepers, mut outfield, summary) = split_goalkeepers(df)?;
    info!(
        "split: {} goalkeeper(s), {} outfield player(s), {} without position",
        summary.goalkeepers, summary.outfield, summary.without_position
    );

    table::save(&mut goalkeepers, &config.goalkeepers_path, SPLIT_OUTPUT_DELIMITER)?;
    table::save(&mut outfield, &config.outfield_path, SPLIT_OUTPUT_DELIMITER)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
ID;Name;Position;Overall
1;Keeper One;GK;88
2;Striker;ST;90
3;Nobody;;50
4;Back;CB;80";

    fn names(df: &DataFrame) -> Vec<Option<String>> {
        table::text_values(df, "Name").unwrap()
    }

    #[test]
    fn partitions_by_position() {
        let df = table::read_csv(RAW.as_bytes(), b';').unwrap();
        let (gk, out, summary) = split_goalkeepers(df).unwrap();
        assert_eq!(
            summary,
            SplitSummary {
                without_position: 1,
                goalkeepers: 1,
                outfield: 2,
            }
        );
        assert_eq!(names(&gk), vec![Some("Keeper One".to_string())]);
        assert_eq!(
            names(&out),
            vec![Some("Striker".to_string()), Some("Back".to_string())]
        );
    }

    #[test]
    fn missing_position_column_is_error() {
        let df = table::read_csv("ID;Name\n1;A".as_bytes(), b';').unwrap();
        assert!(split_goalkeepers(df).is_err());
    }

    #[test]
    fn writes_comma_delimited_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("data.csv");
        std::fs::write(&source, RAW).unwrap();
        let config = SplitConfig {
            source_path: source,
            delimiter: b';',
            goalkeepers_path: dir.path().join("gk.csv"),
            outfield_path: dir.path().join("out.csv"),
        };

        let summary = run_from_paths(&config).unwrap();
        assert_eq!(summary.outfield, 2);

        let gk = std::fs::read_to_string(&config.goalkeepers_path).unwrap();
        assert_eq!(gk, "ID,Name,Position,Overall\n1,Keeper One,GK,88\n");
        let out = table::load(&config.outfield_path, b',').unwrap();
        assert_eq!(out.height(), 2);
    }
}
