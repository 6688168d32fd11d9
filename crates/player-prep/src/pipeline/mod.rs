// Feature pipeline: the fixed stage sequence that turns the outfield player
// table into a numeric, normalized feature table.

pub mod categorical;
pub mod clubs;
pub mod currency;
pub mod dates;
pub mod filters;
pub mod normalize;
pub mod positions;
pub mod units;

use crate::config::PipelineConfig;
use crate::error::{DataQualityWarning, PipelineError, Result, Warnings};
use crate::table;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// One step of the pipeline. Stages always run in the order of
/// [`Stage::ALL`]; each one consumes the output of the previous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParseWage,
    ParseValue,
    ParseReleaseClause,
    ConvertHeight,
    ConvertWeight,
    PositionRatings,
    ContractYear,
    PreferredFoot,
    RealFace,
    WorkRate,
    JoinedYear,
    DropZeroValue,
    ClubOverall,
    Loans,
    PositionOneHot,
    NationalityOneHot,
    ExtractValues,
    PruneColumns,
    Normalize,
}

impl Stage {
    pub const ALL: [Stage; 19] = [
        Stage::ParseWage,
        Stage::ParseValue,
        Stage::ParseReleaseClause,
        Stage::ConvertHeight,
        Stage::ConvertWeight,
        Stage::PositionRatings,
        Stage::ContractYear,
        Stage::PreferredFoot,
        Stage::RealFace,
        Stage::WorkRate,
        Stage::JoinedYear,
        Stage::DropZeroValue,
        Stage::ClubOverall,
        Stage::Loans,
        Stage::PositionOneHot,
        Stage::NationalityOneHot,
        Stage::ExtractValues,
        Stage::PruneColumns,
        Stage::Normalize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::ParseWage => "parse wage",
            Stage::ParseValue => "parse value",
            Stage::ParseReleaseClause => "parse release clause",
            Stage::ConvertHeight => "convert height",
            Stage::ConvertWeight => "convert weight",
            Stage::PositionRatings => "position ratings",
            Stage::ContractYear => "contract year",
            Stage::PreferredFoot => "preferred foot",
            Stage::RealFace => "real face",
            Stage::WorkRate => "work rate",
            Stage::JoinedYear => "joined year",
            Stage::DropZeroValue => "drop zero value",
            Stage::ClubOverall => "club overall",
            Stage::Loans => "loans",
            Stage::PositionOneHot => "position one-hot",
            Stage::NationalityOneHot => "nationality one-hot",
            Stage::ExtractValues => "extract values",
            Stage::PruneColumns => "prune columns",
            Stage::Normalize => "normalize",
        }
    }
}

/// Summary of a pipeline run, including the extracted Value vector.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_out: usize,
    /// Parsed market values, aligned with the output rows.
    pub values: Vec<f64>,
    pub warnings: Vec<DataQualityWarning>,
}

/// Mutable state threaded through the stages alongside the frame.
#[derive(Default)]
struct RunState {
    averages: clubs::ClubAverages,
    values: Vec<f64>,
    warnings: Warnings,
}

fn apply_stage(stage: Stage, df: &mut DataFrame, state: &mut RunState) -> Result<()> {
    match stage {
        Stage::ParseWage => currency::parse_wage(df),
        Stage::ParseValue => currency::parse_value(df),
        Stage::ParseReleaseClause => currency::parse_release_clause(df),
        Stage::ConvertHeight => units::convert_height(df),
        Stage::ConvertWeight => units::convert_weight(df),
        Stage::PositionRatings => positions::process_positions(df),
        Stage::ContractYear => dates::process_contract(df).map(|_| ()),
        Stage::PreferredFoot => categorical::process_preferred_foot(df, &mut state.warnings),
        Stage::RealFace => categorical::process_real_face(df, &mut state.warnings),
        Stage::WorkRate => categorical::process_work_rate(df, &mut state.warnings),
        Stage::JoinedYear => dates::process_joined(df),
        Stage::DropZeroValue => filters::drop_zero_value(df).map(|_| ()),
        Stage::ClubOverall => {
            state.averages = clubs::add_club_overall(df)?;
            Ok(())
        }
        Stage::Loans => clubs::resolve_loans(df, &state.averages, &mut state.warnings),
        Stage::PositionOneHot => categorical::position_one_hot_encode(df).map(|_| ()),
        Stage::NationalityOneHot => categorical::nationality_one_hot_encode(df).map(|_| ()),
        Stage::ExtractValues => {
            state.values = currency::extract_values(df)?;
            Ok(())
        }
        Stage::PruneColumns => normalize::prune_columns(df).map(|_| ()),
        Stage::Normalize => normalize::normalize(df, &mut state.warnings),
    }
}

/// Run every stage over the frame in place. The first error aborts the
/// run; the frame is then in an unspecified intermediate state.
pub fn run(df: &mut DataFrame) -> Result<PipelineReport> {
    run_stages(df, &Stage::ALL)
}

/// Run a prefix of the stage sequence, e.g. to inspect the frame before
/// pruning and normalization.
pub fn run_stages(df: &mut DataFrame, stages: &[Stage]) -> Result<PipelineReport> {
    let rows_in = df.height();
    let mut state = RunState::default();

    for &stage in stages {
        apply_stage(stage, df, &mut state)?;
        info!(
            "stage `{}` done: {} rows, {} columns",
            stage.name(),
            df.height(),
            df.width()
        );
    }

    Ok(PipelineReport {
        rows_in,
        rows_out: df.height(),
        columns_out: df.width(),
        values: state.values,
        warnings: state.warnings.into_vec(),
    })
}

/// Write the extracted Value vector as a one-column CSV. NaN entries are
/// written as empty fields.
pub fn write_values(path: &Path, values: &[f64]) -> Result<()> {
    let csv_err = |e: csv::Error| PipelineError::Csv {
        path: path.display().to_string(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(["Value"]).map_err(csv_err)?;
    for value in values {
        let field = if value.is_nan() {
            String::new()
        } else {
            value.to_string()
        };
        writer.write_record([field]).map_err(csv_err)?;
    }
    writer.flush().map_err(|e| PipelineError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the input table, run the pipeline and write the outputs. Nothing is
/// written if any stage fails.
pub fn run_from_paths(config: &PipelineConfig) -> Result<PipelineReport> {
    info!("reading {}", config.input_path.display());
    let mut df = table::load(&config.input_path, config.delimiter)?;

    let report = run(&mut df)?;

    table::save(&mut df, &config.output_path, config.delimiter)?;
    info!("wrote {}", config.output_path.display());

    if let Some(side_channel) = &config.side_channel_path {
        write_values(side_channel, &report.values)?;
        info!("wrote {} value(s) to {}", report.values.len(), side_channel.display());
    }
    Ok(report)
}
