// Player feature preparation entry point.
//
// 1. Initialize tracing (stderr)
// 2. Load config, applying command-line path overrides
// 3. Run the goalkeeper split and/or the feature pipeline
// 4. Print a one-line summary per step

use player_prep::config::{self, PipelineConfig};
use player_prep::pipeline;
use player_prep::split;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "player-prep")]
#[command(about = "Clean and normalize football player attributes into model features")]
struct Cli {
    /// Directory holding config/ (and defaults/), against which relative
    /// paths are resolved
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the raw export into goalkeeper and outfield files
    Split,
    /// Run the feature pipeline over the outfield players
    Process {
        #[command(flatten)]
        paths: PathOverrides,
    },
    /// Split, then run the feature pipeline
    All {
        #[command(flatten)]
        paths: PathOverrides,
    },
}

#[derive(clap::Args)]
struct PathOverrides {
    /// Input table (overrides pipeline.input)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output table (overrides pipeline.output)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Extracted Value vector destination (overrides pipeline.side_channel)
    #[arg(long)]
    side_channel: Option<PathBuf>,
}

impl PathOverrides {
    fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(side_channel) = self.side_channel {
            config.side_channel_path = Some(side_channel);
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = config::load_config(&cli.base_dir).context("failed to load configuration")?;
    info!("Config loaded from {}", cli.base_dir.display());

    match cli.command {
        Commands::Split => run_split(&config.split)?,
        Commands::Process { paths } => run_pipeline(&paths.apply(config.pipeline))?,
        Commands::All { paths } => {
            run_split(&config.split)?;
            run_pipeline(&paths.apply(config.pipeline))?;
        }
    }
    Ok(())
}

fn run_split(config: &config::SplitConfig) -> anyhow::Result<()> {
    let summary = split::run_from_paths(config).context("goalkeeper split failed")?;
    println!(
        "split: {} goalkeepers -> {}, {} outfield -> {} ({} dropped without position)",
        summary.goalkeepers,
        config.goalkeepers_path.display(),
        summary.outfield,
        config.outfield_path.display(),
        summary.without_position
    );
    Ok(())
}

fn run_pipeline(config: &PipelineConfig) -> anyhow::Result<()> {
    let report = pipeline::run_from_paths(config).context("feature pipeline failed")?;
    println!(
        "process: {} rows in, {} rows x {} columns out -> {} ({} warnings)",
        report.rows_in,
        report.rows_out,
        report.columns_out,
        config.output_path.display(),
        report.warnings.len()
    );
    Ok(())
}

/// Initialize tracing to stderr so stdout carries only the run summary.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("player_prep=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
