// Configuration loading and parsing (config/pipeline.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_FILE: &str = "pipeline.toml";

/// The shipped configuration, compiled into the binary so a fresh checkout
/// or an installed binary can start without a `defaults/` directory.
pub const DEFAULT_CONFIG: &str = include_str!("../defaults/pipeline.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: String, message: String },

    #[error("failed to write default config to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub split: SplitConfig,
    pub pipeline: PipelineConfig,
}

/// Paths for the goalkeeper / outfield split of the raw export.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    pub source_path: PathBuf,
    pub delimiter: u8,
    pub goalkeepers_path: PathBuf,
    pub outfield_path: PathBuf,
}

/// Parameters passed to the pipeline entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Where to write the extracted Value vector, if anywhere.
    pub side_channel_path: Option<PathBuf>,
    pub delimiter: u8,
}

// ---------------------------------------------------------------------------
// pipeline.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire pipeline.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    split: SplitSection,
    pipeline: PipelineSection,
}

#[derive(Debug, Clone, Deserialize)]
struct SplitSection {
    source: String,
    #[serde(default = "default_split_delimiter")]
    delimiter: String,
    goalkeepers: String,
    outfield: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PipelineSection {
    input: String,
    output: String,
    #[serde(default)]
    side_channel: Option<String>,
    #[serde(default = "default_pipeline_delimiter")]
    delimiter: String,
}

fn default_split_delimiter() -> String {
    ";".into()
}

fn default_pipeline_delimiter() -> String {
    ",".into()
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

pub fn config_path(base_dir: &Path) -> PathBuf {
    base_dir.join("config").join(CONFIG_FILE)
}

/// Load and validate `config/pipeline.toml` relative to `base_dir`.
/// Relative paths inside the file are resolved against `base_dir`.
///
/// A missing file is an error here; [`load_config`] writes the defaults
/// first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(base_dir);
    let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
        path: path.clone(),
        source: e,
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::Parse { path, source: e })?;
    validate(&file)?;

    let resolve = |p: &str| base_dir.join(p);
    Ok(Config {
        split: SplitConfig {
            source_path: resolve(&file.split.source),
            delimiter: parse_delimiter("split.delimiter", &file.split.delimiter)?,
            goalkeepers_path: resolve(&file.split.goalkeepers),
            outfield_path: resolve(&file.split.outfield),
        },
        pipeline: PipelineConfig {
            input_path: resolve(&file.pipeline.input),
            output_path: resolve(&file.pipeline.output),
            side_channel_path: file
                .pipeline
                .side_channel
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(resolve),
            delimiter: parse_delimiter("pipeline.delimiter", &file.pipeline.delimiter)?,
        },
    })
}

/// Write [`DEFAULT_CONFIG`] to `config/pipeline.toml` unless a config file
/// is already there. Returns the path when a file was written.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let path = config_path(base_dir);
    if path.exists() {
        return Ok(None);
    }
    let write_err = |e| ConfigError::Write {
        path: path.clone(),
        source: e,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(write_err)?;
    }
    std::fs::write(&path, DEFAULT_CONFIG).map_err(write_err)?;
    Ok(Some(path))
}

/// Write the defaults if needed, then load the config under `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = ensure_config_file(base_dir)? {
        info!("no config found, wrote defaults to {}", path.display());
    }
    load_config_from(base_dir)
}

/// A delimiter must be exactly one ASCII character.
fn parse_delimiter(field: &str, raw: &str) -> Result<u8, ConfigError> {
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::Invalid {
            field: field.into(),
            message: format!("must be a single ASCII character, got {raw:?}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(file: &ConfigFile) -> Result<(), ConfigError> {
    let required: &[(&str, &str)] = &[
        ("split.source", file.split.source.as_str()),
        ("split.goalkeepers", file.split.goalkeepers.as_str()),
        ("split.outfield", file.split.outfield.as_str()),
        ("pipeline.input", file.pipeline.input.as_str()),
        ("pipeline.output", file.pipeline.output.as_str()),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: field.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    if file.pipeline.input == file.pipeline.output {
        return Err(ConfigError::Invalid {
            field: "pipeline.output".into(),
            message: "must differ from pipeline.input".into(),
        });
    }

    if file.split.goalkeepers == file.split.outfield {
        return Err(ConfigError::Invalid {
            field: "split.outfield".into(),
            message: "must differ from split.goalkeepers".into(),
        });
    }

    if let Some(side) = &file.pipeline.side_channel {
        if *side == file.pipeline.output {
            return Err(ConfigError::Invalid {
                field: "pipeline.side_channel".into(),
                message: "must differ from pipeline.output".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
