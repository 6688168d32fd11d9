// The player record table, held as a polars DataFrame.
//
// Every pipeline stage takes the frame by mutable reference and rewrites
// columns in place or appends derived ones. Rows are only ever removed,
// never added. The helpers here turn polars lookups into the crate's
// Schema / Parse errors so stages can report the offending column and row.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::io::{Cursor, Write};
use std::path::Path;

/// True for the literal `nan` marker older exports write for missing values.
pub fn is_nan_marker(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("nan")
}

// ---------------------------------------------------------------------------
// Column access
// ---------------------------------------------------------------------------

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

/// Look up a column, reporting a missing one as a schema error.
pub fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| PipelineError::schema(name))
}

/// True when a raw field carries no value: blank or a `nan` marker.
pub fn is_absent(raw: &str) -> bool {
    raw.trim().is_empty() || is_nan_marker(raw)
}

/// Text view of a column. Nulls, blank fields, NaN floats and `nan` markers
/// all come back as `None`; numeric columns are rendered with polars'
/// string cast.
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let as_text = column(df, name)?.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .map(|v| v.filter(|s| !is_absent(s)).map(str::to_string))
        .collect())
}

/// Numeric view of a column. String columns must hold numbers throughout;
/// anything else is a parse error. NaN comes back as `None`.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = column(df, name)?;
    if col.dtype() == &DataType::String {
        return map_text(df, name, |row, raw| {
            raw.trim().parse::<f64>().map_err(|_| {
                PipelineError::parse(name, row, raw, "column is not numeric")
            })
        })
        .map(|values| {
            values
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect()
        });
    }
    let as_float = col.cast(&DataType::Float64)?;
    Ok(as_float
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Integer view of a column that a stage has already normalized to `i64`.
pub fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let col = column(df, name)?;
    let ints = col.i64().map_err(|_| {
        PipelineError::parse(name, 0, col.dtype().to_string(), "column is not an integer column")
    })?;
    Ok(ints.into_iter().collect())
}

/// Apply `f` to every present value of a text column. Absent values stay
/// `None` without calling `f`.
pub fn map_text<T, F>(df: &DataFrame, name: &str, mut f: F) -> Result<Vec<Option<T>>>
where
    F: FnMut(usize, &str) -> Result<T>,
{
    text_values(df, name)?
        .iter()
        .enumerate()
        .map(|(row, value)| value.as_deref().map(|raw| f(row, raw)).transpose())
        .collect()
}

/// Append a column, or replace an existing column with the same name in
/// place. The column must match the frame's height.
pub fn set_column(df: &mut DataFrame, series: Series) -> Result<()> {
    if df.width() > 0 && series.len() != df.height() {
        return Err(PipelineError::Length {
            column: series.name().to_string(),
            expected: df.height(),
            found: series.len(),
        });
    }
    df.with_column(series)?;
    Ok(())
}

/// Keep only the rows whose entry in `keep` is true. Returns the number of
/// rows removed.
pub fn retain_rows(df: &mut DataFrame, keep: &[bool]) -> Result<usize> {
    if keep.len() != df.height() {
        return Err(PipelineError::Length {
            column: "row mask".into(),
            expected: df.height(),
            found: keep.len(),
        });
    }
    let before = df.height();
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    *df = df.filter(&mask)?;
    Ok(before - df.height())
}

/// Remove every named column that is present. Returns the names that were
/// actually dropped.
pub fn drop_columns(df: &mut DataFrame, names: &[&str]) -> Result<Vec<String>> {
    let mut dropped = Vec::new();
    for name in names {
        if has_column(df, name) {
            df.drop_in_place(name)?;
            dropped.push(name.to_string());
        }
    }
    Ok(dropped)
}

// ---------------------------------------------------------------------------
// CSV I/O
// ---------------------------------------------------------------------------

fn csv_options(delimiter: u8) -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_separator(delimiter))
}

/// Give unlabelled index columns the name a dataframe library would give
/// them on re-read (`Unnamed: <i>`).
fn name_unlabelled_columns(df: &mut DataFrame) -> Result<()> {
    for (i, name) in column_names(df).into_iter().enumerate() {
        if name.trim().is_empty() || name == format!("column_{}", i + 1) {
            df.rename(&name, format!("Unnamed: {i}").into())?;
        }
    }
    Ok(())
}

/// Read a delimited table with a header row from memory.
pub fn read_csv(data: &[u8], delimiter: u8) -> Result<DataFrame> {
    let mut df = csv_options(delimiter)
        .into_reader_with_file_handle(Cursor::new(data.to_vec()))
        .finish()?;
    name_unlabelled_columns(&mut df)?;
    Ok(df)
}

/// Write the table with a header row. Nulls are written as empty fields.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W, delimiter: u8) -> Result<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(delimiter)
        .finish(df)?;
    Ok(())
}

/// Load a table from a file on disk.
pub fn load(path: &Path, delimiter: u8) -> Result<DataFrame> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut df = csv_options(delimiter)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| PipelineError::Frame {
            path: path.display().to_string(),
            source: e,
        })?;
    name_unlabelled_columns(&mut df)?;
    Ok(df)
}

/// Write the table to a file on disk, replacing any existing file.
pub fn save(df: &mut DataFrame, path: &Path, delimiter: u8) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| PipelineError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    CsvWriter::new(file)
        .include_header(true)
        .with_separator(delimiter)
        .finish(df)
        .map_err(|e| PipelineError::Frame {
            path: path.display().to_string(),
            source: e,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
