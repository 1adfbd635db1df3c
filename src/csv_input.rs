//! CSV adapter for the command-line tool
//!
//! Reads a header-first comma-separated export into a [`Dataset`] and writes
//! an augmented table back out. One record per line; quoted fields may
//! contain commas and doubled quotes but not line breaks.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{CellValue, Dataset, DatasetError};

#[derive(Debug, Error)]
pub enum CsvInputError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("input has no header row")]
    MissingHeader,

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("failed to write CSV: {0}")]
    Write(#[from] std::io::Error),
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Quote a field only when it needs it.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Parse CSV text into a dataset.
///
/// Blank lines are skipped. Short rows are padded with missing cells; cells
/// beyond the header width are dropped.
pub fn read_dataset<R: BufRead>(reader: R) -> Result<Dataset, CsvInputError> {
    let mut lines = reader.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((idx, line)) => {
                let line = line.map_err(|source| CsvInputError::Read { line: idx + 1, source })?;
                let line = line.trim_start_matches('\u{feff}');
                if !line.trim().is_empty() {
                    break csv_split(line);
                }
            }
            None => return Err(CsvInputError::MissingHeader),
        }
    };
    let header: Vec<String> = header.into_iter().map(|c| c.trim().to_string()).collect();
    let width = header.len();
    let mut dataset = Dataset::new(header)?;

    let mut truncated = 0usize;
    for (idx, line) in lines {
        let line = line.map_err(|source| CsvInputError::Read { line: idx + 1, source })?;
        if line.trim().is_empty() {
            continue;
        }
        let mut cells: Vec<CellValue> = csv_split(&line).iter().map(|f| CellValue::from_raw(f)).collect();
        if cells.len() > width {
            truncated += 1;
            cells.truncate(width);
        }
        cells.resize(width, CellValue::Missing);
        dataset.push_row(cells)?;
    }

    if truncated > 0 {
        warn!(rows = truncated, "Rows wider than the header were truncated");
    }
    debug!(rows = dataset.len(), columns = width, "CSV parsed");
    Ok(dataset)
}

/// Read a CSV file from disk.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Dataset, CsvInputError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CsvInputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_dataset(BufReader::new(file))
}

// ============================================================================
// Writing
// ============================================================================

/// Write a dataset as CSV; missing and non-finite cells become empty fields.
pub fn write_dataset<W: Write>(dataset: &Dataset, mut writer: W) -> Result<(), CsvInputError> {
    let header: Vec<String> = dataset.columns().iter().map(|c| csv_escape(c)).collect();
    writeln!(writer, "{}", header.join(","))?;
    for row in dataset.rows() {
        let fields: Vec<String> = row.iter().map(|cell| csv_escape(&cell.to_string())).collect();
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()?;
    Ok(())
}
