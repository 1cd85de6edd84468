//! Schema inference and ingestion of delimited time-series files.
//!
//! The loader samples a fixed-size prefix of the file to pick the field
//! separator and decimal convention (`;` with decimal comma for European
//! exports, otherwise `,` with decimal point), parses the whole file, and
//! classifies every column as either the time column or a numeric series.
//! Non-numeric, non-time columns are dropped from the plottable set.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::data::dataset::{Column, Dataset, TimeAxis};

/// Number of bytes sampled from the start of the file for format detection.
const SAMPLE_BYTES: usize = 4096;

/// Case-insensitive substrings that mark a column as time-like. German
/// equivalents are included because the format is common in European exports.
const TIME_TOKENS: [&str; 5] = ["datum", "date", "time", "timestamp", "uhrzeit"];

/// Errors that abort a load attempt. The previously loaded dataset (if any)
/// stays active in the session when one of these is returned.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is empty")]
    EmptyFile { path: String },
    #[error("invalid delimited data in {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path} contains no data rows")]
    NoRows { path: String },
    #[error("{path} contains no numeric columns")]
    NoNumericColumns { path: String },
}

/// Detected field separator and decimal convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFormat {
    pub delimiter: u8,
    pub decimal_comma: bool,
}

/// Pick separator and decimal convention from a sample of the content.
///
/// More semicolons than commas means a European export (`;`-separated with
/// `,` as the decimal point); anything else is treated as standard CSV.
pub fn detect_format(sample: &str) -> FileFormat {
    let semicolons = sample.matches(';').count();
    let commas = sample.matches(',').count();
    if semicolons > commas {
        FileFormat {
            delimiter: b';',
            decimal_comma: true,
        }
    } else {
        FileFormat {
            delimiter: b',',
            decimal_comma: false,
        }
    }
}

/// Load a delimited file from disk into a [`Dataset`].
pub fn load(path: &Path) -> Result<Dataset, IngestError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: display.clone(),
        source,
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or(display);
    parse_str(&content, &filename)
}

/// Parse already-read file content. Split out of [`load`] so that tests and
/// in-memory callers can feed content directly.
pub fn parse_str(content: &str, filename: &str) -> Result<Dataset, IngestError> {
    if content.trim().is_empty() {
        return Err(IngestError::EmptyFile {
            path: filename.to_string(),
        });
    }

    let mut sample_end = SAMPLE_BYTES.min(content.len());
    while !content.is_char_boundary(sample_end) {
        sample_end -= 1;
    }
    let format = detect_format(&content[..sample_end]);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| IngestError::Malformed {
            path: filename.to_string(),
            source,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<csv::StringRecord> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Malformed {
            path: filename.to_string(),
            source,
        })?;
        rows.push(record);
    }
    if rows.is_empty() {
        return Err(IngestError::NoRows {
            path: filename.to_string(),
        });
    }

    // Column classification: the first time-like header becomes the time
    // column, further time-like headers (e.g. a separate time-of-day column
    // next to a date column) are dropped entirely.
    let mut time_column: Option<usize> = None;
    let mut candidates: Vec<usize> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        let lower = name.to_lowercase();
        if TIME_TOKENS.iter().any(|t| lower.contains(t)) {
            if time_column.is_none() {
                time_column = Some(idx);
            }
            continue;
        }
        candidates.push(idx);
    }

    let mut columns: Vec<Column> = Vec::new();
    for &idx in &candidates {
        if let Some(values) = probe_numeric(&rows, idx, format) {
            columns.push(Column {
                name: headers[idx].clone(),
                values: Arc::new(values),
            });
        }
    }
    if columns.is_empty() {
        return Err(IngestError::NoNumericColumns {
            path: filename.to_string(),
        });
    }

    let time = derive_time_axis(&rows, time_column);

    log::info!(
        "loaded {}: {} rows, {} numeric columns, time axis: {:?}",
        filename,
        rows.len(),
        columns.len(),
        time.kind()
    );

    Ok(Dataset::new(filename.to_string(), time, columns))
}

/// Returns the parsed values when every non-empty cell of the column is
/// numeric under the detected decimal convention; `None` drops the column.
/// Empty cells and explicit NaN markers become missing values.
fn probe_numeric(rows: &[csv::StringRecord], idx: usize, format: FileFormat) -> Option<Vec<f64>> {
    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let cell = row.get(idx).unwrap_or("").trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
            values.push(f64::NAN);
            continue;
        }
        values.push(parse_number(cell, format)?);
    }
    Some(values)
}

fn parse_number(cell: &str, format: FileFormat) -> Option<f64> {
    if format.decimal_comma {
        cell.replace(',', ".").parse().ok()
    } else {
        cell.parse().ok()
    }
}

/// Build the time axis: fractional Unix seconds when the time column parses
/// cleanly, otherwise the 0-based row index.
///
/// The fallback also covers partially-parsable and out-of-order time columns,
/// which keeps the non-decreasing axis invariant without guessing values.
fn derive_time_axis(rows: &[csv::StringRecord], time_column: Option<usize>) -> TimeAxis {
    let idx = match time_column {
        Some(idx) => idx,
        None => return TimeAxis::index(rows.len()),
    };
    let mut timestamps = Vec::with_capacity(rows.len());
    for row in rows {
        let cell = row.get(idx).unwrap_or("").trim();
        match parse_datetime(cell) {
            Some(ts) => timestamps.push(ts),
            None => {
                log::debug!("time column value {:?} did not parse, using row index", cell);
                return TimeAxis::index(rows.len());
            }
        }
    }
    let non_decreasing = timestamps.windows(2).all(|w| w[0] <= w[1]);
    if non_decreasing {
        TimeAxis::timestamps(timestamps)
    } else {
        log::debug!("time column is not sorted, using row index");
        TimeAxis::index(rows.len())
    }
}

/// Parse one timestamp cell to fractional Unix seconds. Naive datetimes are
/// interpreted as UTC, matching how the original data was exported.
fn parse_datetime(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.timestamp_micros() as f64 * 1e-6);
    }
    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(cell, fmt) {
            return Some(ndt.and_utc().timestamp_micros() as f64 * 1e-6);
        }
    }
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cell, fmt) {
            let ndt = date.and_hms_opt(0, 0, 0)?;
            return Some(ndt.and_utc().timestamp_micros() as f64 * 1e-6);
        }
    }
    None
}
