//! Dataset: the typed result of loading a delimited time-series file.
//!
//! A [`Dataset`] is created once per file load by [`crate::data::ingest`] and
//! replaced wholesale on the next load; it is never partially mutated. All
//! numeric columns share the row count of the time axis.

use std::collections::HashMap;
use std::sync::Arc;

/// How the X values of a dataset should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAxisKind {
    /// Fractional seconds since the UNIX epoch, parsed from a time column.
    Timestamps,
    /// Sequential 0-based row index (no usable time column was found).
    Index,
}

/// The X axis of a dataset: a non-decreasing sequence of `f64` values.
#[derive(Debug, Clone)]
pub struct TimeAxis {
    values: Vec<f64>,
    kind: TimeAxisKind,
}

impl TimeAxis {
    /// Build an axis of fractional Unix timestamps. The caller guarantees the
    /// sequence is non-decreasing.
    pub(crate) fn timestamps(values: Vec<f64>) -> Self {
        Self {
            values,
            kind: TimeAxisKind::Timestamps,
        }
    }

    /// Build a sequential index axis 0..n.
    pub(crate) fn index(n: usize) -> Self {
        Self {
            values: (0..n).map(|i| i as f64).collect(),
            kind: TimeAxisKind::Index,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn kind(&self) -> TimeAxisKind {
        self.kind
    }

    /// `true` when the values are wall-clock timestamps rather than indices.
    pub fn is_datetime(&self) -> bool {
        self.kind == TimeAxisKind::Timestamps
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One plottable numeric column. Missing entries are NaN.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Arc<Vec<f64>>,
}

/// Basic statistics over the non-missing values of a column.
///
/// All fields are NaN when the column holds no finite values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

/// An immutable, fully-loaded tabular time series.
#[derive(Debug)]
pub struct Dataset {
    filename: String,
    time: TimeAxis,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
}

impl Dataset {
    /// Invariant: every column has the same length as `time`.
    pub(crate) fn new(filename: String, time: TimeAxis, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == time.len()));
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            filename,
            time,
            columns,
            by_name,
        }
    }

    /// The file name (without directory) this dataset was loaded from.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn row_count(&self) -> usize {
        self.time.len()
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    /// Numeric column names in file order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Raw values of a column, or `None` for an unknown name.
    pub fn column(&self, name: &str) -> Option<&Arc<Vec<f64>>> {
        self.by_name.get(name).map(|&i| &self.columns[i].values)
    }

    /// Min/max/mean/std over the finite values of a column.
    pub fn statistics(&self, name: &str) -> Option<ColumnStats> {
        let values = self.column(name)?;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut n = 0usize;
        for &v in values.iter() {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
                sum += v;
                n += 1;
            }
        }
        if n == 0 {
            return Some(ColumnStats {
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                std: f64::NAN,
            });
        }
        let mean = sum / n as f64;
        // Sample standard deviation (ddof = 1), NaN for a single value.
        let std = if n > 1 {
            let ssq: f64 = values
                .iter()
                .filter(|v| v.is_finite())
                .map(|&v| (v - mean) * (v - mean))
                .sum();
            (ssq / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };
        Some(ColumnStats {
            min,
            max,
            mean,
            std,
        })
    }
}
