//! X-axis tick labels and cursor readouts.
//!
//! Timestamp axes adapt the tick format to the zoom level (tick spacing):
//! dates when ticks are more than a day apart, date + time above an hour,
//! time-of-day otherwise. Index axes fall back to plain decimal rendering.

use chrono::{Local, TimeZone};

use crate::data::dataset::TimeAxis;

/// Tick spacing (seconds) above which only the calendar date is shown.
const DAY_SPACING: f64 = 86_400.0;
/// Tick spacing (seconds) above which date and time are shown.
const HOUR_SPACING: f64 = 3_600.0;

/// Formats X values for ticks and the crosshair readout.
#[derive(Debug, Clone, Copy)]
pub struct TickFormatter {
    datetime: bool,
}

impl TickFormatter {
    pub fn new(datetime: bool) -> Self {
        Self { datetime }
    }

    /// Pick the formatter matching an axis.
    pub fn for_axis(axis: &TimeAxis) -> Self {
        Self {
            datetime: axis.is_datetime(),
        }
    }

    /// Label for a tick at `value`, given the spacing between ticks in axis
    /// units (drives the datetime granularity).
    pub fn tick_label(&self, value: f64, spacing: f64) -> String {
        if !self.datetime {
            return format_plain(value);
        }
        match local_datetime(value) {
            Some(dt) => {
                let fmt = if spacing > DAY_SPACING {
                    "%Y-%m-%d"
                } else if spacing > HOUR_SPACING {
                    "%m-%d %H:%M"
                } else {
                    "%H:%M:%S"
                };
                dt.format(fmt).to_string()
            }
            None => format_plain(value),
        }
    }

    /// Crosshair readout, e.g. `x=2024-01-15 13:45:30, y=1.23`.
    pub fn cursor_label(&self, x: f64, y: f64) -> String {
        let x_str = if self.datetime {
            match local_datetime(x) {
                Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                None => format_plain(x),
            }
        } else {
            format_plain(x)
        };
        format!("x={x_str}, y={y:.2}")
    }
}

fn local_datetime(value: f64) -> Option<chrono::DateTime<Local>> {
    if !value.is_finite() {
        return None;
    }
    Local.timestamp_opt(value.floor() as i64, 0).earliest()
}

fn format_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}
