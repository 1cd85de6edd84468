//! View-level queries: value-range aggregation, nearest-series hit testing
//! and day-boundary marks for the renderer's date separators.

use chrono::{Datelike, Local, NaiveDate, TimeZone};

/// Fractional padding applied to each side of the aggregated value range.
pub const RANGE_PAD_FRACTION: f64 = 0.05;

/// Absolute padding used when the range would otherwise have zero height.
pub const DEGENERATE_RANGE_PAD: f64 = 1.0;

/// Maximum normalized vertical distance for a hit, as a fraction of the
/// visible view height.
pub const HIT_TEST_THRESHOLD: f64 = 0.15;

/// Aggregate `[low, high]` over the finite values of all given series.
///
/// Hidden series must be passed too: including them means toggling a series
/// visible never forces a surprise rescale. Returns `None` when the set is
/// empty or holds no finite values. The range is padded by
/// [`RANGE_PAD_FRACTION`] per side, or by [`DEGENERATE_RANGE_PAD`] when
/// min == max.
pub fn y_range<'a>(series: impl IntoIterator<Item = &'a [f64]>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for values in series {
        for &v in values {
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
    }
    if min > max {
        return None;
    }
    if min == max {
        return Some((min - DEGENERATE_RANGE_PAD, max + DEGENERATE_RANGE_PAD));
    }
    let pad = (max - min) * RANGE_PAD_FRACTION;
    Some((min - pad, max + pad))
}

/// Index of the sample nearest to `x` on a sorted axis, clamped to bounds.
/// `None` only for an empty axis.
pub fn nearest_index(time: &[f64], x: f64) -> Option<usize> {
    if time.is_empty() {
        return None;
    }
    let after = time.partition_point(|&t| t < x);
    if after == 0 {
        return Some(0);
    }
    if after >= time.len() {
        return Some(time.len() - 1);
    }
    // Pick whichever neighbor is closer in x.
    if (x - time[after - 1]).abs() <= (time[after] - x).abs() {
        Some(after - 1)
    } else {
        Some(after)
    }
}

/// One candidate series for hit testing. `values` is index-aligned with the
/// time axis.
pub struct HitSeries<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

/// Resolve which series the cursor is closest to, for crosshair feedback.
///
/// Only *visible* series should be passed. For each series the sample nearest
/// to `cursor_x` is found on the shared time axis and the vertical distance
/// to `cursor_y` is normalized by `view_height`; the closest series wins if
/// its distance is strictly below [`HIT_TEST_THRESHOLD`]. Ties keep the
/// earlier series (iteration order = registration order).
pub fn nearest_series<'a>(
    time: &[f64],
    series: impl IntoIterator<Item = HitSeries<'a>>,
    cursor_x: f64,
    cursor_y: f64,
    view_height: f64,
) -> Option<&'a str> {
    if !view_height.is_finite() || view_height <= 0.0 {
        return None;
    }
    let idx = nearest_index(time, cursor_x)?;
    let mut best: Option<(&str, f64)> = None;
    for s in series {
        if s.values.is_empty() {
            continue;
        }
        let v = s.values[idx.min(s.values.len() - 1)];
        if !v.is_finite() {
            continue;
        }
        let dist = (v - cursor_y).abs() / view_height;
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((s.name, dist));
        }
    }
    match best {
        Some((name, dist)) if dist < HIT_TEST_THRESHOLD => Some(name),
        _ => None,
    }
}

/// Local-time midnights covering the axis span: the first boundary at or
/// after the start, through the last at or before the end. Empty for an
/// empty or single-instant axis.
pub fn day_boundaries(time: &[f64]) -> Vec<f64> {
    let (&start, &end) = match (time.first(), time.last()) {
        (Some(s), Some(e)) if s < e => (s, e),
        _ => return Vec::new(),
    };
    let mut marks = Vec::new();
    let mut date = match Local.timestamp_opt(start.floor() as i64, 0).earliest() {
        Some(dt) => NaiveDate::from_ymd_opt(dt.year(), dt.month(), dt.day()),
        None => None,
    };
    while let Some(d) = date {
        let midnight = d
            .and_hms_opt(0, 0, 0)
            .and_then(|ndt| Local.from_local_datetime(&ndt).earliest());
        if let Some(m) = midnight {
            let ts = m.timestamp() as f64;
            if ts > end {
                break;
            }
            if ts >= start {
                marks.push(ts);
            }
        }
        date = d.succ_opt();
    }
    marks
}
