//! Rolling-average smoothing with a bounded memoization cache.
//!
//! Smoothed arrays are memoized under `(column, window)` and evicted
//! least-recently-used beyond a fixed capacity, so interactively dragging a
//! smoothing slider back and forth does not recompute already-seen windows.
//! The cache is cleared wholesale whenever the dataset is replaced.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::data::dataset::Dataset;

/// Maximum number of memoized `(column, window)` entries.
pub const DEFAULT_CACHE_CAPACITY: usize = 128;

type CacheKey = (String, usize);

pub struct SmoothingCache {
    entries: HashMap<CacheKey, Arc<Vec<f64>>>,
    /// LRU order, front = least recently used.
    access_order: VecDeque<CacheKey>,
    capacity: usize,
    computations: usize,
}

impl Default for SmoothingCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SmoothingCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            access_order: VecDeque::new(),
            capacity: capacity.max(1),
            computations: 0,
        }
    }

    /// Smoothed values for `column` at the given window size.
    ///
    /// A window of 1 (or 0) is the identity and bypasses the cache entirely.
    /// Returns `None` for an unknown column.
    pub fn get_smoothed(
        &mut self,
        dataset: &Dataset,
        column: &str,
        window: usize,
    ) -> Option<Arc<Vec<f64>>> {
        let raw = dataset.column(column)?;
        if window <= 1 {
            return Some(Arc::clone(raw));
        }

        let key = (column.to_string(), window);
        if let Some(hit) = self.entries.get(&key) {
            let hit = Arc::clone(hit);
            self.touch(&key);
            return Some(hit);
        }

        let smoothed = Arc::new(rolling_mean(raw, window));
        self.computations += 1;
        self.insert(key, Arc::clone(&smoothed));
        Some(smoothed)
    }

    /// Drop all entries. Called when the dataset is replaced or cleared.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
    }

    /// Number of rolling-mean computations performed so far (cache misses).
    pub fn computations(&self) -> usize {
        self.computations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &CacheKey) {
        self.access_order.retain(|k| k != key);
        self.access_order.push_back(key.clone());
    }

    fn insert(&mut self, key: CacheKey, value: Arc<Vec<f64>>) {
        while self.entries.len() >= self.capacity {
            match self.access_order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.access_order.push_back(key.clone());
        self.entries.insert(key, value);
    }
}

/// Centered rolling mean with minimum period 1.
///
/// The window for index `i` spans `[i - w/2, i + (w-1)/2]`, clamped to the
/// array bounds, so edge positions average over however many samples are
/// available instead of becoming NaN. Missing (NaN) inputs are excluded from
/// the local average; the output is NaN only where the whole window is
/// missing. Output length always equals input length.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    if window <= 1 || n == 0 {
        return values.to_vec();
    }
    let left = window / 2;
    let right = window - 1 - left;

    let mut out = Vec::with_capacity(n);
    let mut sum = 0.0;
    let mut count = 0usize;

    // Prime the window for i = 0: indices 0..=right.
    for &v in values.iter().take(right + 1) {
        if v.is_finite() {
            sum += v;
            count += 1;
        }
    }
    for i in 0..n {
        if i > 0 {
            let entering = i + right;
            if entering < n && values[entering].is_finite() {
                sum += values[entering];
                count += 1;
            }
            if i > left {
                let leaving = i - left - 1;
                if values[leaving].is_finite() {
                    sum -= values[leaving];
                    count -= 1;
                }
            }
        }
        out.push(if count > 0 { sum / count as f64 } else { f64::NAN });
    }
    out
}
