//! The explorer session: one explicitly constructed context object owning
//! the dataset, layer registry, smoothing cache and settings store.
//!
//! All mutations run on the caller's (single) interaction thread in event
//! order. The only I/O is the settings store's file write, which is kept off
//! the critical path by the debouncer: call [`PlotSession::tick`] from the
//! event loop to let pending saves fire.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::data::dataset::{ColumnStats, Dataset};
use crate::data::ingest::{self, IngestError};
use crate::data::layers::{LayerEvent, LayerRegistry, Rgb};
use crate::data::query::{self, HitSeries};
use crate::data::smoothing::SmoothingCache;
use crate::data::x_formatter::TickFormatter;
use crate::debounce::DebouncedSave;
use crate::persistence::{FileSettings, LayerSettings, SettingsError, SettingsStore};

/// Upper bound of the shared smoothing window.
pub const MAX_SMOOTHING_WINDOW: usize = 500;

pub struct PlotSession {
    dataset: Option<Dataset>,
    file_path: Option<PathBuf>,
    settings_key: Option<String>,
    layers: LayerRegistry,
    cache: SmoothingCache,
    smoothing: usize,
    store: SettingsStore,
    saver: DebouncedSave,
}

impl PlotSession {
    pub fn new(store: SettingsStore) -> Self {
        Self {
            dataset: None,
            file_path: None,
            settings_key: None,
            layers: LayerRegistry::new(),
            cache: SmoothingCache::new(),
            smoothing: 1,
            store,
            saver: DebouncedSave::new(),
        }
    }

    pub fn with_debounce(store: SettingsStore, saver: DebouncedSave) -> Self {
        Self {
            saver,
            ..Self::new(store)
        }
    }

    // ── Loading ──────────────────────────────────────────────────────────────

    /// Load a delimited file. On failure the previous dataset (and its layer
    /// state) stays active. On success any pending debounced save is flushed
    /// first so it still targets the previous file's key, then the registry
    /// is rebuilt from saved settings where available (palette defaults
    /// otherwise, hidden by default).
    pub fn load(&mut self, path: &Path) -> Result<(), IngestError> {
        let dataset = ingest::load(path)?;
        self.flush_pending_save();

        self.cache.clear();
        self.layers.clear();

        let key = self.store.file_key(path);
        let saved = self.store.get(&key).cloned();
        self.smoothing = saved
            .as_ref()
            .map(|s| clamp_smoothing(s.smoothing as usize))
            .unwrap_or(1);

        for name in dataset.column_names() {
            match saved.as_ref().and_then(|s| s.layers.get(name)) {
                Some(ls) => {
                    self.layers
                        .register(name, Some(ls.color), ls.visible, ls.line_width);
                }
                None => {
                    self.layers.register(name, None, false, 1);
                }
            }
        }

        self.file_path = Some(path.to_path_buf());
        self.settings_key = Some(key);
        self.dataset = Some(dataset);
        Ok(())
    }

    /// Drop the loaded dataset and all per-series state, flushing any
    /// pending save for it first.
    pub fn clear(&mut self) {
        self.flush_pending_save();
        self.dataset = None;
        self.file_path = None;
        self.settings_key = None;
        self.cache.clear();
        self.layers.clear();
        self.smoothing = 1;
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.store
    }

    // ── Layer mutations (debounce a save on every effective change) ─────────

    pub fn set_visible(&mut self, name: &str, visible: bool, now: Instant) -> Option<LayerEvent> {
        let event = self.layers.set_visible(name, visible);
        if event.is_some() {
            self.schedule_save(now);
        }
        event
    }

    pub fn set_color(&mut self, name: &str, color: Rgb, now: Instant) -> Option<LayerEvent> {
        let event = self.layers.set_color(name, color);
        if event.is_some() {
            self.schedule_save(now);
        }
        event
    }

    pub fn set_width(&mut self, name: &str, width: u32, now: Instant) -> Option<LayerEvent> {
        let event = self.layers.set_width(name, width);
        if event.is_some() {
            self.schedule_save(now);
        }
        event
    }

    pub fn toggle_all(&mut self, visible: bool, now: Instant) -> Option<LayerEvent> {
        let event = self.layers.toggle_all(visible);
        if event.is_some() {
            self.schedule_save(now);
        }
        event
    }

    // ── Smoothing ────────────────────────────────────────────────────────────

    pub fn smoothing_window(&self) -> usize {
        self.smoothing
    }

    /// Set the shared smoothing window (clamped to 1..=500).
    pub fn set_smoothing_window(&mut self, window: usize, now: Instant) {
        let window = clamp_smoothing(window);
        if window != self.smoothing {
            self.smoothing = window;
            self.schedule_save(now);
        }
    }

    /// Values of a column smoothed at the current window, memoized.
    pub fn get_smoothed(&mut self, column: &str) -> Option<Arc<Vec<f64>>> {
        let dataset = self.dataset.as_ref()?;
        self.cache.get_smoothed(dataset, column, self.smoothing)
    }

    /// Cache misses so far; lets callers observe recomputation behavior.
    pub fn smoothing_computations(&self) -> usize {
        self.cache.computations()
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Padded value range over *all* registered series, hidden ones included,
    /// at the current smoothing. `None` when nothing is registered.
    pub fn y_range(&mut self) -> Option<(f64, f64)> {
        let dataset = self.dataset.as_ref()?;
        let mut series = Vec::with_capacity(self.layers.len());
        for name in self.layers.names() {
            if let Some(values) = self.cache.get_smoothed(dataset, name, self.smoothing) {
                series.push(values);
            }
        }
        query::y_range(series.iter().map(|v| v.as_slice()))
    }

    /// Name of the visible series nearest to the cursor, if within the hit
    /// threshold. `x` is in time-axis units, `y` and `view_height` in value
    /// units.
    pub fn nearest_series(&mut self, x: f64, y: f64, view_height: f64) -> Option<String> {
        let dataset = self.dataset.as_ref()?;
        let visible: Vec<String> = self
            .layers
            .iter()
            .filter(|l| l.visible())
            .map(|l| l.name.clone())
            .collect();
        let mut series = Vec::with_capacity(visible.len());
        for name in &visible {
            if let Some(values) = self.cache.get_smoothed(dataset, name, self.smoothing) {
                series.push((name.as_str(), values));
            }
        }
        query::nearest_series(
            dataset.time_axis().values(),
            series.iter().map(|(name, values)| HitSeries {
                name,
                values: values.as_slice(),
            }),
            x,
            y,
            view_height,
        )
        .map(str::to_string)
    }

    /// Local-midnight marks across the time axis, for date separators.
    /// Empty for index axes, where X values are not timestamps.
    pub fn day_boundaries(&self) -> Vec<f64> {
        match self.dataset.as_ref() {
            Some(ds) if ds.time_axis().is_datetime() => {
                query::day_boundaries(ds.time_axis().values())
            }
            _ => Vec::new(),
        }
    }

    pub fn statistics(&self, column: &str) -> Option<ColumnStats> {
        self.dataset.as_ref()?.statistics(column)
    }

    pub fn tick_formatter(&self) -> TickFormatter {
        match self.dataset.as_ref() {
            Some(ds) => TickFormatter::for_axis(ds.time_axis()),
            None => TickFormatter::new(false),
        }
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    /// Snapshot of the current per-layer styling and smoothing window, in
    /// the persisted schema.
    pub fn current_settings(&self) -> FileSettings {
        let layers = self
            .layers
            .iter()
            .map(|l| {
                (
                    l.name.clone(),
                    LayerSettings {
                        color: l.color,
                        visible: l.visible(),
                        line_width: l.width,
                    },
                )
            })
            .collect();
        FileSettings {
            layers,
            smoothing: self.smoothing as u32,
        }
    }

    /// Drive the debouncer; fires at most one pending write whose quiet
    /// interval has elapsed. Call this periodically from the event loop.
    pub fn tick(&mut self, now: Instant) {
        if let Some((key, settings)) = self.saver.poll(now) {
            self.write_settings(&key, settings);
        }
    }

    /// Persist any pending debounced save immediately (shutdown, file
    /// switch).
    pub fn flush_pending_save(&mut self) {
        if let Some((key, settings)) = self.saver.flush() {
            self.write_settings(&key, settings);
        }
    }

    /// Forget the saved configuration of the current file, including any
    /// pending write for it.
    pub fn reset_settings(&mut self) -> Result<(), SettingsError> {
        match &self.settings_key {
            Some(key) => {
                let key = key.clone();
                if self.saver.pending_key() == Some(key.as_str()) {
                    self.saver.cancel();
                }
                self.store.remove(&key)
            }
            None => Ok(()),
        }
    }

    /// Clear every saved configuration and delete the backing file.
    pub fn reset_all_settings(&mut self) -> Result<(), SettingsError> {
        self.saver.cancel();
        self.store.reset_all()
    }

    fn schedule_save(&mut self, now: Instant) {
        if let Some(key) = &self.settings_key {
            self.saver
                .schedule(key.clone(), self.current_settings(), now);
        }
    }

    fn write_settings(&mut self, key: &str, settings: FileSettings) {
        if let Err(e) = self.store.save(key, settings) {
            log::warn!("failed to save settings for {key}: {e}");
        }
    }
}

fn clamp_smoothing(window: usize) -> usize {
    window.clamp(1, MAX_SMOOTHING_WINDOW)
}
