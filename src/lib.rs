//! FilePlot crate root: re-exports and module wiring.
//!
//! This crate is the data and query engine behind an interactive viewer for
//! large delimited time-series files. The rendering layer is external; it
//! consumes this crate's query surface:
//! - `data::ingest`: schema inference and file loading
//! - `data::smoothing`: memoized rolling-average smoothing
//! - `data::layers`: per-series visual state and the layer registry
//! - `data::query`: value-range aggregation, hit testing, day boundaries
//! - `persistence` / `debounce`: per-file settings with debounced writes
//! - `session`: the context object tying everything together

pub mod data;
pub mod debounce;
pub mod persistence;
pub mod session;

// Public re-exports for a compact external API
pub use data::dataset::{Column, ColumnStats, Dataset, TimeAxis, TimeAxisKind};
pub use data::ingest::{load, parse_str, IngestError};
pub use data::layers::{Layer, LayerEvent, LayerRegistry, LayerState, Rgb, PALETTE};
pub use data::query::{day_boundaries, nearest_series, y_range, HitSeries};
pub use data::smoothing::SmoothingCache;
pub use data::x_formatter::TickFormatter;
pub use debounce::DebouncedSave;
pub use persistence::{FileSettings, LayerSettings, SettingsError, SettingsStore};
pub use session::PlotSession;
