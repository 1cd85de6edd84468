pub mod dataset;
pub mod ingest;
pub mod layers;
pub mod query;
pub mod smoothing;
pub mod x_formatter;
