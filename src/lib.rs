//! Vintage-aware quarterly series extraction for macroeconomic real-time data.
//!
//! Raw spreadsheet grid → [`process::normalize_grid`] → [`series::build_series`].
//! Fetching, caching and export sit around the core in [`fetch`] and [`export`].

pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod series;

pub use error::{NormalizeError, RowIssue};
pub use pipeline::{run, run_releases, PipelineOutput};
pub use process::{normalize_grid, Cell, NormalizedTable, RawGrid};
pub use series::{build_series, SelectionMode, SeriesConfig, VintageSeries, ZScoreTarget};
