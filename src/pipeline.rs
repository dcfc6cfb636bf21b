use serde::Serialize;

use crate::error::NormalizeError;
use crate::process::{normalize_grid, NormalizedTable, RawGrid};
use crate::series::{build_series, table_from_releases, Release, SeriesConfig, VintageSeries};

/// Everything one run produces: the table for raw display and the derived
/// series for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub table: NormalizedTable,
    pub series: VintageSeries,
}

/// Header Locator → Date Parser → Vintage Selector → Transformer.
/// Either both outputs are produced or an error is returned.
pub fn run(grid: &RawGrid, config: &SeriesConfig) -> Result<PipelineOutput, NormalizeError> {
    let table = normalize_grid(grid)?;
    let series = build_series(&table, config)?;
    Ok(PipelineOutput { table, series })
}

/// Same as [`run`] for release triples from a statistical API.
pub fn run_releases(
    releases: &[Release],
    config: &SeriesConfig,
) -> Result<PipelineOutput, NormalizeError> {
    let table = table_from_releases(releases);
    let series = build_series(&table, config)?;
    Ok(PipelineOutput { table, series })
}
