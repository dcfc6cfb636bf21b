// src/series/mod.rs
pub mod releases;
pub mod select;
pub mod transform;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};
use tracing::{debug, info, warn};

use crate::error::{NormalizeError, RowIssue};
use crate::process::table::NormalizedTable;
pub use releases::{table_from_releases, Release};
pub use select::{select_values, SelectionMode};

/// Twenty years of quarters.
pub const DEFAULT_WINDOW_QUARTERS: usize = 80;

/// Which growth series the rolling z-score standardizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreTarget {
    #[default]
    QoqSaar,
    Yoy,
}

impl ZScoreTarget {
    pub fn as_str(&self) -> &str {
        match self {
            ZScoreTarget::QoqSaar => "qoq_saar",
            ZScoreTarget::Yoy => "yoy",
        }
    }
}

impl fmt::Display for ZScoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZScoreTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qoq_saar" | "qoq" => Ok(ZScoreTarget::QoqSaar),
            "yoy" => Ok(ZScoreTarget::Yoy),
            other => Err(anyhow::anyhow!(
                "unknown z-score target `{}` (expected `qoq_saar` or `yoy`)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    pub mode: SelectionMode,
    pub window_quarters: usize,
    pub zscore_target: ZScoreTarget,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Latest,
            window_quarters: DEFAULT_WINDOW_QUARTERS,
            zscore_target: ZScoreTarget::QoqSaar,
        }
    }
}

/// One quarter of the derived series. Growth rates are in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub qoq_saar: Option<f64>,
    pub yoy: Option<f64>,
    pub zscore: Option<f64>,
}

/// Selected level plus transforms, one entry per distinct parsed date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VintageSeries {
    pub config: SeriesConfig,
    pub observations: Vec<Observation>,
    /// Non-fatal conditions met while building the series.
    pub issues: Vec<RowIssue>,
}

impl VintageSeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Most recent observation with a defined value.
    pub fn latest(&self) -> Option<&Observation> {
        self.observations.iter().rev().find(|o| o.value.is_some())
    }
}

/// Vintage Selector + Transformer over a normalized table.
#[tracing::instrument(level = "info", skip(table), fields(rows = table.len(), mode = %config.mode))]
pub fn build_series(
    table: &NormalizedTable,
    config: &SeriesConfig,
) -> Result<VintageSeries, NormalizeError> {
    if config.window_quarters == 0 {
        return Err(NormalizeError::InvalidWindow {
            window: config.window_quarters,
        });
    }

    let selected = select_values(table, config.mode);
    let mut issues = Vec::new();
    let mut seen: HashSet<NaiveDate> = HashSet::with_capacity(table.len());
    let mut dates = Vec::with_capacity(table.len());
    let mut levels = Vec::with_capacity(table.len());

    for (record, value) in table.rows().iter().zip(selected) {
        let Some(date) = record.date else {
            issues.push(RowIssue::UnparseableDate {
                source_row: record.source_row,
                token: record.raw_date.clone(),
            });
            continue;
        };
        if !seen.insert(date) {
            debug!(source_row = record.source_row, %date, "duplicate date dropped");
            issues.push(RowIssue::DuplicateDate {
                source_row: record.source_row,
                date,
            });
            continue;
        }
        if value.is_none() {
            issues.push(RowIssue::AllVintagesMissing { date });
        }
        dates.push(date);
        levels.push(value);
    }

    let qoq = transform::qoq_saar(&levels);
    let yoy = transform::yoy(&levels);
    let target = match config.zscore_target {
        ZScoreTarget::QoqSaar => &qoq,
        ZScoreTarget::Yoy => &yoy,
    };
    let zscore = transform::rolling_zscore(target, config.window_quarters)?;

    let observations: Vec<Observation> = (0..dates.len())
        .map(|i| Observation {
            date: dates[i],
            value: levels[i],
            qoq_saar: qoq[i],
            yoy: yoy[i],
            zscore: zscore[i],
        })
        .collect();

    if !issues.is_empty() {
        warn!(issues = issues.len(), "rows excluded or missing in series");
    }
    info!(
        observations = observations.len(),
        zscores = observations.iter().filter(|o| o.zscore.is_some()).count(),
        "built vintage series"
    );

    Ok(VintageSeries {
        config: *config,
        observations,
        issues,
    })
}
