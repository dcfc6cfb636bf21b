// src/config.rs

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

use crate::fetch::cache::DEFAULT_TTL;
use crate::series::{SelectionMode, SeriesConfig, ZScoreTarget, DEFAULT_WINDOW_QUARTERS};

/// Runtime settings. Every field has a default, so `{}` parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL or local path of the vintage file (xlsx/xls workbook, CSV, or a ZIP
    /// holding a CSV).
    /// There is no default; it must come from the file or `VINTAGE_SOURCE`.
    pub source: String,
    pub mode: SelectionMode,
    pub window_quarters: usize,
    pub zscore_target: ZScoreTarget,
    pub cache_ttl_secs: u64,
    pub parquet_out: Option<PathBuf>,
    pub json_out: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: String::new(),
            mode: SelectionMode::Latest,
            window_quarters: DEFAULT_WINDOW_QUARTERS,
            zscore_target: ZScoreTarget::QoqSaar,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            parquet_out: Some(PathBuf::from("output/series.parquet")),
            json_out: None,
        }
    }
}

impl Config {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing config YAML")
    }

    /// Load `path` if given, else defaults; then apply environment overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let text =
                    fs::read_to_string(p).with_context(|| format!("reading config {:?}", p))?;
                info!(path = %p.display(), "loaded config");
                Self::from_yaml(&text).with_context(|| format!("in {:?}", p))?
            }
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        cfg.apply_overrides(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `VINTAGE_*` overrides. `lookup` is `env::var` outside of tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("VINTAGE_SOURCE") {
            self.source = v;
        }
        if let Some(v) = lookup("VINTAGE_MODE") {
            self.mode = v.parse()?;
        }
        if let Some(v) = lookup("VINTAGE_WINDOW") {
            self.window_quarters = v
                .trim()
                .parse()
                .with_context(|| format!("VINTAGE_WINDOW must be an integer, got `{}`", v))?;
        }
        if let Some(v) = lookup("VINTAGE_ZSCORE_TARGET") {
            self.zscore_target = v.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_quarters == 0 {
            return Err(anyhow!("window_quarters must be at least 1"));
        }
        if self.source.trim().is_empty() {
            return Err(anyhow!(
                "no source configured: set `source` in the config file or VINTAGE_SOURCE"
            ));
        }
        Ok(())
    }

    pub fn series(&self) -> SeriesConfig {
        SeriesConfig {
            mode: self.mode,
            window_quarters: self.window_quarters,
            zscore_target: self.zscore_target,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
