use anyhow::{Context, Result};
use std::{env, path::PathBuf};
use tokio::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};
use vintagekit::{
    config::Config,
    export,
    fetch::{self, CachedFetcher, Fetch, FileFetcher, HttpFetcher},
    pipeline,
    process,
};

async fn load_source(cfg: &Config) -> Result<Vec<u8>> {
    if fetch::is_remote(&cfg.source) {
        let fetcher = CachedFetcher::new(HttpFetcher::default(), cfg.cache_ttl());
        fetcher.fetch(&cfg.source).await
    } else {
        FileFetcher::default().fetch(&cfg.source).await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("VINTAGE_CONFIG").ok())
        .map(PathBuf::from);
    let cfg = Config::load(config_path.as_deref())?;
    info!(
        source = %cfg.source,
        mode = %cfg.mode,
        window = cfg.window_quarters,
        zscore_target = %cfg.zscore_target,
        "configured"
    );

    // ─── 3) fetch & decode ───────────────────────────────────────────
    let start = Instant::now();
    let bytes = load_source(&cfg)
        .await
        .with_context(|| format!("loading {}", cfg.source))?;
    let grid = process::load_grid(&bytes).with_context(|| format!("decoding {}", cfg.source))?;
    info!(rows = grid.len(), bytes = bytes.len(), elapsed = ?start.elapsed(), "loaded grid");

    // ─── 4) normalize + transform ────────────────────────────────────
    let out = pipeline::run(&grid, &cfg.series())?;
    for issue in out.series.issues.iter().take(10) {
        warn!(?issue, "row issue");
    }

    // ─── 5) export ───────────────────────────────────────────────────
    if let Some(path) = &cfg.parquet_out {
        export::write_parquet(&out.series, path)?;
    }
    if let Some(path) = &cfg.json_out {
        export::write_json(&out.series, path)?;
    }

    // ─── 6) summary ──────────────────────────────────────────────────
    let tail = out.series.observations.len().saturating_sub(4);
    for o in &out.series.observations[tail..] {
        info!(
            date = %o.date,
            value = ?o.value,
            qoq_saar = ?o.qoq_saar,
            yoy = ?o.yoy,
            zscore = ?o.zscore,
            "observation"
        );
    }
    info!(
        vintages = out.table.vintage_columns().len(),
        observations = out.series.len(),
        issues = out.series.issues.len(),
        elapsed = ?start.elapsed(),
        "all done"
    );
    Ok(())
}
