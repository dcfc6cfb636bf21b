//! Quarterly growth transforms over a date-sorted level series.
//!
//! Every function is a pure map from the input slice to an output of the same
//! length. Missing inputs propagate as missing outputs.

use crate::error::NormalizeError;

/// Quarter-over-quarter growth compounded to an annual rate, in percent:
/// `((l[t] / l[t-1])^4 - 1) * 100`.
pub fn qoq_saar(levels: &[Option<f64>]) -> Vec<Option<f64>> {
    ratio_change(levels, 1, |r| (r.powi(4) - 1.0) * 100.0)
}

/// Year-over-year percent change: `100 * (l[t] / l[t-4] - 1)`.
pub fn yoy(levels: &[Option<f64>]) -> Vec<Option<f64>> {
    ratio_change(levels, 4, |r| 100.0 * (r - 1.0))
}

fn ratio_change(levels: &[Option<f64>], lag: usize, f: impl Fn(f64) -> f64) -> Vec<Option<f64>> {
    (0..levels.len())
        .map(|t| {
            let prev = levels.get(t.checked_sub(lag)?).copied().flatten()?;
            let cur = levels[t]?;
            if prev == 0.0 {
                return None;
            }
            Some(f(cur / prev)).filter(|v| v.is_finite())
        })
        .collect()
}

/// Rolling z-score over the trailing `window` values, population standard
/// deviation (divisor `window`). Defined only when all `window` values ending
/// at `t` are present. A flat window has zero spread and scores `0.0`.
pub fn rolling_zscore(
    values: &[Option<f64>],
    window: usize,
) -> Result<Vec<Option<f64>>, NormalizeError> {
    if window == 0 {
        return Err(NormalizeError::InvalidWindow { window });
    }

    Ok((0..values.len())
        .map(|t| {
            let start = (t + 1).checked_sub(window)?;
            let win: Vec<f64> = values[start..=t].iter().copied().collect::<Option<_>>()?;
            Some(zscore_last(&win))
        })
        .collect())
}

fn zscore_last(win: &[f64]) -> f64 {
    let n = win.len() as f64;
    let mean = win.iter().sum::<f64>() / n;
    let var = win.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    // rounding noise on a flat window is not spread; the bound is relative so
    // small-magnitude series keep their real spread
    if std <= f64::EPSILON * mean.abs() {
        return 0.0;
    }
    (win[win.len() - 1] - mean) / std
}
