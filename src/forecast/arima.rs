//! ARIMA(p, d, 0) by conditional least squares.
//!
//! The series is differenced `d` times, then an AR(p) model with intercept is
//! fitted by OLS on the lagged values:
//!
//! ```text
//! w_t = c + φ_1 w_{t-1} + ... + φ_p w_{t-p} + ε_t,   w = Δ^d y
//! ```
//!
//! Forecasts are produced recursively on `w` and integrated back to the level
//! of `y`. There is no MA term and no likelihood refinement.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use crate::align::month_end;
use crate::domain::{ForecastConfig, MergedTable};
use crate::error::AppError;
use crate::forecast::ols::{lag_design, residual_sse, solve_least_squares};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArimaFit {
    pub p: usize,
    pub d: usize,
    pub intercept: f64,
    /// AR coefficients, lag 1 first.
    pub ar: Vec<f64>,
    /// Residual variance (SSE / degrees of freedom).
    pub sigma2: f64,
    /// Observations used in the regression (after differencing and lags).
    pub n_obs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutput {
    pub field: String,
    pub fit: ArimaFit,
    pub points: Vec<ForecastPoint>,
}

/// First difference.
pub fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Minimum number of observations needed for ARIMA(p, d, 0).
pub fn min_observations(p: usize, d: usize) -> usize {
    // p lags consumed, p + 1 parameters, at least one residual degree of freedom.
    d + 2 * p + 2
}

/// Fit ARIMA(p, d, 0) to `values` (oldest first).
pub fn fit_arima(values: &[f64], p: usize, d: usize) -> Result<ArimaFit, AppError> {
    let needed = min_observations(p, d);
    if values.len() < needed {
        return Err(AppError::new(
            3,
            format!(
                "ARIMA({p},{d},0) needs at least {needed} observations, got {}.",
                values.len()
            ),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(3, "Non-finite value in forecast input."));
    }

    let mut w = values.to_vec();
    for _ in 0..d {
        w = difference(&w);
    }

    let (x, y) = lag_design(&w, p);
    let beta = solve_least_squares(&x, &y)
        .ok_or_else(|| AppError::new(3, "ARIMA regression is too ill-conditioned to solve."))?;

    let rows = y.len();
    let sigma2 = residual_sse(&x, &y, &beta) / (rows - (p + 1)) as f64;

    Ok(ArimaFit {
        p,
        d,
        intercept: beta[0],
        ar: beta.iter().skip(1).copied().collect(),
        sigma2,
        n_obs: rows,
    })
}

impl ArimaFit {
    /// Forecast `horizon` steps past the end of `history` (the fitted series).
    pub fn forecast(&self, history: &[f64], horizon: usize) -> Vec<f64> {
        // levels[k] = Δ^k history
        let mut levels = vec![history.to_vec()];
        for k in 0..self.d {
            let next = difference(&levels[k]);
            levels.push(next);
        }

        let mut w = levels[self.d].clone();
        let start = w.len();
        for _ in 0..horizon {
            let n = w.len();
            let mut next = self.intercept;
            for (j, phi) in self.ar.iter().enumerate() {
                next += phi * w[n - 1 - j];
            }
            w.push(next);
        }
        let mut out: Vec<f64> = w[start..].to_vec();

        for k in (0..self.d).rev() {
            let mut acc = levels[k].last().copied().unwrap_or(0.0);
            for v in out.iter_mut() {
                acc += *v;
                *v = acc;
            }
        }

        out
    }
}

/// Month end following the month of `date`.
fn next_month_end(date: NaiveDateTime) -> Result<NaiveDateTime, AppError> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    Ok(month_end(year, month)?.and_time(chrono::NaiveTime::MIN))
}

/// Fit and forecast one field of a monthly table.
///
/// Gaps in the field are skipped; forecast dates continue at month ends after
/// the last observation.
pub fn forecast_field(table: &MergedTable, config: &ForecastConfig) -> Result<ForecastOutput, AppError> {
    if !table.fields().iter().any(|f| f == &config.field) {
        return Err(AppError::new(
            2,
            format!(
                "Unknown forecast field '{}'. Available: {}.",
                config.field,
                table.fields().join(", ")
            ),
        ));
    }

    let column = table.column(&config.field);
    let values: Vec<f64> = column.iter().map(|(_, v)| *v).collect();
    let fit = fit_arima(&values, config.ar_order, config.diff_order)?;
    info!(
        field = %config.field,
        p = fit.p,
        d = fit.d,
        n_obs = fit.n_obs,
        sigma2 = fit.sigma2,
        "ARIMA fitted"
    );

    let steps = fit.forecast(&values, config.horizon);

    let mut points = Vec::with_capacity(steps.len());
    let mut date = column
        .last()
        .map(|(d, _)| *d)
        .ok_or_else(|| AppError::new(3, "Nothing to forecast."))?;
    for value in steps {
        date = next_month_end(date)?;
        points.push(ForecastPoint { date, value });
    }

    Ok(ForecastOutput {
        field: config.field.clone(),
        fit,
        points,
    })
}
