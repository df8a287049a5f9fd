//! Linear trend forecaster
//!
//! Ordinary least squares of close on calendar-day index. The forecast
//! uncertainty is the standard error of a new observation,
//!
//! s · √(1 + 1/n + (x − x̄)² / Sxx)
//!
//! which widens the further the forecast day sits from the fitted data.

use crate::core::{PriceBar, ProjectionError, ProjectionResult, TrendForecast, TrendPoint};

use super::trend::TrendForecaster;

/// Minimum closes for a fit with a residual variance
const MIN_OBSERVATIONS: usize = 3;

/// Fitted line `close = intercept + slope · x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Residual standard deviation (n − 2 degrees of freedom)
    pub residual_std: f64,
    pub n: usize,
    pub x_mean: f64,
    pub sxx: f64,
}

impl LinearFit {
    /// Fit by ordinary least squares
    pub fn fit(xs: &[f64], ys: &[f64]) -> ProjectionResult<Self> {
        let n = xs.len();
        if n != ys.len() {
            return Err(ProjectionError::invalid_input("x and y lengths differ"));
        }
        if n < MIN_OBSERVATIONS {
            return Err(ProjectionError::trend_unavailable(format!(
                "need at least {} closes for a trend, got {}",
                MIN_OBSERVATIONS, n
            )));
        }

        let nf = n as f64;
        let x_mean = xs.iter().sum::<f64>() / nf;
        let y_mean = ys.iter().sum::<f64>() / nf;
        let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (x - x_mean) * (y - y_mean))
            .sum();

        if sxx <= 0.0 {
            return Err(ProjectionError::trend_unavailable(
                "closes share a single date, slope is undefined",
            ));
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let sse: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| (y - intercept - slope * x).powi(2))
            .sum();
        let residual_std = (sse / (nf - 2.0)).sqrt();

        Ok(Self {
            intercept,
            slope,
            residual_std,
            n,
            x_mean,
            sxx,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Standard error of a new observation at `x`
    pub fn prediction_std(&self, x: f64) -> f64 {
        let leverage = 1.0 / self.n as f64 + (x - self.x_mean).powi(2) / self.sxx;
        self.residual_std * (1.0 + leverage).sqrt()
    }
}

/// Trend forecaster backed by a straight-line fit
#[derive(Debug, Clone, Copy)]
pub struct LinearTrendForecaster {
    /// Multiplier on the prediction standard error
    pub uncertainty_scale: f64,
}

impl LinearTrendForecaster {
    pub fn new() -> Self {
        Self {
            uncertainty_scale: 1.0,
        }
    }

    pub fn with_uncertainty_scale(uncertainty_scale: f64) -> Self {
        Self { uncertainty_scale }
    }
}

impl Default for LinearTrendForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendForecaster for LinearTrendForecaster {
    fn forecast(&self, closes: &[PriceBar], horizon_days: u32) -> ProjectionResult<TrendForecast> {
        let first = closes
            .first()
            .ok_or_else(|| ProjectionError::trend_unavailable("no closes to fit"))?;

        let xs: Vec<f64> = closes
            .iter()
            .map(|bar| (bar.date - first.date).num_days() as f64)
            .collect();
        let ys: Vec<f64> = closes.iter().map(|bar| bar.close).collect();
        if ys.iter().any(|y| !y.is_finite()) {
            return Err(ProjectionError::trend_unavailable("non-finite close in history"));
        }

        let fit = LinearFit::fit(&xs, &ys)?;
        let last_x = xs.last().copied().unwrap_or(0.0);

        tracing::debug!(
            "Linear trend: slope {:.4}/day, residual std {:.4} over {} closes",
            fit.slope,
            fit.residual_std,
            fit.n
        );

        let points = (0..=horizon_days)
            .map(|d| {
                let x = last_x + d as f64;
                TrendPoint::new(
                    fit.predict(x),
                    self.uncertainty_scale * fit.prediction_std(x),
                )
            })
            .collect();

        Ok(TrendForecast::new(points))
    }
}
