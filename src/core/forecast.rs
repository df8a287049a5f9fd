//! Forecast mode selection and trend forecast input

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, ProjectionResult};

/// Which model(s) produce the fan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    /// Options-implied lognormal projection only
    ImpliedVolatility,
    /// Trend forecast with its own uncertainty only
    TrendExtrapolation,
    /// Implied-volatility spread re-centered on the trend
    Aggregate,
}

impl ForecastMode {
    pub const ALL: [ForecastMode; 3] = [
        ForecastMode::ImpliedVolatility,
        ForecastMode::TrendExtrapolation,
        ForecastMode::Aggregate,
    ];

    /// Map the legacy integer codes (0, 1, 2)
    pub fn from_code(code: i64) -> ProjectionResult<Self> {
        match code {
            0 => Ok(ForecastMode::ImpliedVolatility),
            1 => Ok(ForecastMode::TrendExtrapolation),
            2 => Ok(ForecastMode::Aggregate),
            other => Err(ProjectionError::InvalidMode(other.to_string())),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ForecastMode::ImpliedVolatility => 0,
            ForecastMode::TrendExtrapolation => 1,
            ForecastMode::Aggregate => 2,
        }
    }

    /// Does this mode consume the options-implied path?
    pub fn needs_implied_vol(&self) -> bool {
        !matches!(self, ForecastMode::TrendExtrapolation)
    }

    /// Does this mode consume the trend path?
    pub fn needs_trend(&self) -> bool {
        !matches!(self, ForecastMode::ImpliedVolatility)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ForecastMode::ImpliedVolatility => "iv",
            ForecastMode::TrendExtrapolation => "trend",
            ForecastMode::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for ForecastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ForecastMode {
    type Err = ProjectionError;

    fn from_str(s: &str) -> ProjectionResult<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "iv" | "implied_volatility" | "implied-volatility" => Ok(ForecastMode::ImpliedVolatility),
            "trend" | "trend_extrapolation" | "trend-extrapolation" => {
                Ok(ForecastMode::TrendExtrapolation)
            }
            "aggregate" | "blend" => Ok(ForecastMode::Aggregate),
            _ => Err(ProjectionError::InvalidMode(s.to_string())),
        }
    }
}

/// Trend value for one forecast day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub point_estimate: f64,
    /// Dispersion scale applied to z(q); one standard deviation
    pub uncertainty_half_width: f64,
}

impl TrendPoint {
    pub fn new(point_estimate: f64, uncertainty_half_width: f64) -> Self {
        Self {
            point_estimate,
            uncertainty_half_width,
        }
    }
}

/// Per-day trend forecast, index = day offset starting at 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub points: Vec<TrendPoint>,
}

impl TrendForecast {
    pub fn new(points: Vec<TrendPoint>) -> Self {
        Self { points }
    }

    /// Flat trend at `price` with constant uncertainty
    pub fn flat(price: f64, half_width: f64, horizon_days: u32) -> Self {
        Self::new(vec![TrendPoint::new(price, half_width); horizon_days as usize + 1])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check coverage of day 0 through `horizon_days` and value sanity
    pub fn validate(&self, horizon_days: u32) -> ProjectionResult<()> {
        let needed = horizon_days as usize + 1;
        if self.points.len() < needed {
            return Err(ProjectionError::trend_unavailable(format!(
                "forecast covers {} days, horizon needs {}",
                self.points.len(),
                needed
            )));
        }
        for (day, p) in self.points.iter().take(needed).enumerate() {
            if !p.point_estimate.is_finite() || !p.uncertainty_half_width.is_finite() {
                return Err(ProjectionError::trend_unavailable(format!(
                    "non-finite forecast value at day {}",
                    day
                )));
            }
            if p.uncertainty_half_width < 0.0 {
                return Err(ProjectionError::trend_unavailable(format!(
                    "negative uncertainty {} at day {}",
                    p.uncertainty_half_width, day
                )));
            }
        }
        Ok(())
    }
}
