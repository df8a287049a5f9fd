//! Configuration for the projection pipeline

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{ProjectionError, ProjectionResult, QuantileSet};
use crate::models::AnchorParams;

/// Configuration for fan projections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Quantile levels of the fan
    pub quantiles: QuantileConfig,

    /// Expirations beyond `horizon + expiry_lookahead_days` end the scan.
    /// Later expirations still shape the spline near the horizon.
    /// Default: 15
    pub expiry_lookahead_days: u32,

    /// Day-count basis for converting day offsets to years
    /// Default: 365.0
    pub days_per_year: f64,

    /// Shift the trend so day 0 starts at the current price
    /// Default: true
    pub reanchor_trend: bool,

    /// Overlap between adjacent quantile curves tolerated as rounding noise
    /// Default: 1e-9
    pub crossing_tolerance: f64,

    /// Largest horizon the engine accepts, bounding work per call
    /// Default: 365
    pub max_horizon_days: u32,

    /// Horizons offered to users of the command-line tool
    /// Default: [30, 60, 90]
    pub allowed_horizons: Vec<u32>,

    /// History windows requested from the market data provider
    pub history: HistoryConfig,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            quantiles: QuantileConfig::default(),
            expiry_lookahead_days: 15,
            days_per_year: 365.0,
            reanchor_trend: true,
            crossing_tolerance: 1e-9,
            max_horizon_days: 365,
            allowed_horizons: vec![30, 60, 90],
            history: HistoryConfig::default(),
        }
    }
}

impl ProjectionConfig {
    /// No tolerance for crossing curves
    pub fn strict() -> Self {
        Self {
            crossing_tolerance: 0.0,
            ..Default::default()
        }
    }

    /// Scan expirations further past the horizon
    pub fn wide_lookahead() -> Self {
        Self {
            expiry_lookahead_days: 45,
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> ProjectionResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| ProjectionError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> ProjectionResult<()> {
        self.quantile_set()?;
        if !(self.days_per_year.is_finite() && self.days_per_year > 0.0) {
            return Err(ProjectionError::invalid_input(format!(
                "days_per_year must be positive, got {}",
                self.days_per_year
            )));
        }
        if self.crossing_tolerance.is_nan() || self.crossing_tolerance < 0.0 {
            return Err(ProjectionError::invalid_input(format!(
                "crossing_tolerance must be non-negative, got {}",
                self.crossing_tolerance
            )));
        }
        if self.max_horizon_days == 0 {
            return Err(ProjectionError::invalid_input("max_horizon_days must be positive"));
        }
        Ok(())
    }

    /// Check a horizon against the engine bound
    pub fn check_horizon(&self, horizon_days: u32) -> ProjectionResult<()> {
        if horizon_days == 0 || horizon_days > self.max_horizon_days {
            return Err(ProjectionError::invalid_input(format!(
                "horizon must be between 1 and {} days, got {}",
                self.max_horizon_days, horizon_days
            )));
        }
        Ok(())
    }

    /// Check a horizon against the user-facing choices
    pub fn check_offered_horizon(&self, horizon_days: u32) -> ProjectionResult<()> {
        if !self.allowed_horizons.contains(&horizon_days) {
            return Err(ProjectionError::invalid_input(format!(
                "horizon must be one of {:?} days, got {}",
                self.allowed_horizons, horizon_days
            )));
        }
        self.check_horizon(horizon_days)
    }

    pub fn quantile_set(&self) -> ProjectionResult<QuantileSet> {
        self.quantiles.build()
    }

    pub fn anchor_params(&self) -> AnchorParams {
        AnchorParams {
            expiry_lookahead_days: self.expiry_lookahead_days,
            days_per_year: self.days_per_year,
        }
    }
}

/// Evenly spaced quantile levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantileConfig {
    /// Lowest level
    /// Default: 0.05
    pub lower: f64,
    /// Highest level
    /// Default: 0.95
    pub upper: f64,
    /// Number of levels, including both ends
    /// Default: 19
    pub count: usize,
}

impl Default for QuantileConfig {
    fn default() -> Self {
        Self {
            lower: 0.05,
            upper: 0.95,
            count: 19,
        }
    }
}

impl QuantileConfig {
    pub fn build(&self) -> ProjectionResult<QuantileSet> {
        QuantileSet::linspace(self.lower, self.upper, self.count)
    }
}

/// Close-history windows per model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Calendar days of history when only implied volatility is used
    /// Default: 30
    pub iv_window_days: u32,
    /// Calendar days of history when a trend is fitted
    /// Default: 365
    pub trend_window_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            iv_window_days: 30,
            trend_window_days: 365,
        }
    }
}

impl HistoryConfig {
    /// History window for a mode; trend fits need the longer one
    pub fn window_for(&self, mode: crate::core::ForecastMode) -> u32 {
        if mode.needs_trend() {
            self.trend_window_days
        } else {
            self.iv_window_days
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ForecastMode;
    use std::io::Write;

    #[test]
    fn test_defaults_valid() {
        let config = ProjectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.quantile_set().unwrap().len(), 19);
        assert_eq!(config.anchor_params().expiry_lookahead_days, 15);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ProjectionConfig::strict().crossing_tolerance, 0.0);
        assert_eq!(ProjectionConfig::wide_lookahead().expiry_lookahead_days, 45);
        assert!(ProjectionConfig::strict().validate().is_ok());
    }

    #[test]
    fn test_horizon_checks() {
        let config = ProjectionConfig::default();
        assert!(config.check_horizon(45).is_ok());
        assert!(config.check_horizon(0).is_err());
        assert!(config.check_horizon(366).is_err());
        assert!(config.check_offered_horizon(60).is_ok());
        assert!(config.check_offered_horizon(45).is_err());
    }

    #[test]
    fn test_history_window_by_mode() {
        let history = HistoryConfig::default();
        assert_eq!(history.window_for(ForecastMode::ImpliedVolatility), 30);
        assert_eq!(history.window_for(ForecastMode::TrendExtrapolation), 365);
        assert_eq!(history.window_for(ForecastMode::Aggregate), 365);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"expiry_lookahead_days": 20, "quantiles": {{"lower": 0.1, "upper": 0.9, "count": 9}}}}"#).unwrap();

        let config = ProjectionConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.expiry_lookahead_days, 20);
        assert_eq!(config.quantile_set().unwrap().len(), 9);
        assert_eq!(config.days_per_year, 365.0);
    }

    #[test]
    fn test_invalid_json_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"days_per_year": -1.0}}"#).unwrap();
        assert!(ProjectionConfig::from_json_file(file.path()).is_err());
    }
}
