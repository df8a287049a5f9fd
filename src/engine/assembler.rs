//! FanProjector - Main facade for the projection pipeline
//!
//! Combines anchor building, interpolation, trend adaptation and blending
//! into a single interface.

use std::time::Instant;

use crate::core::{ProjectionError, ProjectionResult, QuantileCurveFamily, TrendForecast};
use crate::models::{
    adapt_trend, blend, build_iv_anchors, interpolate_anchors, AnchorScan, BlendInputs,
    Degradation, TrendForecaster, TrendPath,
};

use super::{FanGrid, ProjectionConfig, ProjectionRequest, ProjectionStatus};

/// Main projector that runs the full pipeline
#[derive(Debug, Clone)]
pub struct FanProjector {
    config: ProjectionConfig,
}

impl FanProjector {
    /// Create a projector with default configuration
    pub fn new() -> Self {
        Self {
            config: ProjectionConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(config: ProjectionConfig) -> Self {
        Self { config }
    }

    /// Get current configuration
    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Run the pipeline with the trend forecast carried by the request
    pub fn project(&self, request: &ProjectionRequest) -> ProjectionResult<FanGrid> {
        let trend = request
            .trend
            .as_ref()
            .ok_or_else(|| ProjectionError::trend_unavailable("no trend forecast supplied"));
        self.assemble(request, trend)
    }

    /// Run the pipeline, asking `forecaster` for a trend when the mode needs
    /// one and the request carries none
    pub fn project_with_forecaster(
        &self,
        request: &ProjectionRequest,
        forecaster: &dyn TrendForecaster,
    ) -> ProjectionResult<FanGrid> {
        if request.trend.is_some() || !request.mode.needs_trend() {
            return self.project(request);
        }

        check_deadline(request.deadline, "trend forecast")?;
        let closes = request
            .snapshot
            .recent_closes(i64::from(self.config.history.trend_window_days));
        tracing::debug!("Forecasting trend from {} closes", closes.len());
        let forecast = forecaster
            .forecast(closes, request.horizon_days)
            .map_err(|e| match e {
                ProjectionError::TrendUnavailable(_) => e,
                other => ProjectionError::trend_unavailable(other.to_string()),
            });

        match forecast {
            Ok(forecast) => self.assemble(request, Ok(&forecast)),
            Err(e) => self.assemble(request, Err(e)),
        }
    }

    fn assemble(
        &self,
        request: &ProjectionRequest,
        trend: ProjectionResult<&TrendForecast>,
    ) -> ProjectionResult<FanGrid> {
        let snapshot = &request.snapshot;
        let horizon = request.horizon_days;
        let quantiles = &request.quantiles;

        snapshot.validate()?;
        self.config.check_horizon(horizon)?;
        if quantiles.is_empty() {
            return Err(ProjectionError::invalid_input("quantile set is empty"));
        }

        let day_offsets: Vec<u32> = (0..=horizon).collect();
        let mut degradations = Vec::new();

        // Implied-volatility path
        let mut anchor_scan: Option<AnchorScan> = None;
        let mut iv_family: Option<QuantileCurveFamily> = None;
        if request.mode.needs_implied_vol() {
            let scan = build_iv_anchors(
                snapshot,
                horizon,
                quantiles,
                &request.expirations,
                &self.config.anchor_params(),
                request.deadline,
            )?;
            if scan.used_fallback {
                degradations.push(Degradation::FlatFallback);
            }

            check_deadline(request.deadline, "interpolation")?;
            iv_family = Some(interpolate_anchors(&scan.anchors, &day_offsets)?);
            anchor_scan = Some(scan);
        }

        // Trend path
        let mut trend_path: Result<TrendPath, String> =
            Err("trend path not requested".to_string());
        if request.mode.needs_trend() {
            let anchor_price = self.config.reanchor_trend.then_some(snapshot.current_price);
            trend_path = match trend.and_then(|f| adapt_trend(f, quantiles, horizon, anchor_price)) {
                Ok(path) => Ok(path),
                Err(ProjectionError::TrendUnavailable(reason)) => {
                    if !request.mode.needs_implied_vol() {
                        return Err(ProjectionError::TrendUnavailable(reason));
                    }
                    Err(reason)
                }
                Err(other) => return Err(other),
            };
        }

        let blended = blend(BlendInputs {
            mode: request.mode,
            iv: iv_family.as_ref(),
            trend: trend_path.as_ref().map_err(String::as_str),
            current_price: snapshot.current_price,
            crossing_tolerance: self.config.crossing_tolerance,
        })?;
        degradations.extend(blended.degradation);

        let status = ProjectionStatus::from_degradations(degradations);
        if let ProjectionStatus::Degraded(reasons) = &status {
            tracing::warn!("Projection degraded: {:?}", reasons);
        }
        tracing::info!(
            "Projected {} mode over {} days with {} quantiles",
            request.mode,
            horizon,
            quantiles.len()
        );

        Ok(FanGrid {
            mode: request.mode,
            current_price: snapshot.current_price,
            valuation_date: snapshot.valuation_date,
            quantiles: quantiles.clone(),
            day_offsets,
            family: blended.family,
            anchor_scan,
            status,
        })
    }
}

impl Default for FanProjector {
    fn default() -> Self {
        Self::new()
    }
}

fn check_deadline(deadline: Option<Instant>, stage: &'static str) -> ProjectionResult<()> {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Err(ProjectionError::DeadlineExceeded(stage));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::core::{
        ForecastMode, MarketSnapshot, OptionExpirationQuote, PriceBar, QuantileSet, TrendPoint,
    };
    use crate::engine::ProjectionStatus;
    use crate::models::LinearTrendForecaster;
    use chrono::NaiveDate;

    fn valuation() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn snapshot() -> MarketSnapshot {
        let closes = (0..60)
            .map(|i| {
                let date = valuation() - chrono::Duration::days(59 - i);
                PriceBar::new(date, 90.0 + i as f64 / 6.0 + if i % 2 == 0 { 0.8 } else { -0.8 })
            })
            .collect();
        let mut snapshot = MarketSnapshot::from_closes(closes).unwrap();
        snapshot.current_price = 100.0;
        snapshot
    }

    fn expirations() -> Vec<OptionExpirationQuote> {
        [(7, 0.30), (14, 0.28), (28, 0.26), (42, 0.25), (70, 0.24)]
            .iter()
            .map(|&(d, iv)| {
                OptionExpirationQuote::new(valuation() + chrono::Duration::days(d), Some(iv))
            })
            .collect()
    }

    #[test]
    fn test_iv_mode_end_to_end() {
        let request = ProjectionRequest::new(snapshot(), 30, ForecastMode::ImpliedVolatility)
            .with_expirations(expirations());
        let grid = FanProjector::new().project(&request).unwrap();

        assert_eq!(grid.status, ProjectionStatus::Complete);
        assert_eq!(grid.day_offsets.len(), 31);
        assert_eq!(grid.family.shape(), (19, 31));
        assert!(grid.family.day(0).iter().all(|&v| v == 100.0));

        let scan = grid.anchor_scan.as_ref().unwrap();
        // 70 days is past 30 + 15
        assert_eq!(scan.anchors.offsets(), vec![0.0, 7.0, 14.0, 28.0, 42.0]);
        assert_eq!(scan.not_scanned, 1);
    }

    #[test]
    fn test_trend_mode_requires_trend() {
        let request = ProjectionRequest::new(snapshot(), 30, ForecastMode::TrendExtrapolation);
        let err = FanProjector::new().project(&request).unwrap_err();
        assert!(matches!(err, ProjectionError::TrendUnavailable(_)));
    }

    #[test]
    fn test_trend_mode_ignores_options() {
        let request = ProjectionRequest::new(snapshot(), 10, ForecastMode::TrendExtrapolation)
            .with_trend(TrendForecast::flat(100.0, 2.0, 10));
        let grid = FanProjector::new().project(&request).unwrap();
        assert!(grid.anchor_scan.is_none());
        assert_eq!(grid.status, ProjectionStatus::Complete);
    }

    #[test]
    fn test_aggregate_without_trend_is_degraded() {
        let request = ProjectionRequest::new(snapshot(), 30, ForecastMode::Aggregate)
            .with_expirations(expirations());
        let grid = FanProjector::new().project(&request).unwrap();

        match &grid.status {
            ProjectionStatus::Degraded(reasons) => {
                assert!(matches!(reasons[0], Degradation::TrendUnavailable(_)));
            }
            other => panic!("expected degraded status, got {:?}", other),
        }

        let iv_only = ProjectionRequest::new(snapshot(), 30, ForecastMode::ImpliedVolatility)
            .with_expirations(expirations());
        let iv_grid = FanProjector::new().project(&iv_only).unwrap();
        assert_eq!(grid.family, iv_grid.family);
    }

    #[test]
    fn test_iv_mode_ignores_malformed_trend() {
        let request = ProjectionRequest::new(snapshot(), 30, ForecastMode::ImpliedVolatility)
            .with_expirations(expirations())
            .with_trend(TrendForecast::flat(100.0, 1.0, 3));
        assert!(FanProjector::new().project(&request).is_ok());
    }

    #[test]
    fn test_with_forecaster() {
        let request = ProjectionRequest::new(snapshot(), 30, ForecastMode::Aggregate)
            .with_expirations(expirations());
        let grid = FanProjector::new()
            .project_with_forecaster(&request, &LinearTrendForecaster::new())
            .unwrap();

        assert_eq!(grid.status, ProjectionStatus::Complete);
        assert!(grid.family.day(0).iter().all(|&v| v == 100.0));
        // The history trends upward, so the median ends above the start
        assert!(grid.median()[30] > 100.0);
    }

    /// Records how many closes it was handed
    struct CountingForecaster {
        seen: Cell<usize>,
    }

    impl TrendForecaster for CountingForecaster {
        fn forecast(&self, closes: &[PriceBar], horizon_days: u32) -> ProjectionResult<TrendForecast> {
            self.seen.set(closes.len());
            Ok(TrendForecast::flat(100.0, 1.0, horizon_days))
        }
    }

    #[test]
    fn test_forecaster_sees_trend_window_only() {
        let mut config = ProjectionConfig::default();
        config.history.trend_window_days = 20;
        let forecaster = CountingForecaster { seen: Cell::new(0) };

        let request = ProjectionRequest::new(snapshot(), 30, ForecastMode::TrendExtrapolation);
        FanProjector::with_config(config)
            .project_with_forecaster(&request, &forecaster)
            .unwrap();

        // 60 daily closes, only the last 20 fall inside the window
        assert_eq!(forecaster.seen.get(), 20);
    }

    #[test]
    fn test_even_quantile_set_aggregate() {
        let quantiles = QuantileSet::new(vec![0.1, 0.4, 0.6, 0.9]).unwrap();
        let iv_request = ProjectionRequest::new(snapshot(), 30, ForecastMode::ImpliedVolatility)
            .with_quantiles(quantiles.clone())
            .with_expirations(expirations());
        let mut agg_request = iv_request.clone();
        agg_request.mode = ForecastMode::Aggregate;
        agg_request.trend = Some(TrendForecast::flat(100.0, 5.0, 30));

        let iv = FanProjector::new().project(&iv_request).unwrap();
        let agg = FanProjector::new().project(&agg_request).unwrap();

        assert!(agg.family.day(0).iter().all(|&v| v == 100.0));
        assert_eq!(agg.median()[0], 100.0);
        // A flat trend centered on the price leaves the spread where it was
        for (a, b) in agg.family.values().iter().zip(iv.family.values()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_forecaster_failure_in_trend_mode() {
        let closes = vec![PriceBar::new(valuation(), 100.0)];
        let snapshot = MarketSnapshot::from_closes(closes).unwrap();
        let request = ProjectionRequest::new(snapshot, 30, ForecastMode::TrendExtrapolation);
        let err = FanProjector::new()
            .project_with_forecaster(&request, &LinearTrendForecaster::new())
            .unwrap_err();
        assert!(matches!(err, ProjectionError::TrendUnavailable(_)));
    }

    #[test]
    fn test_flat_fallback_status() {
        let request = ProjectionRequest::new(snapshot(), 60, ForecastMode::ImpliedVolatility);
        let grid = FanProjector::new().project(&request).unwrap();
        assert_eq!(grid.status, ProjectionStatus::Degraded(vec![Degradation::FlatFallback]));
        assert!(grid.family.values().iter().all(|&v| v == 100.0));
    }

    #[test]
    fn test_horizon_bounds() {
        let projector = FanProjector::new();
        let request = ProjectionRequest::new(snapshot(), 0, ForecastMode::ImpliedVolatility);
        assert!(matches!(projector.project(&request), Err(ProjectionError::InvalidInput(_))));

        let request = ProjectionRequest::new(snapshot(), 1000, ForecastMode::ImpliedVolatility);
        assert!(projector.project(&request).is_err());
    }

    #[test]
    fn test_no_history_is_fatal() {
        let bare = MarketSnapshot::new(100.0, valuation(), vec![]);
        for mode in ForecastMode::ALL {
            let request = ProjectionRequest::new(bare.clone(), 30, mode)
                .with_trend(TrendForecast::flat(100.0, 1.0, 30));
            let err = FanProjector::new().project(&request).unwrap_err();
            assert!(matches!(err, ProjectionError::NoMarketData(_)));
        }
    }

    #[test]
    fn test_grid_helpers() {
        let quantiles = QuantileSet::new(vec![0.1, 0.5, 0.9]).unwrap();
        let trend = TrendForecast::new(
            (0..=5).map(|d| TrendPoint::new(100.0 + d as f64, d as f64)).collect(),
        );
        let request = ProjectionRequest::new(snapshot(), 5, ForecastMode::TrendExtrapolation)
            .with_quantiles(quantiles)
            .with_trend(trend);
        let grid = FanProjector::new().project(&request).unwrap();

        assert_eq!(grid.horizon_days(), 5);
        assert_eq!(grid.dates()[5], NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
        assert_eq!(grid.median().to_vec(), vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        assert_eq!(grid.bands().len(), 1);
        let (lo, hi) = grid.price_range();
        assert!(lo < 100.0 && hi > 105.0);
    }
}
