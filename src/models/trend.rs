//! Trend path
//!
//! Converts a per-day trend forecast (point estimate plus one-sigma
//! uncertainty) into a dense quantile family under a normal assumption:
//!
//! price[q][d] = point[d] + z(q) · uncertainty[d]

use ndarray::Array1;

use crate::core::{
    PriceBar, ProjectionResult, QuantileCurveFamily, QuantileSet, TrendForecast,
};

/// Source of trend forecasts from a close history.
///
/// Implementations may be stochastic; callers must not rely on two calls
/// returning identical values.
pub trait TrendForecaster {
    /// Forecast day 0 through `horizon_days` (inclusive) after the last close
    fn forecast(&self, closes: &[PriceBar], horizon_days: u32) -> ProjectionResult<TrendForecast>;
}

/// Trend quantile family plus the point-estimate curve it was widened from
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPath {
    pub family: QuantileCurveFamily,
    /// z = 0 curve, re-anchored when requested. Present for any quantile
    /// set, including even-sized ones that have no median rank.
    pub center: Array1<f64>,
}

impl TrendPath {
    pub fn new(family: QuantileCurveFamily, center: Array1<f64>) -> Self {
        Self { family, center }
    }
}

/// Build the trend quantile family.
///
/// When `anchor_price` is given the point-estimate series is shifted so
/// day 0 lands exactly on it, keeping the fan attached to the last price.
///
/// # Errors
/// `TrendUnavailable` if the forecast misses days or carries bad values.
pub fn adapt_trend(
    forecast: &TrendForecast,
    quantiles: &QuantileSet,
    horizon_days: u32,
    anchor_price: Option<f64>,
) -> ProjectionResult<TrendPath> {
    forecast.validate(horizon_days)?;

    let points = &forecast.points[..=horizon_days as usize];
    let origin = points[0].point_estimate;
    let centers: Vec<f64> = points
        .iter()
        .map(|p| match anchor_price {
            // Written as an offset from the anchor so day 0 hits it exactly
            Some(price) => price + (p.point_estimate - origin),
            None => p.point_estimate,
        })
        .collect();

    let rows = quantiles
        .z_scores()
        .into_iter()
        .map(|z| {
            centers
                .iter()
                .zip(points)
                .map(|(&center, p)| center + z * p.uncertainty_half_width)
                .collect()
        })
        .collect();

    let family = QuantileCurveFamily::from_rows(rows)?;
    Ok(TrendPath::new(family, Array1::from(centers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ProjectionError, TrendPoint};
    use approx::assert_abs_diff_eq;

    fn rising(horizon: u32) -> TrendForecast {
        TrendForecast::new(
            (0..=horizon)
                .map(|d| TrendPoint::new(50.0 + d as f64, 0.1 * d as f64))
                .collect(),
        )
    }

    #[test]
    fn test_median_follows_point_estimate() {
        let quantiles = QuantileSet::new(vec![0.1, 0.5, 0.9]).unwrap();
        let family = adapt_trend(&rising(20), &quantiles, 20, None).unwrap().family;

        assert_eq!(family.shape(), (3, 21));
        for d in 0..=20 {
            assert_abs_diff_eq!(family.value(1, d), 50.0 + d as f64, epsilon = 1e-12);
        }
        let z = crate::models::norm_ppf(0.9);
        assert_abs_diff_eq!(family.value(2, 10), 60.0 + z * 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(family.value(0, 10), 60.0 - z * 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_monotonic_by_construction() {
        let family = adapt_trend(&rising(30), &QuantileSet::default(), 30, None).unwrap().family;
        assert!(family.check_non_crossing(0.0).is_ok());
    }

    #[test]
    fn test_reanchor_to_price() {
        let quantiles = QuantileSet::new(vec![0.25, 0.5, 0.75]).unwrap();
        let path = adapt_trend(&rising(10), &quantiles, 10, Some(100.0)).unwrap();

        // Zero uncertainty on day 0 puts every rank on the anchor
        assert_eq!(path.family.day(0).to_vec(), vec![100.0, 100.0, 100.0]);
        assert_abs_diff_eq!(path.family.value(1, 10), 110.0, epsilon = 1e-12);
        assert_eq!(path.center[0], 100.0);
    }

    #[test]
    fn test_longer_forecast_is_truncated() {
        let family = adapt_trend(&rising(60), &QuantileSet::default(), 30, None).unwrap().family;
        assert_eq!(family.n_days(), 31);
    }

    #[test]
    fn test_short_forecast_unavailable() {
        let err = adapt_trend(&rising(10), &QuantileSet::default(), 30, None).unwrap_err();
        assert!(matches!(err, ProjectionError::TrendUnavailable(_)));
    }

    #[test]
    fn test_even_set_center_is_point_estimate() {
        // No rank sits on 0.5, but the center still tracks the forecast
        let quantiles = QuantileSet::new(vec![0.1, 0.4, 0.6, 0.9]).unwrap();
        let forecast = TrendForecast::new(
            (0..=10).map(|d| TrendPoint::new(80.0 + d as f64, 5.0)).collect(),
        );
        let path = adapt_trend(&forecast, &quantiles, 10, Some(100.0)).unwrap();

        assert_eq!(path.center.len(), 11);
        assert_eq!(path.center[0], 100.0);
        assert_abs_diff_eq!(path.center[10], 110.0, epsilon = 1e-12);
        assert!(path.family.value(1, 0) < 100.0 && path.family.value(2, 0) > 100.0);
    }
}
