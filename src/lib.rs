//! # Quantile Fan - Price Projection Engine
//!
//! Projects the future price distribution of a traded underlying as a fan
//! of quantile curves, one curve per probability level, one value per day
//! from today out to a chosen horizon.
//!
//! ## Overview
//!
//! Two independent views of the future are combined:
//! - **Implied volatility**: each listed option expiration's ATM IV gives a
//!   lognormal price distribution at that date; natural cubic splines
//!   connect the expirations into daily curves
//! - **Trend extrapolation**: a per-day point forecast with uncertainty,
//!   widened into quantiles under a normal assumption
//!
//! The aggregate mode moves the implied-volatility spread onto the trend's
//! central curve.
//!
//! ## Key Components
//!
//! - **Data Fetching**: Yahoo Finance closes and option chains, with local caching
//! - **Anchors**: lognormal quantiles at every usable expiration
//! - **Spline**: natural cubic interpolation between anchors
//! - **Trend**: forecaster seam plus a linear regression forecaster
//! - **Engine**: mode selection, blending and degradation reporting
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quantile_fan::prelude::*;
//!
//! let client = YahooClient::new().unwrap();
//! let bundle = client.fetch_bundle("SPY", 365, Some(45)).unwrap();
//!
//! let request = ProjectionRequest::new(bundle.snapshot, 30, ForecastMode::Aggregate)
//!     .with_expirations(bundle.expirations);
//! let grid = FanProjector::new()
//!     .project_with_forecaster(&request, &LinearTrendForecaster::new())
//!     .unwrap();
//!
//! println!("median in 30 days: {:.2}", grid.median()[30]);
//! ```
//!
//! ## What This Engine Does NOT Do
//!
//! - Price options or compute Greeks
//! - Model dividends, rates or early exercise
//! - Draw charts (the grid is handed to a renderer)

pub mod core;
pub mod data;
pub mod engine;
pub mod models;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        Anchor, AnchorSet, ForecastMode, MarketSnapshot, OptionContract, OptionExpirationQuote,
        OptionQuote, OptionType, PriceBar, ProjectionError, ProjectionResult, QuantileCurveFamily,
        QuantileSet, QuoteChain, TrendForecast, TrendPoint,
    };

    // Data fetching
    pub use crate::data::{
        CacheConfig, CachedProvider, DataCache, MarketBundle, MarketDataProvider, YahooClient,
    };

    // Models
    pub use crate::models::{
        adapt_trend, blend, build_iv_anchors, interpolate_anchors, norm_ppf, AnchorParams,
        AnchorScan, BlendInputs, Degradation, LinearTrendForecaster, NaturalCubicSpline,
        QuoteDisposition, SkipReason, TrendForecaster, TrendPath,
    };

    // Engine
    pub use crate::engine::{
        FanGrid, FanProjector, ProjectionConfig, ProjectionRequest, ProjectionStatus,
    };
}

// Re-export main types at crate root
pub use crate::core::{ProjectionError, ProjectionResult};
pub use crate::engine::{FanGrid, FanProjector, ProjectionRequest};
