//! Fan grid assembly
//!
//! Runs the full projection for one request:
//! 1. **Implied-volatility path**: anchors from option expirations, splined to every day
//! 2. **Trend path**: per-day trend forecast widened into quantiles
//! 3. **Blend**: select or combine the paths per forecast mode
//!
//! Every call is independent. Nothing is cached between requests and all
//! types here are `Send + Sync`, so requests can run on separate threads.

mod assembler;
mod config;

pub use assembler::*;
pub use config::*;

use std::time::Instant;

use chrono::NaiveDate;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::core::{
    ForecastMode, MarketSnapshot, OptionExpirationQuote, QuantileCurveFamily, QuantileSet,
    TrendForecast,
};
use crate::models::{AnchorScan, Degradation};

/// Inputs for one projection
#[derive(Debug, Clone)]
pub struct ProjectionRequest {
    pub snapshot: MarketSnapshot,
    /// Days forward from the valuation date
    pub horizon_days: u32,
    pub quantiles: QuantileSet,
    /// One entry per listed expiration, ideally date-sorted
    pub expirations: Vec<OptionExpirationQuote>,
    /// Trend forecast from day 0, if one was produced
    pub trend: Option<TrendForecast>,
    pub mode: ForecastMode,
    /// Give up once this instant has passed
    pub deadline: Option<Instant>,
}

impl ProjectionRequest {
    pub fn new(snapshot: MarketSnapshot, horizon_days: u32, mode: ForecastMode) -> Self {
        Self {
            snapshot,
            horizon_days,
            quantiles: QuantileSet::default(),
            expirations: Vec::new(),
            trend: None,
            mode,
            deadline: None,
        }
    }

    pub fn with_quantiles(mut self, quantiles: QuantileSet) -> Self {
        self.quantiles = quantiles;
        self
    }

    pub fn with_expirations(mut self, expirations: Vec<OptionExpirationQuote>) -> Self {
        self.expirations = expirations;
        self
    }

    pub fn with_trend(mut self, trend: TrendForecast) -> Self {
        self.trend = Some(trend);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Whether the projection is what the mode asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reasons")]
pub enum ProjectionStatus {
    Complete,
    Degraded(Vec<Degradation>),
}

impl ProjectionStatus {
    fn from_degradations(degradations: Vec<Degradation>) -> Self {
        if degradations.is_empty() {
            ProjectionStatus::Complete
        } else {
            ProjectionStatus::Degraded(degradations)
        }
    }
}

/// Dense fan output, ready for a renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanGrid {
    pub mode: ForecastMode,
    pub current_price: f64,
    pub valuation_date: NaiveDate,
    pub quantiles: QuantileSet,
    /// Column index → day offset (0 through the horizon)
    pub day_offsets: Vec<u32>,
    /// Prices by (quantile rank, day column)
    pub family: QuantileCurveFamily,
    /// Implied-volatility scan report, when that path ran
    pub anchor_scan: Option<AnchorScan>,
    pub status: ProjectionStatus,
}

impl FanGrid {
    pub fn horizon_days(&self) -> u32 {
        self.day_offsets.last().copied().unwrap_or(0)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, ProjectionStatus::Degraded(_))
    }

    /// Calendar date of every column
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.day_offsets
            .iter()
            .map(|&d| self.valuation_date + chrono::Duration::days(d as i64))
            .collect()
    }

    /// Median curve; even-sized sets average the two innermost ranks
    pub fn median(&self) -> Array1<f64> {
        let (lo, hi) = self.quantiles.middle_ranks();
        if lo == hi {
            return self.family.rank(lo).to_owned();
        }
        (&self.family.rank(lo) + &self.family.rank(hi)) / 2.0
    }

    /// Nested (lower, upper) curve pairs, widest band first
    pub fn bands(&self) -> Vec<(ArrayView1<'_, f64>, ArrayView1<'_, f64>)> {
        self.quantiles
            .band_pairs()
            .into_iter()
            .map(|(lo, hi)| (self.family.rank(lo), self.family.rank(hi)))
            .collect()
    }

    /// Lowest and highest projected price over the whole grid
    pub fn price_range(&self) -> (f64, f64) {
        self.family
            .values()
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}
