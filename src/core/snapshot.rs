//! Market snapshot
//!
//! Current price, valuation date and the daily close history the
//! projection starts from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, ProjectionResult};

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Snapshot of the underlying at valuation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Latest traded price
    pub current_price: f64,
    /// Date the projection is measured from
    pub valuation_date: NaiveDate,
    /// Daily closes, oldest first
    pub historical_closes: Vec<PriceBar>,
}

impl MarketSnapshot {
    pub fn new(
        current_price: f64,
        valuation_date: NaiveDate,
        historical_closes: Vec<PriceBar>,
    ) -> Self {
        Self {
            current_price,
            valuation_date,
            historical_closes,
        }
    }

    /// Build a snapshot whose price and date come from the last close
    pub fn from_closes(mut closes: Vec<PriceBar>) -> ProjectionResult<Self> {
        closes.sort_by_key(|bar| bar.date);
        let last = closes
            .last()
            .copied()
            .ok_or_else(|| ProjectionError::no_market_data("no historical closes"))?;

        let snapshot = Self::new(last.close, last.date, closes);
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the snapshot is usable for a projection
    pub fn validate(&self) -> ProjectionResult<()> {
        if self.historical_closes.is_empty() {
            return Err(ProjectionError::no_market_data("no historical closes"));
        }
        if !self.current_price.is_finite() || self.current_price <= 0.0 {
            return Err(ProjectionError::invalid_input(format!(
                "current price must be positive, got {}",
                self.current_price
            )));
        }
        Ok(())
    }

    /// Closes within the last `days` calendar days of the valuation date
    pub fn recent_closes(&self, days: i64) -> &[PriceBar] {
        let cutoff = self.valuation_date - chrono::Duration::days(days);
        let start = self.historical_closes.partition_point(|bar| bar.date <= cutoff);
        &self.historical_closes[start..]
    }
}
