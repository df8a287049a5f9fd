//! Market data provider seam
//!
//! The engine never fetches anything itself. A provider hands it a
//! snapshot and one ATM implied volatility per expiration, bundled so the
//! same inputs can be cached or replayed offline.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{MarketSnapshot, OptionExpirationQuote, ProjectionError, ProjectionResult};

/// Source of market inputs for a projection
pub trait MarketDataProvider {
    /// Current price, valuation date and roughly `window_days` of daily closes
    fn snapshot(&self, symbol: &str, window_days: u32) -> ProjectionResult<MarketSnapshot>;

    /// ATM implied volatility per listed expiration, up to `max_day_offset`
    /// days after `valuation_date`
    fn expiration_quotes(
        &self,
        symbol: &str,
        spot: f64,
        valuation_date: NaiveDate,
        max_day_offset: i64,
    ) -> ProjectionResult<Vec<OptionExpirationQuote>>;

    /// Snapshot plus expirations in one call. Skips the option fetch when
    /// `max_day_offset` is `None`.
    fn fetch_bundle(
        &self,
        symbol: &str,
        window_days: u32,
        max_day_offset: Option<i64>,
    ) -> ProjectionResult<MarketBundle> {
        let snapshot = self.snapshot(symbol, window_days)?;
        let expirations = match max_day_offset {
            Some(max) => self.expiration_quotes(
                symbol,
                snapshot.current_price,
                snapshot.valuation_date,
                max,
            )?,
            None => Vec::new(),
        };
        Ok(MarketBundle::new(symbol, snapshot, expirations))
    }
}

/// Everything the engine needs from the market for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketBundle {
    pub symbol: String,
    pub fetched_at: DateTime<Utc>,
    pub snapshot: MarketSnapshot,
    pub expirations: Vec<OptionExpirationQuote>,
}

impl MarketBundle {
    pub fn new(
        symbol: impl Into<String>,
        snapshot: MarketSnapshot,
        expirations: Vec<OptionExpirationQuote>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            fetched_at: Utc::now(),
            snapshot,
            expirations,
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ProjectionResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&json).map_err(|e| ProjectionError::Serialization(e.to_string()))
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> ProjectionResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ProjectionError::Serialization(e.to_string()))?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PriceBar;

    struct FixedProvider;

    impl MarketDataProvider for FixedProvider {
        fn snapshot(&self, _symbol: &str, _window_days: u32) -> ProjectionResult<MarketSnapshot> {
            let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
            MarketSnapshot::from_closes(vec![PriceBar::new(date, 42.0)])
        }

        fn expiration_quotes(
            &self,
            _symbol: &str,
            spot: f64,
            valuation_date: NaiveDate,
            max_day_offset: i64,
        ) -> ProjectionResult<Vec<OptionExpirationQuote>> {
            assert_eq!(spot, 42.0);
            Ok((1..=max_day_offset)
                .step_by(7)
                .map(|d| {
                    OptionExpirationQuote::new(
                        valuation_date + chrono::Duration::days(d),
                        Some(0.3),
                    )
                })
                .collect())
        }
    }

    #[test]
    fn test_fetch_bundle() {
        let bundle = FixedProvider.fetch_bundle("XYZ", 30, Some(21)).unwrap();
        assert_eq!(bundle.symbol, "XYZ");
        assert_eq!(bundle.expirations.len(), 3);

        let bundle = FixedProvider.fetch_bundle("XYZ", 30, None).unwrap();
        assert!(bundle.expirations.is_empty());
    }

    #[test]
    fn test_bundle_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xyz.json");
        let bundle = FixedProvider.fetch_bundle("XYZ", 30, Some(21)).unwrap();
        bundle.to_json_file(&path).unwrap();

        let loaded = MarketBundle::from_json_file(&path).unwrap();
        assert_eq!(loaded.snapshot.current_price, 42.0);
        assert_eq!(loaded.expirations.len(), bundle.expirations.len());
    }
}
