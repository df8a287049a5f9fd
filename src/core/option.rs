//! Option contract definitions
//!
//! Only the fields the projection needs: strike, expiry and side.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

/// Option contract specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol (e.g., "AAPL", "SPY")
    pub underlying: String,
    /// Strike price
    pub strike: f64,
    /// Expiration date
    pub expiry: NaiveDate,
    /// Option type (Call/Put)
    pub option_type: OptionType,
    /// Contract symbol (exchange-specific)
    pub symbol: Option<String>,
}

impl OptionContract {
    pub fn new(
        underlying: impl Into<String>,
        strike: f64,
        expiry: NaiveDate,
        option_type: OptionType,
    ) -> Self {
        Self {
            underlying: underlying.into(),
            strike,
            expiry,
            option_type,
            symbol: None,
        }
    }

    /// Absolute distance of the strike from a reference price
    pub fn strike_distance(&self, spot: f64) -> f64 {
        (self.strike - spot).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strike_distance() {
        let expiry = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        let opt = OptionContract::new("QQQ", 495.0, expiry, OptionType::Put);
        assert_eq!(opt.strike_distance(500.0), 5.0);
        assert_eq!(opt.strike_distance(490.0), 5.0);
    }
}
