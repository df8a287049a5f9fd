//! Option quote data
//!
//! Market quotes for a single expiry and their reduction to one
//! at-the-money implied volatility.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::option::{OptionContract, OptionType};

/// Number of nearest strikes taken on each side (calls and puts) for ATM IV
pub const ATM_STRIKES_PER_SIDE: usize = 2;

/// Option market quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuote {
    /// The option contract
    pub contract: OptionContract,
    /// Bid price
    pub bid: Option<f64>,
    /// Ask price
    pub ask: Option<f64>,
    /// Last traded price
    pub last: Option<f64>,
    /// Trading volume
    pub volume: Option<u64>,
    /// Open interest
    pub open_interest: Option<u64>,
    /// Implied volatility (as reported by the exchange)
    pub implied_vol: Option<f64>,
}

impl OptionQuote {
    pub fn new(contract: OptionContract) -> Self {
        Self {
            contract,
            bid: None,
            ask: None,
            last: None,
            volume: None,
            open_interest: None,
            implied_vol: None,
        }
    }

    /// Quote carrying only a strike and an implied volatility
    pub fn with_iv(
        underlying: &str,
        strike: f64,
        expiry: NaiveDate,
        option_type: OptionType,
        implied_vol: Option<f64>,
    ) -> Self {
        let mut quote = Self::new(OptionContract::new(underlying, strike, expiry, option_type));
        quote.implied_vol = implied_vol;
        quote
    }
}

/// Chain of quotes for a single expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteChain {
    /// Underlying symbol
    pub underlying: String,
    /// Expiry date
    pub expiry: NaiveDate,
    /// Call quotes by strike
    pub calls: Vec<OptionQuote>,
    /// Put quotes by strike
    pub puts: Vec<OptionQuote>,
}

impl QuoteChain {
    pub fn new(underlying: impl Into<String>, expiry: NaiveDate) -> Self {
        Self {
            underlying: underlying.into(),
            expiry,
            calls: Vec::new(),
            puts: Vec::new(),
        }
    }

    /// Add a call quote
    pub fn add_call(&mut self, quote: OptionQuote) {
        self.calls.push(quote);
        self.calls
            .sort_by(|a, b| a.contract.strike.total_cmp(&b.contract.strike));
    }

    /// Add a put quote
    pub fn add_put(&mut self, quote: OptionQuote) {
        self.puts.push(quote);
        self.puts
            .sort_by(|a, b| a.contract.strike.total_cmp(&b.contract.strike));
    }

    /// At-the-money implied volatility.
    ///
    /// Takes the two calls and the two puts whose strikes sit nearest to
    /// `spot` and averages whichever of their implied volatilities are
    /// reported. Returns `None` when none of them carries a finite value.
    pub fn atm_implied_vol(&self, spot: f64) -> Option<f64> {
        let vols: Vec<f64> = nearest_strikes(&self.calls, spot, ATM_STRIKES_PER_SIDE)
            .chain(nearest_strikes(&self.puts, spot, ATM_STRIKES_PER_SIDE))
            .filter_map(|q| q.implied_vol)
            .filter(|v| v.is_finite())
            .collect();

        if vols.is_empty() {
            return None;
        }
        Some(vols.iter().sum::<f64>() / vols.len() as f64)
    }

    /// Reduce this chain to the per-expiration input of the anchor builder
    pub fn to_expiration_quote(&self, spot: f64) -> OptionExpirationQuote {
        OptionExpirationQuote {
            expiration_date: self.expiry,
            atm_implied_volatility: self.atm_implied_vol(spot),
        }
    }
}

/// The `n` quotes with strikes closest to `spot`; ties keep strike order
fn nearest_strikes<'a>(
    quotes: &'a [OptionQuote],
    spot: f64,
    n: usize,
) -> impl Iterator<Item = &'a OptionQuote> {
    let mut by_distance: Vec<&OptionQuote> = quotes.iter().collect();
    by_distance.sort_by(|a, b| {
        a.contract
            .strike_distance(spot)
            .total_cmp(&b.contract.strike_distance(spot))
    });
    by_distance.into_iter().take(n)
}

/// One expiration as seen by the anchor builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionExpirationQuote {
    /// Expiration date
    pub expiration_date: NaiveDate,
    /// ATM implied volatility, `None` when the chain carried nothing usable
    pub atm_implied_volatility: Option<f64>,
}

impl OptionExpirationQuote {
    pub fn new(expiration_date: NaiveDate, atm_implied_volatility: Option<f64>) -> Self {
        Self {
            expiration_date,
            atm_implied_volatility,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    fn chain(calls: &[(f64, Option<f64>)], puts: &[(f64, Option<f64>)]) -> QuoteChain {
        let mut chain = QuoteChain::new("TEST", expiry());
        for &(k, iv) in calls {
            chain.add_call(OptionQuote::with_iv("TEST", k, expiry(), OptionType::Call, iv));
        }
        for &(k, iv) in puts {
            chain.add_put(OptionQuote::with_iv("TEST", k, expiry(), OptionType::Put, iv));
        }
        chain
    }

    #[test]
    fn test_atm_iv_uses_two_nearest_per_side() {
        // Far strikes carry wild vols that must not leak into the average
        let chain = chain(
            &[(80.0, Some(0.9)), (99.0, Some(0.20)), (101.0, Some(0.22)), (120.0, Some(0.9))],
            &[(80.0, Some(0.9)), (98.0, Some(0.24)), (102.0, Some(0.26)), (120.0, Some(0.9))],
        );

        let iv = chain.atm_implied_vol(100.0).unwrap();
        assert_abs_diff_eq!(iv, 0.23, epsilon = 1e-12);
    }

    #[test]
    fn test_atm_iv_skips_missing_values() {
        let chain = chain(
            &[(99.0, None), (101.0, Some(0.30))],
            &[(99.0, Some(f64::NAN)), (101.0, Some(0.20))],
        );

        let iv = chain.atm_implied_vol(100.0).unwrap();
        assert_abs_diff_eq!(iv, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_atm_iv_empty_chain() {
        let chain = QuoteChain::new("TEST", expiry());
        assert!(chain.atm_implied_vol(100.0).is_none());

        let quote = chain.to_expiration_quote(100.0);
        assert_eq!(quote.expiration_date, expiry());
        assert!(quote.atm_implied_volatility.is_none());
    }

    #[test]
    fn test_quotes_sorted_by_strike() {
        let chain = chain(&[(110.0, None), (90.0, None), (100.0, None)], &[]);
        let strikes: Vec<f64> = chain.calls.iter().map(|q| q.contract.strike).collect();
        assert_eq!(strikes, vec![90.0, 100.0, 110.0]);
    }
}
