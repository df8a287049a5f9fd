//! Implied-volatility anchor builder
//!
//! Turns one ATM implied volatility per option expiration into a vector of
//! lognormal price quantiles at that expiration's day offset. Each quote
//! gets an explicit outcome so skipped expirations stay inspectable.

use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    Anchor, AnchorSet, MarketSnapshot, OptionExpirationQuote, ProjectionError, ProjectionResult,
    QuantileSet,
};

use super::lognormal::gbm_quantiles;

/// Why an expiration contributed no anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Expires on or before the valuation date
    Expired,
    /// No implied volatility was reported
    MissingVolatility,
    /// Implied volatility is NaN or infinite
    NonFiniteVolatility,
    /// Implied volatility is exactly zero
    ZeroVolatility,
    /// Implied volatility is below zero
    NegativeVolatility,
    /// Another expiration already produced an anchor at this offset
    DuplicateOffset,
}

/// What happened to one expiration during the scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum QuoteDisposition {
    Used,
    Skipped(SkipReason),
}

/// Scan outcome for one expiration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteOutcome {
    pub expiration_date: NaiveDate,
    pub day_offset: i64,
    pub disposition: QuoteDisposition,
}

/// Anchors plus the per-expiration scan report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorScan {
    pub anchors: AnchorSet,
    pub outcomes: Vec<QuoteOutcome>,
    /// Expirations never examined because an earlier one passed the cutoff
    pub not_scanned: usize,
    /// True when no usable expiration was found and a flat anchor was added
    pub used_fallback: bool,
}

impl AnchorScan {
    /// Number of expirations that produced an anchor
    pub fn used(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.disposition == QuoteDisposition::Used)
            .count()
    }

    /// Outcomes that were skipped, with their reason
    pub fn skipped(&self) -> impl Iterator<Item = (&QuoteOutcome, SkipReason)> {
        self.outcomes.iter().filter_map(|o| match o.disposition {
            QuoteDisposition::Skipped(reason) => Some((o, reason)),
            QuoteDisposition::Used => None,
        })
    }
}

/// Options controlling the anchor scan
#[derive(Debug, Clone, Copy)]
pub struct AnchorParams {
    /// Expirations further than `horizon + lookahead` days end the scan
    pub expiry_lookahead_days: u32,
    /// Day-count basis for converting offsets to years
    pub days_per_year: f64,
}

impl Default for AnchorParams {
    fn default() -> Self {
        Self {
            expiry_lookahead_days: 15,
            days_per_year: 365.0,
        }
    }
}

/// Classify an implied volatility; `Ok` carries the usable value
fn check_volatility(iv: Option<f64>) -> Result<f64, SkipReason> {
    match iv {
        None => Err(SkipReason::MissingVolatility),
        Some(v) if !v.is_finite() => Err(SkipReason::NonFiniteVolatility),
        Some(v) if v == 0.0 => Err(SkipReason::ZeroVolatility),
        Some(v) if v < 0.0 => Err(SkipReason::NegativeVolatility),
        Some(v) => Ok(v),
    }
}

/// Build implied-volatility anchors for a projection.
///
/// Expirations are visited in date order. The day-0 anchor sits at the
/// current price; each usable expiration adds the lognormal quantiles at
/// its day offset. If nothing usable is found, a flat anchor at
/// `horizon_days` keeps the projection at the current price.
pub fn build_iv_anchors(
    snapshot: &MarketSnapshot,
    horizon_days: u32,
    quantiles: &QuantileSet,
    expirations: &[OptionExpirationQuote],
    params: &AnchorParams,
    deadline: Option<Instant>,
) -> ProjectionResult<AnchorScan> {
    snapshot.validate()?;
    if horizon_days == 0 {
        return Err(ProjectionError::invalid_input("horizon must be at least one day"));
    }

    let spot = snapshot.current_price;
    let z_scores = quantiles.z_scores();
    let cutoff = horizon_days as i64 + params.expiry_lookahead_days as i64;

    let mut sorted: Vec<&OptionExpirationQuote> = expirations.iter().collect();
    sorted.sort_by_key(|q| q.expiration_date);

    let mut anchors = AnchorSet::starting_at(spot, quantiles.len());
    let mut outcomes = Vec::with_capacity(sorted.len());
    let mut not_scanned = 0;

    for (idx, quote) in sorted.iter().enumerate() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ProjectionError::DeadlineExceeded("expiration scan"));
        }

        let day_offset = (quote.expiration_date - snapshot.valuation_date).num_days();
        if day_offset > cutoff {
            not_scanned = sorted.len() - idx;
            tracing::debug!(
                "Stopping scan at {} ({} days > cutoff {})",
                quote.expiration_date,
                day_offset,
                cutoff
            );
            break;
        }

        let disposition = if day_offset <= 0 {
            QuoteDisposition::Skipped(SkipReason::Expired)
        } else if anchors.contains_offset(day_offset as u32) {
            QuoteDisposition::Skipped(SkipReason::DuplicateOffset)
        } else {
            match check_volatility(quote.atm_implied_volatility) {
                Ok(vol) => {
                    let time = day_offset as f64 / params.days_per_year;
                    let prices = gbm_quantiles(spot, vol, time, &z_scores);
                    anchors.push(Anchor::new(day_offset as u32, prices))?;
                    QuoteDisposition::Used
                }
                Err(reason) => QuoteDisposition::Skipped(reason),
            }
        };

        if let QuoteDisposition::Skipped(reason) = disposition {
            tracing::debug!("Skipping expiration {}: {:?}", quote.expiration_date, reason);
        }

        outcomes.push(QuoteOutcome {
            expiration_date: quote.expiration_date,
            day_offset,
            disposition,
        });
    }

    let used_fallback = anchors.len() < 2;
    if used_fallback {
        tracing::info!(
            "No usable option expirations, projecting flat at {:.2} to day {}",
            spot,
            horizon_days
        );
        anchors.push(Anchor::flat(horizon_days, spot, quantiles.len()))?;
    } else {
        tracing::info!(
            "Built {} implied-volatility anchors out to day {}",
            anchors.len(),
            anchors.last_offset()
        );
    }

    Ok(AnchorScan {
        anchors,
        outcomes,
        not_scanned,
        used_fallback,
    })
}
