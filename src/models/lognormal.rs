//! Normal and lognormal quantiles
//!
//! Provides:
//! - Standard normal inverse CDF
//! - Terminal price quantiles under zero-drift geometric Brownian motion
//!
//! With implied volatility σ as the diffusion parameter, the price at
//! time t (years) for standard-normal draw z is
//!
//! S_t = S_0 · exp(−σ²·t + σ·√t·z)

use statrs::distribution::{ContinuousCDF, Normal};

/// Standard normal inverse CDF z(q), q in (0, 1)
pub fn norm_ppf(q: f64) -> f64 {
    Normal::standard().inverse_cdf(q)
}

/// Projected price for one standard-normal score
pub fn gbm_quantile(spot: f64, vol: f64, time: f64, z: f64) -> f64 {
    spot * (-vol * vol * time + vol * time.sqrt() * z).exp()
}

/// Projected prices for a vector of standard-normal scores
pub fn gbm_quantiles(spot: f64, vol: f64, time: f64, z_scores: &[f64]) -> Vec<f64> {
    z_scores
        .iter()
        .map(|&z| gbm_quantile(spot, vol, time, z))
        .collect()
}
