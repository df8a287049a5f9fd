//! Projection Models
//!
//! Implements:
//! - Lognormal quantiles (normal quantile function, GBM price quantiles)
//! - Implied-volatility anchors from option expirations
//! - Natural cubic spline interpolation of anchors
//! - Trend adaptation and a linear trend forecaster
//! - Blending of the two paths

pub mod anchors;
pub mod blend;
pub mod lognormal;
pub mod regression;
pub mod spline;
pub mod trend;

pub use anchors::*;
pub use blend::*;
pub use lognormal::*;
pub use regression::*;
pub use spline::*;
pub use trend::*;
