//! Core data types for the projection engine
//!
//! Defines fundamental types:
//! - OptionContract / QuoteChain: option chains and ATM IV reduction
//! - MarketSnapshot: current price and close history
//! - QuantileSet: probability levels of the fan
//! - Anchor / AnchorSet / QuantileCurveFamily: sparse and dense curves
//! - ForecastMode / TrendForecast: model selection and trend input

pub mod option;
pub mod quote;
pub mod snapshot;
pub mod quantile;
pub mod curve;
pub mod forecast;
pub mod error;

pub use option::*;
pub use quote::*;
pub use snapshot::*;
pub use quantile::*;
pub use curve::*;
pub use forecast::*;
pub use error::*;
