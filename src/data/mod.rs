//! Data fetching and storage
//!
//! Handles:
//! - The provider seam the engine's inputs come through
//! - Yahoo Finance API for closes and option chains (free)
//! - Local caching and offline bundles

pub mod cache;
pub mod provider;
pub mod yahoo;

pub use cache::*;
pub use provider::*;
pub use yahoo::*;
