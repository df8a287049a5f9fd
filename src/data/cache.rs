//! Local data caching
//!
//! Caches market bundles locally to reduce API calls and enable offline analysis.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::core::{
    MarketSnapshot, OptionExpirationQuote, ProjectionError, ProjectionResult,
};

use super::provider::{MarketBundle, MarketDataProvider};

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Cache directory
    pub cache_dir: PathBuf,
    /// Maximum age before refresh (in hours)
    pub max_age_hours: i64,
    /// Whether to use cache
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./data/cache"),
            max_age_hours: 4,
            enabled: true,
        }
    }
}

/// Data cache manager
pub struct DataCache {
    config: CacheConfig,
}

impl DataCache {
    pub fn new(config: CacheConfig) -> ProjectionResult<Self> {
        if config.enabled && !config.cache_dir.exists() {
            fs::create_dir_all(&config.cache_dir)?;
        }

        Ok(Self { config })
    }

    /// Cache file for a symbol and request shape
    fn cache_key(&self, symbol: &str, key: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{}_{}.json", symbol, key))
    }

    /// Fresh enough to reuse
    fn is_fresh(&self, fetched_at: DateTime<Utc>) -> bool {
        Utc::now() - fetched_at < Duration::hours(self.config.max_age_hours)
    }

    /// Save a bundle to cache
    pub fn save_bundle(&self, key: &str, bundle: &MarketBundle) -> ProjectionResult<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let path = self.cache_key(&bundle.symbol, key);
        bundle.to_json_file(&path)?;

        tracing::info!("Cached {} at {:?}", bundle.symbol, path);
        Ok(())
    }

    /// Load a bundle from cache if present and not expired.
    /// An unreadable entry counts as a miss.
    pub fn load_bundle(&self, symbol: &str, key: &str) -> ProjectionResult<Option<MarketBundle>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let path = self.cache_key(symbol, key);
        if !path.exists() {
            return Ok(None);
        }

        let bundle = match MarketBundle::from_json_file(&path) {
            Ok(bundle) => bundle,
            Err(ProjectionError::Serialization(e)) => {
                tracing::warn!("Ignoring corrupt cache entry {:?}: {}", path, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if !self.is_fresh(bundle.fetched_at) {
            return Ok(None);
        }

        tracing::info!("Loaded {} from cache", symbol);
        Ok(Some(bundle))
    }

    /// Clear cache for a symbol
    pub fn clear(&self, symbol: &str) -> ProjectionResult<()> {
        if !self.config.cache_dir.exists() {
            return Ok(());
        }

        let prefix = format!("{}_", symbol);
        for entry in fs::read_dir(&self.config.cache_dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();

            if file_name.starts_with(&prefix) && file_name.ends_with(".json") {
                fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }
}

/// Provider wrapper that serves bundles from the cache when it can
pub struct CachedProvider<P> {
    cache: DataCache,
    inner: P,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, config: CacheConfig) -> ProjectionResult<Self> {
        Ok(Self {
            cache: DataCache::new(config)?,
            inner,
        })
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn bundle_key(window_days: u32, max_day_offset: Option<i64>) -> String {
        match max_day_offset {
            Some(max) => format!("{}d_opt{}", window_days, max),
            None => format!("{}d", window_days),
        }
    }

    /// Force refresh (bypass cache)
    pub fn refresh(
        &self,
        symbol: &str,
        window_days: u32,
        max_day_offset: Option<i64>,
    ) -> ProjectionResult<MarketBundle> {
        self.cache.clear(symbol)?;
        self.fetch_bundle(symbol, window_days, max_day_offset)
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn snapshot(&self, symbol: &str, window_days: u32) -> ProjectionResult<MarketSnapshot> {
        self.fetch_bundle(symbol, window_days, None).map(|b| b.snapshot)
    }

    fn expiration_quotes(
        &self,
        symbol: &str,
        spot: f64,
        valuation_date: NaiveDate,
        max_day_offset: i64,
    ) -> ProjectionResult<Vec<OptionExpirationQuote>> {
        self.inner
            .expiration_quotes(symbol, spot, valuation_date, max_day_offset)
    }

    fn fetch_bundle(
        &self,
        symbol: &str,
        window_days: u32,
        max_day_offset: Option<i64>,
    ) -> ProjectionResult<MarketBundle> {
        let key = Self::bundle_key(window_days, max_day_offset);
        if let Some(bundle) = self.cache.load_bundle(symbol, &key)? {
            return Ok(bundle);
        }

        tracing::info!("Fetching fresh data for {}", symbol);
        let bundle = self.inner.fetch_bundle(symbol, window_days, max_day_offset)?;
        self.cache.save_bundle(&key, &bundle)?;
        Ok(bundle)
    }
}
