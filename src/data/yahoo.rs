//! Yahoo Finance data fetcher
//!
//! Daily closes from the v8 chart endpoint and option chains from the v7
//! options endpoint. Uses Yahoo Finance's unofficial API.
//!
//! Note: This is for educational/research purposes. Yahoo Finance
//! data is delayed ~15 minutes and intended for personal use.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::{
    MarketSnapshot, OptionContract, OptionExpirationQuote, OptionQuote, OptionType, PriceBar,
    ProjectionError, ProjectionResult, QuoteChain,
};

use super::provider::MarketDataProvider;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance API client
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> ProjectionResult<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against another host, e.g. a local mirror
    pub fn with_base_url(base_url: impl Into<String>) -> ProjectionResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .map_err(|e| ProjectionError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> ProjectionResult<T> {
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProjectionError::Network(e.to_string()))?
            .json()
            .map_err(|e| ProjectionError::data(format!("Failed to parse {}: {}", what, e)))
    }

    /// Daily closes over the last `window_days` calendar days
    pub fn get_history(&self, symbol: &str, window_days: u32) -> ProjectionResult<MarketSnapshot> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(window_days as i64);
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            symbol,
            start.timestamp(),
            end.timestamp()
        );

        let response: YahooChartResponse = self.get_json(&url, "chart")?;
        snapshot_from_chart(symbol, response)
    }

    /// Get available option expiration dates
    pub fn get_expirations(&self, symbol: &str) -> ProjectionResult<Vec<NaiveDate>> {
        let url = format!("{}/v7/finance/options/{}", self.base_url, symbol);
        let response: YahooOptionsResponse = self.get_json(&url, "options")?;

        let chain = response
            .option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ProjectionError::data(format!("No options data returned for {}", symbol)))?;

        Ok(chain
            .expiration_dates
            .iter()
            .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
            .collect())
    }

    /// Get option chain for a specific expiration
    pub fn get_option_chain(&self, symbol: &str, expiry: NaiveDate) -> ProjectionResult<QuoteChain> {
        let expiry_ts = expiry.and_time(NaiveTime::MIN).and_utc().timestamp();
        let url = format!(
            "{}/v7/finance/options/{}?date={}",
            self.base_url, symbol, expiry_ts
        );

        let response: YahooOptionsResponse = self.get_json(&url, "options")?;
        chain_from_response(symbol, expiry, response)
    }
}

impl MarketDataProvider for YahooClient {
    fn snapshot(&self, symbol: &str, window_days: u32) -> ProjectionResult<MarketSnapshot> {
        self.get_history(symbol, window_days)
    }

    fn expiration_quotes(
        &self,
        symbol: &str,
        spot: f64,
        valuation_date: NaiveDate,
        max_day_offset: i64,
    ) -> ProjectionResult<Vec<OptionExpirationQuote>> {
        let expiries = match self.get_expirations(symbol) {
            Ok(expiries) => expiries,
            Err(e) => {
                // No listed options is not fatal; the engine falls back flat
                tracing::warn!("No option expirations for {}: {}", symbol, e);
                return Ok(Vec::new());
            }
        };

        let mut quotes = Vec::new();
        for expiry in expiries {
            let offset = (expiry - valuation_date).num_days();
            if offset <= 0 {
                continue;
            }
            if offset > max_day_offset {
                break;
            }

            match self.get_option_chain(symbol, expiry) {
                Ok(chain) => quotes.push(chain.to_expiration_quote(spot)),
                Err(e) => {
                    tracing::warn!("Failed to get chain for {}: {}", expiry, e);
                    quotes.push(OptionExpirationQuote::new(expiry, None));
                }
            }
        }

        tracing::info!("Fetched {} option expirations for {}", quotes.len(), symbol);
        Ok(quotes)
    }
}

/// Build a snapshot from a chart response, dropping days with no close
fn snapshot_from_chart(symbol: &str, response: YahooChartResponse) -> ProjectionResult<MarketSnapshot> {
    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProjectionError::no_market_data(format!("no chart data for {}", symbol)))?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let bars: Vec<PriceBar> = result
        .timestamp
        .unwrap_or_default()
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            Some(PriceBar::new(date, close))
        })
        .collect();

    if bars.is_empty() {
        return Err(ProjectionError::no_market_data(format!("no closes for {}", symbol)));
    }

    let mut snapshot = MarketSnapshot::from_closes(bars)?;
    if let Some(price) = result.meta.regular_market_price.filter(|p| p.is_finite() && *p > 0.0) {
        snapshot.current_price = price;
    }
    Ok(snapshot)
}

fn chain_from_response(
    symbol: &str,
    expiry: NaiveDate,
    response: YahooOptionsResponse,
) -> ProjectionResult<QuoteChain> {
    let chain_data = response
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| ProjectionError::data("No options data returned"))?;

    let mut chain = QuoteChain::new(symbol, expiry);
    if let Some(options) = chain_data.options.first() {
        for call in &options.calls {
            if let Some(quote) = convert_option_quote(call, symbol, expiry, OptionType::Call) {
                chain.add_call(quote);
            }
        }
        for put in &options.puts {
            if let Some(quote) = convert_option_quote(put, symbol, expiry, OptionType::Put) {
                chain.add_put(quote);
            }
        }
    }

    Ok(chain)
}

/// Convert Yahoo option data to our quote format
fn convert_option_quote(
    data: &YahooOptionData,
    underlying: &str,
    expiry: NaiveDate,
    option_type: OptionType,
) -> Option<OptionQuote> {
    let strike = data.strike?;

    let mut contract = OptionContract::new(underlying, strike, expiry, option_type);
    contract.symbol = data.contract_symbol.clone();

    let mut quote = OptionQuote::new(contract);
    quote.bid = data.bid;
    quote.ask = data.ask;
    quote.last = data.last_price;
    quote.volume = data.volume.and_then(|v| u64::try_from(v).ok());
    quote.open_interest = data.open_interest.and_then(|oi| u64::try_from(oi).ok());
    quote.implied_vol = data.implied_volatility;

    Some(quote)
}

// Yahoo Finance API response structures

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    meta: YahooChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: YahooOptionChain,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChain {
    result: Vec<YahooOptionChainData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<YahooOptions>,
}

#[derive(Debug, Deserialize)]
struct YahooOptions {
    #[serde(default)]
    calls: Vec<YahooOptionData>,
    #[serde(default)]
    puts: Vec<YahooOptionData>,
}

#[derive(Debug, Deserialize)]
struct YahooOptionData {
    #[serde(rename = "contractSymbol")]
    contract_symbol: Option<String>,
    strike: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    #[serde(rename = "lastPrice")]
    last_price: Option<f64>,
    volume: Option<i64>,
    #[serde(rename = "openInterest")]
    open_interest: Option<i64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const CHART_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"regularMarketPrice": 187.5},
                "timestamp": [1735828200, 1735914600, 1736173800, 1736260200],
                "indicators": {"quote": [{"close": [180.0, null, 184.0, 186.0]}]}
            }],
            "error": null
        }
    }"#;

    const OPTIONS_JSON: &str = r#"{
        "optionChain": {
            "result": [{
                "expirationDates": [1737072000, 1737676800],
                "options": [{
                    "calls": [
                        {"contractSymbol": "X250117C00180000", "strike": 180.0, "impliedVolatility": 0.30},
                        {"strike": 185.0, "impliedVolatility": 0.28},
                        {"strike": 190.0, "impliedVolatility": 0.26},
                        {"impliedVolatility": 0.99}
                    ],
                    "puts": [
                        {"strike": 185.0, "impliedVolatility": 0.32},
                        {"strike": 190.0, "impliedVolatility": 0.34},
                        {"strike": 150.0, "impliedVolatility": 0.90}
                    ]
                }]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_chart_skips_null_closes() {
        let response: YahooChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let snapshot = snapshot_from_chart("X", response).unwrap();

        assert_eq!(snapshot.historical_closes.len(), 3);
        assert_eq!(snapshot.current_price, 187.5);
        assert_eq!(snapshot.valuation_date, NaiveDate::from_ymd_opt(2025, 1, 7).unwrap());
    }

    #[test]
    fn test_empty_chart_is_no_market_data() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found"}}}"#;
        let response: YahooChartResponse = serde_json::from_str(json).unwrap();
        let err = snapshot_from_chart("NOPE", response).unwrap_err();
        assert!(matches!(err, ProjectionError::NoMarketData(_)));
    }

    #[test]
    fn test_chain_reduces_to_atm_iv() {
        let expiry = NaiveDate::from_ymd_opt(2025, 1, 17).unwrap();
        let response: YahooOptionsResponse = serde_json::from_str(OPTIONS_JSON).unwrap();
        let chain = chain_from_response("X", expiry, response).unwrap();

        // Quote without a strike is dropped
        assert_eq!(chain.calls.len(), 3);
        assert_eq!(chain.puts.len(), 3);

        // Nearest to 186: calls 185, 190; puts 185, 190
        let quote = chain.to_expiration_quote(186.0);
        assert_abs_diff_eq!(
            quote.atm_implied_volatility.unwrap(),
            (0.28 + 0.26 + 0.32 + 0.34) / 4.0,
            epsilon = 1e-12
        );
    }

    #[test]
    #[ignore] // Requires network
    fn test_get_history() {
        let client = YahooClient::new().unwrap();
        let snapshot = client.get_history("SPY", 30).unwrap();

        assert!(snapshot.current_price > 0.0);
        println!("SPY: {} closes", snapshot.historical_closes.len());
    }

    #[test]
    #[ignore] // Requires network
    fn test_expiration_quotes() {
        let client = YahooClient::new().unwrap();
        let snapshot = client.get_history("SPY", 30).unwrap();
        let quotes = client
            .expiration_quotes("SPY", snapshot.current_price, snapshot.valuation_date, 45)
            .unwrap();

        println!("SPY expirations: {:?}", quotes);
        assert!(!quotes.is_empty());
    }
}
