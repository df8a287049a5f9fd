//! Error types for the projection engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Ticker data unavailable: {0}")]
    NoMarketData(String),

    #[error("Trend forecast unavailable: {0}")]
    TrendUnavailable(String),

    #[error("Invalid anchors: {0}")]
    InvalidAnchors(String),

    #[error("Quantile curves cross at rank {rank}, day {day}: {lower} > {upper}")]
    NumericalAnomaly {
        rank: usize,
        day: usize,
        lower: f64,
        upper: f64,
    },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Invalid forecast mode: {0}")]
    InvalidMode(String),

    #[error("Deadline exceeded during {0}")]
    DeadlineExceeded(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;

impl ProjectionError {
    pub fn no_market_data(msg: impl Into<String>) -> Self {
        Self::NoMarketData(msg.into())
    }

    pub fn trend_unavailable(msg: impl Into<String>) -> Self {
        Self::TrendUnavailable(msg.into())
    }

    pub fn invalid_anchors(msg: impl Into<String>) -> Self {
        Self::InvalidAnchors(msg.into())
    }

    pub fn model_unavailable(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Message suitable for an end user. Internal failures are not spelled out.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoMarketData(_) => "ticker data unavailable".to_string(),
            Self::TrendUnavailable(_) => "trend forecast unavailable for this ticker".to_string(),
            Self::InvalidMode(m) => format!("unknown forecast mode '{}'", m),
            Self::InvalidInput(m) => m.clone(),
            Self::DeadlineExceeded(_) => "request timed out, please try again".to_string(),
            Self::Network(_) => "market data source is not reachable".to_string(),
            _ => "internal error while building the projection".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = ProjectionError::NumericalAnomaly {
            rank: 3,
            day: 12,
            lower: 101.0,
            upper: 100.5,
        };
        let text = err.to_string();
        assert!(text.contains("rank 3"));
        assert!(text.contains("day 12"));
    }

    #[test]
    fn test_user_message() {
        let err = ProjectionError::no_market_data("no closes for XYZ");
        assert_eq!(err.user_message(), "ticker data unavailable");

        let err = ProjectionError::invalid_anchors("offsets not increasing");
        assert!(err.user_message().starts_with("internal error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProjectionError>();
    }
}
