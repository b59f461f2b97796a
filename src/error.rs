//! Error types for the crypto price dashboard

use thiserror::Error;

/// Errors that can occur while fetching from an upstream provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed before a response arrived
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("Failed to fetch {endpoint}: HTTP {status}")]
    HttpStatus { status: u16, endpoint: String },

    /// The chain was cancelled by its caller or superseded by a newer one
    #[error("Request cancelled")]
    Cancelled,

    /// The coin has no figures for the requested currency
    #[error("Unsupported currency {currency} for coin {coin}")]
    UnsupportedCurrency { coin: String, currency: String },

    /// The exchange rate snapshot does not carry the target currency
    #[error("No exchange rate available for {currency}")]
    MissingRate { currency: String },

    /// A configured base URL cannot take path segments
    #[error("Invalid base URL {0:?}")]
    InvalidUrl(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Creates an HttpStatus error
    pub fn http_status(status: u16, endpoint: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            endpoint: endpoint.into(),
        }
    }

    /// Creates an UnsupportedCurrency error
    pub fn unsupported_currency(coin: &str, currency: &str) -> Self {
        Self::UnsupportedCurrency {
            coin: coin.to_string(),
            currency: currency.to_string(),
        }
    }

    /// True when the upstream reported that the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 404, .. })
    }

    /// True for user-initiated or supersede cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised while assembling configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Currency codes are three ASCII letters
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// An environment variable held something that does not parse
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// Client-side conversion needs an exchange rate API key
    #[error("OPEN_EXCHANGE_RATES_APP_ID is required when client-side conversion is enabled")]
    MissingAppId,
}

impl ConfigError {
    /// Creates an InvalidValue error
    pub fn invalid_value(key: &str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Top-level errors surfaced by the dashboard binary
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
