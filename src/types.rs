//! Types for the crypto price dashboard

use crate::{constants::BASE_CURRENCY, error::ConfigError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A three-letter currency code, stored upper-case
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validates and normalizes a currency code
    pub fn new(code: &str) -> Result<Self, ConfigError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// US dollar, the base of the exchange rate snapshot
    pub fn usd() -> Self {
        Self(BASE_CURRENCY.to_string())
    }

    /// Upper-case ISO code (`ZAR`), used for rate lookup and formatting
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Lower-case code (`zar`), the form the market data API expects
    pub fn api_code(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Parameters of one market list fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    /// Currency the list is displayed in
    pub currency: Currency,
    /// Number of coins on the ranked page
    pub page_size: u32,
    /// Fetch a long-form description for every coin
    pub include_descriptions: bool,
    /// Request USD figures and convert them with the exchange rate snapshot
    pub convert_client_side: bool,
}

impl MarketQuery {
    /// Creates a query with descriptions and client-side conversion disabled
    pub fn new(currency: Currency, page_size: u32) -> Self {
        Self {
            currency,
            page_size,
            include_descriptions: false,
            convert_client_side: false,
        }
    }

    pub fn with_descriptions(mut self, include: bool) -> Self {
        self.include_descriptions = include;
        self
    }

    pub fn with_client_side_conversion(mut self, convert: bool) -> Self {
        self.convert_client_side = convert;
        self
    }
}

/// Parameters of one coin detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailQuery {
    /// Market data provider's coin identifier (`bitcoin`)
    pub id: String,
    pub currency: Currency,
    /// Read USD figures and convert them with the exchange rate snapshot
    pub convert_client_side: bool,
}

impl DetailQuery {
    pub fn new(id: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: id.into(),
            currency,
            convert_client_side: false,
        }
    }

    pub fn with_client_side_conversion(mut self, convert: bool) -> Self {
        self.convert_client_side = convert;
        self
    }
}

/// Direction of the 24h price move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    /// Change is zero or positive
    #[default]
    Up,
    /// Change is negative
    Down,
}

impl PriceDirection {
    /// Zero counts as up, matching the percentage sign convention
    pub fn from_change(change: Option<f64>) -> Self {
        match change {
            Some(value) if value < 0.0 => PriceDirection::Down,
            _ => PriceDirection::Up,
        }
    }
}

/// Display strings for a coin summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryDisplay {
    pub price: String,
    /// Absolute value of the 24h change; the sign lives in `direction`
    pub price_change: String,
    pub price_change_percentage: String,
    pub direction: PriceDirection,
    pub market_cap: String,
    pub total_volume: String,
    pub high_24h: String,
    pub low_24h: String,
    pub circulating_supply: String,
    pub ath: String,
    pub ath_date: String,
}

/// One row of the ranked market list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    pub id: String,
    /// Upper-cased ticker
    pub symbol: String,
    pub name: String,
    pub image: String,
    /// Currency every monetary field is expressed in
    pub currency: Currency,
    pub current_price: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub ath: Option<f64>,
    pub ath_date: Option<String>,
    pub last_updated: Option<String>,
    pub description: Option<String>,
    pub display: SummaryDisplay,
}

/// Display strings for the fields a detail adds to a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailDisplay {
    pub atl: String,
    pub atl_date: String,
    pub sentiment_votes_up: String,
    pub sentiment_votes_down: String,
}

/// Full detail for a single coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub summary: CoinSummary,
    pub atl: Option<f64>,
    pub atl_date: Option<String>,
    pub sentiment_votes_up_percentage: f64,
    pub sentiment_votes_down_percentage: f64,
    /// Empty when the coin lists no homepage
    pub homepage: String,
    /// Empty when the coin lists no explorer
    pub blockchain_site: String,
    pub display: DetailDisplay,
}

/// Point-in-time exchange rates relative to a base currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    pub base: String,
    pub timestamp: DateTime<Utc>,
    pub rates: HashMap<String, f64>,
    pub target: Currency,
    /// Only set when `rates` carries a usable rate for `target`
    pub target_rate: Option<f64>,
}

impl ExchangeRateSnapshot {
    /// Builds a snapshot and extracts the target rate
    pub fn new(
        base: String,
        timestamp: DateTime<Utc>,
        rates: HashMap<String, f64>,
        target: Currency,
    ) -> Self {
        let target_rate = rates
            .get(target.code())
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0);

        Self {
            base,
            timestamp,
            rates,
            target,
            target_rate,
        }
    }

    /// Converts a base-currency amount into the target currency
    ///
    /// Returns `None` when the snapshot has no rate for the target.
    pub fn to_target(&self, amount: f64) -> Option<f64> {
        self.target_rate.map(|rate| amount * rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(rates: &[(&str, f64)], target: &str) -> ExchangeRateSnapshot {
        ExchangeRateSnapshot::new(
            "USD".to_string(),
            Utc::now(),
            rates.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            Currency::new(target).unwrap(),
        )
    }

    #[test]
    fn test_currency_normalizes_case() {
        let currency = Currency::new("zar").unwrap();
        assert_eq!(currency.code(), "ZAR");
        assert_eq!(currency.api_code(), "zar");
    }

    #[test]
    fn test_currency_rejects_bad_codes() {
        assert!(Currency::new("rand").is_err());
        assert!(Currency::new("z4r").is_err());
        assert!(Currency::new("").is_err());
    }

    #[test]
    fn test_snapshot_converts_with_target_rate() {
        let snap = snapshot(&[("ZAR", 18.5), ("EUR", 0.92)], "ZAR");
        assert_eq!(snap.target_rate, Some(18.5));
        assert_eq!(snap.to_target(2.0), Some(37.0));
    }

    #[test]
    fn test_snapshot_without_target_is_unavailable() {
        let snap = snapshot(&[("EUR", 0.92)], "ZAR");
        assert_eq!(snap.target_rate, None);
        assert_eq!(snap.to_target(100.0), None);
    }

    #[test]
    fn test_direction_treats_zero_as_up() {
        assert_eq!(PriceDirection::from_change(Some(0.0)), PriceDirection::Up);
        assert_eq!(PriceDirection::from_change(Some(-0.5)), PriceDirection::Down);
        assert_eq!(PriceDirection::from_change(None), PriceDirection::Up);
    }
}
