//! Dashboard configuration
//!
//! Compile-time defaults live in [`crate::constants`]; environment variables
//! (optionally from a `.env` file) override them.

use crate::{
    constants::{
        COINGECKO_API_URL, DEFAULT_BIND_ADDR, DEFAULT_CURRENCY, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
        OPEN_EXCHANGE_RATES_URL,
    },
    error::ConfigError,
    format::NumberLocale,
    types::{Currency, DetailQuery, MarketQuery},
};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;

pub const ENV_CURRENCY: &str = "DASHBOARD_CURRENCY";
pub const ENV_PAGE_SIZE: &str = "DASHBOARD_PAGE_SIZE";
pub const ENV_INCLUDE_DESCRIPTIONS: &str = "DASHBOARD_INCLUDE_DESCRIPTIONS";
pub const ENV_CONVERT_CLIENT_SIDE: &str = "DASHBOARD_CONVERT_CLIENT_SIDE";
pub const ENV_LOCALE: &str = "DASHBOARD_LOCALE";
pub const ENV_BIND_ADDR: &str = "DASHBOARD_BIND_ADDR";
pub const ENV_COINGECKO_URL: &str = "COINGECKO_API_URL";
pub const ENV_EXCHANGE_RATES_URL: &str = "OPEN_EXCHANGE_RATES_URL";
pub const ENV_EXCHANGE_RATES_APP_ID: &str = "OPEN_EXCHANGE_RATES_APP_ID";

/// Runtime configuration of the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Currency every monetary figure is displayed in
    pub currency: Currency,
    /// Coins on the dashboard list
    pub page_size: u32,
    /// Fetch a description per listed coin
    pub include_descriptions: bool,
    /// Fetch USD figures and convert them with the exchange rate snapshot
    pub convert_client_side: bool,
    pub locale: NumberLocale,
    pub bind_addr: SocketAddr,
    pub coingecko_url: String,
    pub exchange_rates_url: String,
    /// Required only when `convert_client_side` is set
    pub exchange_rates_app_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: Currency::new(DEFAULT_CURRENCY).unwrap_or_else(|_| Currency::usd()),
            page_size: DEFAULT_PAGE_SIZE,
            include_descriptions: false,
            convert_client_side: false,
            locale: NumberLocale::default(),
            bind_addr: DEFAULT_BIND_ADDR,
            coingecko_url: COINGECKO_API_URL.to_string(),
            exchange_rates_url: OPEN_EXCHANGE_RATES_URL.to_string(),
            exchange_rates_app_id: None,
        }
    }
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    ///
    /// Unset and blank variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let currency = match get(ENV_CURRENCY) {
            Some(code) => Currency::new(&code)?,
            None => defaults.currency,
        };

        let page_size = match get(ENV_PAGE_SIZE) {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
                .ok_or_else(|| ConfigError::invalid_value(ENV_PAGE_SIZE, raw))?,
            None => defaults.page_size,
        };

        let include_descriptions = match get(ENV_INCLUDE_DESCRIPTIONS) {
            Some(raw) => parse_flag(ENV_INCLUDE_DESCRIPTIONS, &raw)?,
            None => defaults.include_descriptions,
        };

        let convert_client_side = match get(ENV_CONVERT_CLIENT_SIDE) {
            Some(raw) => parse_flag(ENV_CONVERT_CLIENT_SIDE, &raw)?,
            None => defaults.convert_client_side,
        };

        let locale = match get(ENV_LOCALE) {
            Some(tag) => NumberLocale::from_tag(&tag)
                .ok_or_else(|| ConfigError::invalid_value(ENV_LOCALE, tag))?,
            None => defaults.locale,
        };

        let bind_addr = match get(ENV_BIND_ADDR) {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::invalid_value(ENV_BIND_ADDR, raw.clone()))?,
            None => defaults.bind_addr,
        };

        let exchange_rates_app_id = get(ENV_EXCHANGE_RATES_APP_ID);
        if convert_client_side && exchange_rates_app_id.is_none() {
            return Err(ConfigError::MissingAppId);
        }

        Ok(Self {
            currency,
            page_size,
            include_descriptions,
            convert_client_side,
            locale,
            bind_addr,
            coingecko_url: get(ENV_COINGECKO_URL).unwrap_or(defaults.coingecko_url),
            exchange_rates_url: get(ENV_EXCHANGE_RATES_URL).unwrap_or(defaults.exchange_rates_url),
            exchange_rates_app_id,
        })
    }

    /// Query the dashboard list is fetched with
    pub fn market_query(&self) -> MarketQuery {
        MarketQuery::new(self.currency.clone(), self.page_size)
            .with_descriptions(self.include_descriptions)
            .with_client_side_conversion(self.convert_client_side)
    }

    /// Query for one coin's detail page
    pub fn detail_query(&self, id: &str) -> DetailQuery {
        DetailQuery::new(id, self.currency.clone())
            .with_client_side_conversion(self.convert_client_side)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(key, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.currency.code(), "ZAR");
        assert_eq!(config.page_size, 10);
        assert!(!config.include_descriptions);
        assert!(!config.convert_client_side);
        assert_eq!(config.locale, NumberLocale::EN_ZA);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(Config::default().bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.coingecko_url, COINGECKO_API_URL);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = config_from(&[
            (ENV_CURRENCY, "eur"),
            (ENV_PAGE_SIZE, "25"),
            (ENV_INCLUDE_DESCRIPTIONS, "yes"),
            (ENV_LOCALE, "en-US"),
            (ENV_BIND_ADDR, "0.0.0.0:8080"),
            (ENV_COINGECKO_URL, "http://localhost:9000"),
        ])
        .unwrap();

        assert_eq!(config.currency.code(), "EUR");
        assert_eq!(config.page_size, 25);
        assert!(config.include_descriptions);
        assert_eq!(config.locale, NumberLocale::EN_US);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.coingecko_url, "http://localhost:9000");

        let query = config.market_query();
        assert_eq!(query.page_size, 25);
        assert!(query.include_descriptions);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_eq!(
            config_from(&[(ENV_PAGE_SIZE, "0")]).unwrap_err(),
            ConfigError::invalid_value(ENV_PAGE_SIZE, "0")
        );
        assert!(config_from(&[(ENV_PAGE_SIZE, "251")]).is_err());
        assert!(config_from(&[(ENV_INCLUDE_DESCRIPTIONS, "maybe")]).is_err());
        assert_eq!(
            config_from(&[(ENV_CURRENCY, "rand")]).unwrap_err(),
            ConfigError::InvalidCurrency("rand".to_string())
        );
        assert!(config_from(&[(ENV_BIND_ADDR, "localhost")]).is_err());
    }

    #[test]
    fn test_client_side_conversion_requires_app_id() {
        assert_eq!(
            config_from(&[(ENV_CONVERT_CLIENT_SIDE, "true")]).unwrap_err(),
            ConfigError::MissingAppId
        );

        let config = config_from(&[
            (ENV_CONVERT_CLIENT_SIDE, "true"),
            (ENV_EXCHANGE_RATES_APP_ID, "abc123"),
        ])
        .unwrap();
        assert!(config.detail_query("bitcoin").convert_client_side);
    }
}
