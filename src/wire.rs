//! Wire types for the upstream REST APIs.
//!
//! These mirror the JSON the providers return. Normalization into display
//! records happens in the fetchers, never here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-currency figures keyed by lower-case currency code
pub type CurrencyMap<T> = HashMap<String, Option<T>>;

/// Deserializes `null` as the type's default.
pub mod null_default {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// Deserializes a Unix-seconds integer into `DateTime<Utc>`.
pub mod timestamp_secs {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = i64::deserialize(deserializer)?;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid timestamp: {}", secs)))
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp())
    }
}

/// One entry of the ranked markets page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub image: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub ath: Option<f64>,
    pub ath_date: Option<String>,
    pub last_updated: Option<String>,
}

/// Full coin document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoinResponse {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageLinks>,
    #[serde(default)]
    pub market_data: Option<CoinMarketData>,
    #[serde(default)]
    pub links: Option<CoinLinks>,
    #[serde(default)]
    pub description: Option<CoinDescription>,
    pub sentiment_votes_up_percentage: Option<f64>,
    pub sentiment_votes_down_percentage: Option<f64>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageLinks {
    pub thumb: Option<String>,
    pub small: Option<String>,
    pub large: Option<String>,
}

/// Market figures, mostly keyed by currency.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoinMarketData {
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub current_price: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub market_cap: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub total_volume: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub high_24h: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub low_24h: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub ath: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub ath_date: CurrencyMap<String>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub atl: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub atl_date: CurrencyMap<String>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub price_change_24h_in_currency: CurrencyMap<f64>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub price_change_percentage_24h_in_currency: CurrencyMap<f64>,
    pub circulating_supply: Option<f64>,
    pub market_cap_rank: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoinLinks {
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub homepage: Vec<Option<String>>,
    #[serde(default, deserialize_with = "null_default::deserialize")]
    pub blockchain_site: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoinDescription {
    pub en: Option<String>,
}

impl CoinResponse {
    /// English description, `None` when missing or blank
    pub fn description_en(&self) -> Option<String> {
        self.description
            .as_ref()
            .and_then(|d| d.en.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}

/// Open Exchange Rates `/latest.json` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestRatesResponse {
    pub base: String,
    #[serde(with = "timestamp_secs")]
    pub timestamp: DateTime<Utc>,
    pub rates: HashMap<String, f64>,
}
