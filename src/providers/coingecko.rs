//! CoinGecko market data provider implementation

use crate::{
    constants::{COINGECKO_API_URL, COINGECKO_COIN_ENDPOINT, COINGECKO_MARKETS_ENDPOINT},
    error::ProviderError,
    provider::MarketDataProvider,
    types::Currency,
    wire::{CoinResponse, MarketCoin},
};
use async_trait::async_trait;
use reqwest::{Client, Url};

use super::{build_client, send_json};

/// CoinGecko market data provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    coins_url: Url,
}

impl CoinGeckoProvider {
    /// Creates a provider against the public CoinGecko API
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(COINGECKO_API_URL)
    }

    /// Creates a provider against another CoinGecko-compatible host
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let coins_url = Url::parse(&format!("{}{}", base_url, COINGECKO_COIN_ENDPOINT))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ProviderError::InvalidUrl(base_url.clone()))?;

        Ok(Self {
            client: build_client()?,
            base_url,
            coins_url,
        })
    }

    /// Coin ids come from request paths, so they go in as one encoded segment
    fn coin_url(&self, id: &str) -> Result<Url, ProviderError> {
        let mut url = self.coins_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.base_url.clone()))?
            .push(id);
        Ok(url)
    }

    /// Query parameters for the ranked markets page
    fn markets_query(vs_currency: &Currency, page_size: u32) -> Vec<(&'static str, String)> {
        vec![
            ("vs_currency", vs_currency.api_code()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", page_size.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ]
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    async fn fetch_markets(
        &self,
        vs_currency: &Currency,
        page_size: u32,
    ) -> Result<Vec<MarketCoin>, ProviderError> {
        let url = format!("{}{}", self.base_url, COINGECKO_MARKETS_ENDPOINT);
        tracing::debug!(%url, currency = %vs_currency, page_size, "Fetching markets from CoinGecko");

        let request = self
            .client
            .get(&url)
            .query(&Self::markets_query(vs_currency, page_size));
        let coins: Vec<MarketCoin> = send_json(request, COINGECKO_MARKETS_ENDPOINT).await?;

        tracing::debug!(count = coins.len(), "Fetched markets from CoinGecko");
        Ok(coins)
    }

    async fn fetch_coin(&self, id: &str) -> Result<CoinResponse, ProviderError> {
        let endpoint = format!("{}/{}", COINGECKO_COIN_ENDPOINT, id);
        let url = self.coin_url(id)?;
        tracing::debug!(%url, "Fetching coin from CoinGecko");

        send_json(self.client.get(url), &endpoint).await
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}
