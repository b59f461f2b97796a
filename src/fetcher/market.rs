//! Market data fetcher for the ranked coin list

use crate::{
    error::ProviderError,
    format::Formatter,
    provider::{with_cancellation, MarketDataProvider},
    types::{CoinSummary, Currency, MarketQuery, SummaryDisplay},
    wire::MarketCoin,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{summary_display, Conversion, ExchangeRateFetcher};

/// Retrieves a ranked page of coins and normalizes it for display
pub struct MarketDataFetcher {
    provider: Arc<dyn MarketDataProvider>,
    rates: Option<Arc<ExchangeRateFetcher>>,
    formatter: Formatter,
}

impl MarketDataFetcher {
    /// Creates a fetcher that relies on the provider quoting the target currency
    pub fn new(provider: Arc<dyn MarketDataProvider>, formatter: Formatter) -> Self {
        Self {
            provider,
            rates: None,
            formatter,
        }
    }

    /// Enables client-side conversion for queries that ask for it
    pub fn with_exchange_rates(mut self, rates: Arc<ExchangeRateFetcher>) -> Self {
        self.rates = Some(rates);
        self
    }

    /// Fetches one ranked page
    ///
    /// A failing markets request fails the chain. A failing description
    /// request only leaves that coin without a description.
    pub async fn fetch(
        &self,
        query: &MarketQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CoinSummary>, ProviderError> {
        let (coins, conversion) = self.fetch_markets(query, cancel).await?;

        let descriptions = if query.include_descriptions {
            self.fetch_descriptions(&coins, cancel).await?
        } else {
            vec![None; coins.len()]
        };

        let summaries: Vec<CoinSummary> = coins
            .into_iter()
            .zip(descriptions)
            .map(|(coin, description)| {
                self.normalize(coin, description, &query.currency, conversion)
            })
            .collect();

        tracing::debug!(
            provider = self.provider.provider_name(),
            currency = %query.currency,
            count = summaries.len(),
            "Market list normalized"
        );

        Ok(summaries)
    }

    async fn fetch_markets(
        &self,
        query: &MarketQuery,
        cancel: &CancellationToken,
    ) -> Result<(Vec<MarketCoin>, Conversion), ProviderError> {
        if !query.convert_client_side {
            let coins = with_cancellation(
                cancel,
                self.provider.fetch_markets(&query.currency, query.page_size),
            )
            .await?;
            return Ok((coins, Conversion::Identity));
        }

        let rates = self.rates.as_ref().ok_or_else(|| ProviderError::MissingRate {
            currency: query.currency.to_string(),
        })?;
        let usd = Currency::usd();

        let (coins, snapshot) = tokio::try_join!(
            with_cancellation(cancel, self.provider.fetch_markets(&usd, query.page_size)),
            rates.fetch(&query.currency, cancel),
        )?;

        let rate = snapshot
            .target_rate
            .ok_or_else(|| ProviderError::MissingRate {
                currency: query.currency.to_string(),
            })?;

        Ok((coins, Conversion::Rate(rate)))
    }

    /// Fetches every coin's description concurrently, joined by position
    async fn fetch_descriptions(
        &self,
        coins: &[MarketCoin],
        cancel: &CancellationToken,
    ) -> Result<Vec<Option<String>>, ProviderError> {
        let requests = coins
            .iter()
            .map(|coin| with_cancellation(cancel, self.provider.fetch_coin(&coin.id)));
        let results = join_all(requests).await;

        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        Ok(results
            .into_iter()
            .zip(coins)
            .map(|(result, coin)| match result {
                Ok(detail) => detail.description_en(),
                Err(e) => {
                    tracing::warn!(coin = %coin.id, error = %e, "Description unavailable");
                    None
                }
            })
            .collect())
    }

    fn normalize(
        &self,
        coin: MarketCoin,
        description: Option<String>,
        currency: &Currency,
        conversion: Conversion,
    ) -> CoinSummary {
        let mut summary = CoinSummary {
            symbol: coin.symbol.to_uppercase(),
            id: coin.id,
            name: coin.name,
            image: coin.image,
            currency: currency.clone(),
            current_price: conversion.apply(coin.current_price),
            price_change_24h: conversion.apply(coin.price_change_24h),
            price_change_percentage_24h: coin.price_change_percentage_24h,
            market_cap: conversion.apply(coin.market_cap),
            total_volume: conversion.apply(coin.total_volume),
            market_cap_rank: coin.market_cap_rank,
            high_24h: conversion.apply(coin.high_24h),
            low_24h: conversion.apply(coin.low_24h),
            circulating_supply: coin.circulating_supply,
            ath: conversion.apply(coin.ath),
            ath_date: coin.ath_date,
            last_updated: coin.last_updated,
            description,
            display: SummaryDisplay::default(),
        };
        summary.display = summary_display(&self.formatter, &summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLACEHOLDER;
    use crate::provider::mock::{coin_response, market_coin, MockFailure, MockMarketProvider, MockRateProvider};
    use crate::types::PriceDirection;
    use std::time::Duration;

    fn zar() -> Currency {
        Currency::new("ZAR").unwrap()
    }

    fn two_coin_provider() -> Arc<MockMarketProvider> {
        let provider = Arc::new(MockMarketProvider::new());
        provider.set_markets(vec![
            market_coin("bitcoin", "btc", 1, 1_200_000.0),
            market_coin("ethereum", "eth", 2, 60_000.0),
        ]);
        provider
    }

    #[tokio::test]
    async fn test_two_coins_keep_order_and_upper_case_symbols() {
        let provider = two_coin_provider();
        let fetcher = MarketDataFetcher::new(provider.clone(), Formatter::default());

        let coins = fetcher
            .fetch(&MarketQuery::new(zar(), 10), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].id, "bitcoin");
        assert_eq!(coins[0].symbol, "BTC");
        assert_eq!(coins[1].id, "ethereum");
        assert_eq!(coins[1].symbol, "ETH");
        assert_eq!(provider.last_vs_currency(), Some(zar()));
        assert_eq!(provider.coin_call_count(), 0);
    }

    #[tokio::test]
    async fn test_display_fields_are_formatted() {
        let fetcher = MarketDataFetcher::new(two_coin_provider(), Formatter::default());

        let coins = fetcher
            .fetch(&MarketQuery::new(zar(), 10), &CancellationToken::new())
            .await
            .unwrap();
        let btc = &coins[0].display;

        assert_eq!(btc.price, "R 1 200 000,00");
        assert_eq!(btc.price_change, "R 24 000,00");
        assert_eq!(btc.direction, PriceDirection::Down);
        assert_eq!(btc.price_change_percentage, "-2,00%");
        assert_eq!(btc.market_cap, "R 1 200 000 000 000");
        assert_eq!(btc.circulating_supply, "19 000 000");
        assert_eq!(btc.ath_date, "2021/11/10");
    }

    #[tokio::test]
    async fn test_one_failed_description_degrades_only_that_coin() {
        let provider = two_coin_provider();
        provider.set_coin(coin_response("bitcoin", "zar", 1.0, "Peer-to-peer cash."));
        provider.set_coin_failure("ethereum", MockFailure::Status(500));
        let fetcher = MarketDataFetcher::new(provider.clone(), Formatter::default());

        let query = MarketQuery::new(zar(), 10).with_descriptions(true);
        let coins = fetcher.fetch(&query, &CancellationToken::new()).await.unwrap();

        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].description.as_deref(), Some("Peer-to-peer cash."));
        assert_eq!(coins[1].description, None);
        assert_eq!(provider.coin_call_count(), 2);
    }

    #[tokio::test]
    async fn test_primary_failure_fails_chain() {
        let provider = Arc::new(MockMarketProvider::new());
        provider.set_markets_failure(MockFailure::Status(429));
        let fetcher = MarketDataFetcher::new(provider, Formatter::default());

        let err = fetcher
            .fetch(&MarketQuery::new(zar(), 10), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::HttpStatus { status: 429, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_descriptions_cancels_chain() {
        let provider = two_coin_provider();
        provider.set_coin(coin_response("bitcoin", "zar", 1.0, "a"));
        provider.set_coin(coin_response("ethereum", "zar", 1.0, "b"));
        provider.set_coin_delay(Duration::from_secs(5));
        let fetcher = MarketDataFetcher::new(provider, Formatter::default());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let query = MarketQuery::new(zar(), 10).with_descriptions(true);
        let err = fetcher.fetch(&query, &cancel).await.unwrap_err();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_client_side_conversion_scales_monetary_fields() {
        let provider = two_coin_provider();
        let rates = Arc::new(ExchangeRateFetcher::new(Arc::new(MockRateProvider::with_rates(
            &[("ZAR", 10.0)],
        ))));
        let fetcher =
            MarketDataFetcher::new(provider.clone(), Formatter::default()).with_exchange_rates(rates);

        let query = MarketQuery::new(zar(), 10).with_client_side_conversion(true);
        let coins = fetcher.fetch(&query, &CancellationToken::new()).await.unwrap();

        let eth = &coins[1];
        assert_eq!(provider.last_vs_currency(), Some(Currency::usd()));
        assert_eq!(eth.currency, zar());
        assert_eq!(eth.current_price, Some(600_000.0));
        assert_eq!(eth.market_cap, Some(600_000_000_000.0));
        assert_eq!(eth.price_change_percentage_24h, Some(-2.0));
        assert_eq!(eth.circulating_supply, Some(19_000_000.0));
    }

    #[tokio::test]
    async fn test_client_side_conversion_without_rate_fails() {
        let rates = Arc::new(ExchangeRateFetcher::new(Arc::new(MockRateProvider::with_rates(
            &[("EUR", 0.9)],
        ))));
        let fetcher =
            MarketDataFetcher::new(two_coin_provider(), Formatter::default()).with_exchange_rates(rates);

        let query = MarketQuery::new(zar(), 10).with_client_side_conversion(true);
        let err = fetcher
            .fetch(&query, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::MissingRate { .. }));
    }

    #[tokio::test]
    async fn test_null_figures_render_placeholder() {
        let provider = Arc::new(MockMarketProvider::new());
        let mut thin = market_coin("thin", "thn", 900, 1.0);
        thin.market_cap = None;
        thin.high_24h = None;
        thin.ath_date = None;
        provider.set_markets(vec![thin]);
        let fetcher = MarketDataFetcher::new(provider, Formatter::default());

        let coins = fetcher
            .fetch(&MarketQuery::new(zar(), 10), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(coins[0].display.market_cap, PLACEHOLDER);
        assert_eq!(coins[0].display.high_24h, PLACEHOLDER);
        assert_eq!(coins[0].display.ath_date, PLACEHOLDER);
    }
}
