//! Coin detail fetcher

use crate::{
    error::ProviderError,
    format::Formatter,
    provider::{with_cancellation, MarketDataProvider},
    types::{CoinDetail, CoinSummary, Currency, DetailDisplay, DetailQuery, SummaryDisplay},
    wire::{CoinLinks, CoinResponse, CurrencyMap},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{date, money, percentage, summary_display, Conversion, ExchangeRateFetcher};

/// Retrieves and normalizes the full record of a single coin
pub struct CoinDetailFetcher {
    provider: Arc<dyn MarketDataProvider>,
    rates: Option<Arc<ExchangeRateFetcher>>,
    formatter: Formatter,
}

/// Picks one currency's figure out of a per-currency map
fn pick<T: Clone>(map: &CurrencyMap<T>, key: &str) -> Option<T> {
    map.get(key).cloned().flatten()
}

/// First non-blank link, or an empty string
fn first_link(links: &[Option<String>]) -> String {
    links
        .iter()
        .flatten()
        .map(|link| link.trim())
        .find(|link| !link.is_empty())
        .unwrap_or_default()
        .to_string()
}

impl CoinDetailFetcher {
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

    /// Fetches one coin and extracts its figures in the query currency
    ///
    /// An unknown id surfaces as the provider's 404. A document without a
    /// price in the requested currency is [`ProviderError::UnsupportedCurrency`].
    pub async fn fetch(
        &self,
        query: &DetailQuery,
        cancel: &CancellationToken,
    ) -> Result<CoinDetail, ProviderError> {
        let (coin, conversion) = if query.convert_client_side {
            let rates = self.rates.as_ref().ok_or_else(|| ProviderError::MissingRate {
                currency: query.currency.to_string(),
            })?;
            let (coin, snapshot) = tokio::try_join!(
                with_cancellation(cancel, self.provider.fetch_coin(&query.id)),
                rates.fetch(&query.currency, cancel),
            )?;
            let rate = snapshot
                .target_rate
                .ok_or_else(|| ProviderError::MissingRate {
                    currency: query.currency.to_string(),
                })?;
            (coin, Conversion::Rate(rate))
        } else {
            let coin = with_cancellation(cancel, self.provider.fetch_coin(&query.id)).await?;
            (coin, Conversion::Identity)
        };

        let source = if query.convert_client_side {
            Currency::usd()
        } else {
            query.currency.clone()
        };

        let detail = self.normalize(coin, &source, &query.currency, conversion)?;

        tracing::debug!(
            provider = self.provider.provider_name(),
            coin = %detail.summary.id,
            currency = %query.currency,
            "Coin detail normalized"
        );

        Ok(detail)
    }

    fn normalize(
        &self,
        coin: CoinResponse,
        source: &Currency,
        target: &Currency,
        conversion: Conversion,
    ) -> Result<CoinDetail, ProviderError> {
        let description = coin.description_en();
        let market = coin.market_data.ok_or_else(|| {
            ProviderError::InvalidResponse(format!("Coin {} has no market data", coin.id))
        })?;

        let key = source.api_code();
        let current_price = pick(&market.current_price, &key)
            .ok_or_else(|| ProviderError::unsupported_currency(&coin.id, source.code()))?;

        let image = coin
            .image
            .and_then(|links| links.large.or(links.small).or(links.thumb))
            .unwrap_or_default();
        let CoinLinks {
            homepage,
            blockchain_site,
        } = coin.links.unwrap_or_default();

        let mut summary = CoinSummary {
            symbol: coin.symbol.to_uppercase(),
            id: coin.id,
            name: coin.name,
            image,
            currency: target.clone(),
            current_price: conversion.apply(Some(current_price)),
            price_change_24h: conversion.apply(pick(&market.price_change_24h_in_currency, &key)),
            price_change_percentage_24h: pick(&market.price_change_percentage_24h_in_currency, &key),
            market_cap: conversion.apply(pick(&market.market_cap, &key)),
            total_volume: conversion.apply(pick(&market.total_volume, &key)),
            market_cap_rank: market.market_cap_rank,
            high_24h: conversion.apply(pick(&market.high_24h, &key)),
            low_24h: conversion.apply(pick(&market.low_24h, &key)),
            circulating_supply: market.circulating_supply,
            ath: conversion.apply(pick(&market.ath, &key)),
            ath_date: pick(&market.ath_date, &key),
            last_updated: coin.last_updated,
            description,
            display: SummaryDisplay::default(),
        };
        summary.display = summary_display(&self.formatter, &summary);

        let atl = conversion.apply(pick(&market.atl, &key));
        let atl_date = pick(&market.atl_date, &key);
        let sentiment_votes_up_percentage = coin.sentiment_votes_up_percentage.unwrap_or(0.0);
        let sentiment_votes_down_percentage = coin.sentiment_votes_down_percentage.unwrap_or(0.0);

        let display = DetailDisplay {
            atl: money(&self.formatter, atl, target),
            atl_date: date(&self.formatter, atl_date.as_deref()),
            sentiment_votes_up: percentage(&self.formatter, Some(sentiment_votes_up_percentage)),
            sentiment_votes_down: percentage(
                &self.formatter,
                Some(sentiment_votes_down_percentage),
            ),
        };

        Ok(CoinDetail {
            summary,
            atl,
            atl_date,
            sentiment_votes_up_percentage,
            sentiment_votes_down_percentage,
            homepage: first_link(&homepage),
            blockchain_site: first_link(&blockchain_site),
            display,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{coin_response, MockFailure, MockMarketProvider, MockRateProvider};
    use crate::types::PriceDirection;

    fn zar() -> Currency {
        Currency::new("ZAR").unwrap()
    }

    fn provider_with(coin: CoinResponse) -> Arc<MockMarketProvider> {
        let provider = Arc::new(MockMarketProvider::new());
        provider.set_coin(coin);
        provider
    }

    #[tokio::test]
    async fn test_detail_extracts_requested_currency() {
        let provider = provider_with(coin_response("bitcoin", "zar", 1_000_000.0, "Digital gold."));
        let fetcher = CoinDetailFetcher::new(provider, Formatter::default());

        let detail = fetcher
            .fetch(&DetailQuery::new("bitcoin", zar()), &CancellationToken::new())
            .await
            .unwrap();

        let summary = &detail.summary;
        assert_eq!(summary.symbol, "BIT");
        assert_eq!(summary.current_price, Some(1_000_000.0));
        assert_eq!(summary.image, "https://img.example/bitcoin-large.png");
        assert_eq!(summary.description.as_deref(), Some("Digital gold."));
        assert_eq!(summary.display.price, "R 1 000 000,00");
        assert_eq!(summary.display.direction, PriceDirection::Up);
        assert_eq!(summary.display.price_change_percentage, "+5,00%");
        assert_eq!(detail.atl, Some(10_000.0));
        assert_eq!(detail.display.atl_date, "2013/07/06");
        assert_eq!(detail.homepage, "https://bitcoin.org");
        assert_eq!(detail.blockchain_site, "https://explorer.example/bitcoin");
    }

    #[tokio::test]
    async fn test_missing_sentiment_defaults_to_zero() {
        let fetcher = CoinDetailFetcher::new(
            provider_with(coin_response("bitcoin", "zar", 1.0, "x")),
            Formatter::default(),
        );

        let detail = fetcher
            .fetch(&DetailQuery::new("bitcoin", zar()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(detail.sentiment_votes_up_percentage, 82.5);
        assert_eq!(detail.sentiment_votes_down_percentage, 0.0);
        assert_eq!(detail.display.sentiment_votes_up, "+82,50%");
        assert_eq!(detail.display.sentiment_votes_down, "+0,00%");
    }

    #[tokio::test]
    async fn test_unknown_coin_is_not_found() {
        let fetcher = CoinDetailFetcher::new(Arc::new(MockMarketProvider::new()), Formatter::default());

        let err = fetcher
            .fetch(&DetailQuery::new("nope", zar()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_currency_missing_from_document_is_unsupported() {
        let fetcher = CoinDetailFetcher::new(
            provider_with(coin_response("bitcoin", "usd", 60_000.0, "x")),
            Formatter::default(),
        );

        let err = fetcher
            .fetch(&DetailQuery::new("bitcoin", zar()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::UnsupportedCurrency { .. }));
    }

    #[tokio::test]
    async fn test_document_without_market_data_is_invalid() {
        let mut coin = coin_response("bitcoin", "zar", 1.0, "x");
        coin.market_data = None;
        let fetcher = CoinDetailFetcher::new(provider_with(coin), Formatter::default());

        let err = fetcher
            .fetch(&DetailQuery::new("bitcoin", zar()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let provider = Arc::new(MockMarketProvider::new());
        provider.set_coin_failure("bitcoin", MockFailure::Status(503));
        let fetcher = CoinDetailFetcher::new(provider, Formatter::default());

        let err = fetcher
            .fetch(&DetailQuery::new("bitcoin", zar()), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_client_side_conversion_reads_usd_figures() {
        let rates = Arc::new(ExchangeRateFetcher::new(Arc::new(MockRateProvider::with_rates(
            &[("ZAR", 20.0)],
        ))));
        let fetcher = CoinDetailFetcher::new(
            provider_with(coin_response("bitcoin", "usd", 50_000.0, "x")),
            Formatter::default(),
        )
        .with_exchange_rates(rates);

        let query = DetailQuery::new("bitcoin", zar()).with_client_side_conversion(true);
        let detail = fetcher.fetch(&query, &CancellationToken::new()).await.unwrap();

        assert_eq!(detail.summary.currency, zar());
        assert_eq!(detail.summary.current_price, Some(1_000_000.0));
        assert_eq!(detail.atl, Some(10_000.0));
        assert_eq!(detail.summary.price_change_percentage_24h, Some(5.0));
    }

    #[test]
    fn test_first_link_skips_blank_entries() {
        let links = vec![None, Some("  ".to_string()), Some("https://a.org".to_string())];
        assert_eq!(first_link(&links), "https://a.org");
        assert_eq!(first_link(&[]), "");
    }
}
