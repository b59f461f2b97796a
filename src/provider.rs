//! Provider abstraction for the upstream market data and exchange rate APIs

use crate::{
    error::ProviderError,
    types::Currency,
    wire::{CoinResponse, LatestRatesResponse, MarketCoin},
};
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Trait for market data providers
///
/// Implementations perform exactly one HTTP request per call and return the
/// raw wire shape. Non-2xx statuses map to [`ProviderError::HttpStatus`],
/// bodies that do not parse map to [`ProviderError::InvalidResponse`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches the first page of coins ordered by market cap, descending
    ///
    /// # Arguments
    /// * `vs_currency` - Currency the figures are quoted in
    /// * `page_size` - Number of coins on the page
    async fn fetch_markets(
        &self,
        vs_currency: &Currency,
        page_size: u32,
    ) -> Result<Vec<MarketCoin>, ProviderError>;

    /// Fetches the full document for a single coin
    async fn fetch_coin(&self, id: &str) -> Result<CoinResponse, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Trait for exchange rate providers
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Fetches the latest rate snapshot
    async fn fetch_latest(&self) -> Result<LatestRatesResponse, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Races a request against a cancellation token
///
/// Dropping the request future aborts the underlying HTTP call. A token that
/// is already cancelled never starts the request.
pub async fn with_cancellation<F, T>(cancel: &CancellationToken, request: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    if cancel.is_cancelled() {
        return Err(ProviderError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = request => result,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_with_cancellation_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = with_cancellation(&cancel, async { Ok::<_, ProviderError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_never_starts_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = with_cancellation(&cancel, async {
            Err::<u8, _>(ProviderError::InvalidResponse("request ran".to_string()))
        })
        .await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_request() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = with_cancellation(&cancel, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ProviderError>(())
        })
        .await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
