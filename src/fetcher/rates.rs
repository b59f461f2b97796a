//! Exchange rate fetcher

use crate::{
    constants::BASE_CURRENCY,
    error::ProviderError,
    provider::{with_cancellation, ExchangeRateProvider},
    state::FetchState,
    types::{Currency, ExchangeRateSnapshot},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Retrieves USD-based rate snapshots
pub struct ExchangeRateFetcher {
    provider: Arc<dyn ExchangeRateProvider>,
}

impl ExchangeRateFetcher {
    pub fn new(provider: Arc<dyn ExchangeRateProvider>) -> Self {
        Self { provider }
    }

    /// Fetches the latest snapshot and extracts the rate for `target`
    ///
    /// A snapshot without `target` is still returned; its `target_rate` is
    /// `None` and conversions through it are unavailable.
    pub async fn fetch(
        &self,
        target: &Currency,
        cancel: &CancellationToken,
    ) -> Result<ExchangeRateSnapshot, ProviderError> {
        let latest = with_cancellation(cancel, self.provider.fetch_latest()).await?;

        if !latest.base.eq_ignore_ascii_case(BASE_CURRENCY) {
            return Err(ProviderError::InvalidResponse(format!(
                "Expected {} based rates, got {}",
                BASE_CURRENCY, latest.base
            )));
        }

        let snapshot =
            ExchangeRateSnapshot::new(latest.base, latest.timestamp, latest.rates, target.clone());

        match snapshot.target_rate {
            Some(rate) => tracing::debug!(
                provider = self.provider.provider_name(),
                currency = %target,
                rate,
                "Exchange rate loaded"
            ),
            None => tracing::warn!(
                provider = self.provider.provider_name(),
                currency = %target,
                "Exchange rate snapshot has no rate for target currency"
            ),
        }

        Ok(snapshot)
    }
}

impl FetchState<ExchangeRateSnapshot> {
    /// Converts a USD amount with the loaded snapshot
    ///
    /// `None` until a snapshot has loaded, and when it lacks the target rate.
    pub fn to_target(&self, amount: f64) -> Option<f64> {
        self.value().and_then(|snapshot| snapshot.to_target(amount))
    }
}
