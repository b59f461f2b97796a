//! Upstream API provider implementations

pub mod coingecko;
pub mod open_exchange_rates;

pub use coingecko::CoinGeckoProvider;
pub use open_exchange_rates::OpenExchangeRatesProvider;

use crate::{
    constants::{REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ProviderError,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Builds the HTTP client shared by every request of one provider
pub(crate) fn build_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(ProviderError::Network)
}

/// Transport errors print their request URL, query string included
fn without_url(error: reqwest::Error) -> ProviderError {
    ProviderError::Network(error.without_url())
}

/// Sends a request and decodes its JSON body
///
/// `endpoint` names the resource in errors and logs; it never carries
/// query parameters so API keys stay out of messages.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    endpoint: &str,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(without_url)?;
    let status = response.status();

    if status.as_u16() == 429 {
        tracing::warn!(endpoint, "Rate limit exceeded");
    }

    if !status.is_success() {
        tracing::debug!(endpoint, status = status.as_u16(), "Upstream returned an error status");
        return Err(ProviderError::http_status(status.as_u16(), endpoint));
    }

    let body = response.text().await.map_err(without_url)?;

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::InvalidResponse(format!("Failed to parse {} response: {}", endpoint, e))
    })
}
