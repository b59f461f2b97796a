//! Open Exchange Rates provider implementation

use crate::{
    constants::{OPEN_EXCHANGE_RATES_LATEST_ENDPOINT, OPEN_EXCHANGE_RATES_URL},
    error::ProviderError,
    provider::ExchangeRateProvider,
    wire::LatestRatesResponse,
};
use async_trait::async_trait;
use reqwest::Client;

use super::{build_client, send_json};

/// Open Exchange Rates provider
///
/// Free-tier snapshots are always relative to USD.
pub struct OpenExchangeRatesProvider {
    client: Client,
    base_url: String,
    app_id: String,
}

impl OpenExchangeRatesProvider {
    /// Creates a provider against the public Open Exchange Rates API
    pub fn new(app_id: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(OPEN_EXCHANGE_RATES_URL, app_id)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
        })
    }
}

#[async_trait]
impl ExchangeRateProvider for OpenExchangeRatesProvider {
    async fn fetch_latest(&self) -> Result<LatestRatesResponse, ProviderError> {
        let url = format!("{}{}", self.base_url, OPEN_EXCHANGE_RATES_LATEST_ENDPOINT);
        tracing::debug!(%url, "Fetching latest exchange rates");

        let request = self.client.get(&url).query(&[("app_id", self.app_id.as_str())]);
        let latest: LatestRatesResponse =
            send_json(request, OPEN_EXCHANGE_RATES_LATEST_ENDPOINT).await?;

        tracing::debug!(
            base = %latest.base,
            count = latest.rates.len(),
            "Fetched exchange rates"
        );
        Ok(latest)
    }

    fn provider_name(&self) -> &'static str {
        "open_exchange_rates"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ErrorPolicy, FetchSite, FetchStatus};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_latest_passes_app_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .and(query_param("app_id", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"disclaimer": "d", "license": "l", "timestamp": 1710410400,
                    "base": "USD", "rates": {"ZAR": 18.71, "EUR": 0.915}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenExchangeRatesProvider::with_base_url(server.uri(), "test-key").unwrap();
        let latest = provider.fetch_latest().await.unwrap();

        assert_eq!(latest.base, "USD");
        assert_eq!(latest.rates.get("ZAR"), Some(&18.71));
    }

    #[tokio::test]
    async fn test_invalid_app_id_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let provider = OpenExchangeRatesProvider::with_base_url(server.uri(), "bad").unwrap();
        let err = provider.fetch_latest().await.unwrap_err();

        assert!(matches!(err, ProviderError::HttpStatus { status: 401, .. }));
        assert!(!err.to_string().contains("bad"));
    }

    #[tokio::test]
    async fn test_transport_error_keeps_app_id_out_of_state() {
        let provider =
            OpenExchangeRatesProvider::with_base_url("http://127.0.0.1:1", "SECRET-KEY-123")
                .unwrap();
        let site = FetchSite::new("footer_rate", ErrorPolicy::KeepLastValue);

        let state = site.load(|_| provider.fetch_latest()).await;

        assert_eq!(state.status, FetchStatus::Error);
        let message = state.error_message().unwrap();
        assert!(message.starts_with("Network error"), "{}", message);
        assert!(!message.contains("SECRET-KEY-123"), "{}", message);
        assert!(!message.contains("app_id"), "{}", message);
    }
}
