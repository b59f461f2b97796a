//! HTTP server exposing the dashboard pages
//!
//! `/` renders the shared list view; `/crypto/{id}` builds a detail view per
//! request so concurrent requests for different coins never supersede each
//! other.

use crate::{
    config::Config,
    constants::PLACEHOLDER,
    error::{ConfigError, DashboardError},
    fetcher::{CoinDetailFetcher, ExchangeRateFetcher, MarketDataFetcher},
    format::Formatter,
    provider::{ExchangeRateProvider, MarketDataProvider},
    providers::{CoinGeckoProvider, OpenExchangeRatesProvider},
    state::{ErrorPolicy, FetchSite},
    types::ExchangeRateSnapshot,
    view::{DetailView, Footer, ListView, Page, PageStatus, SortOrder, Templates},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Exchange rate shown in the footer
struct RateFooter {
    site: FetchSite<ExchangeRateSnapshot>,
    fetcher: Arc<ExchangeRateFetcher>,
}

/// Everything the route handlers share
pub struct Dashboard {
    config: Config,
    formatter: Formatter,
    templates: Templates,
    list: ListView,
    detail_fetcher: Arc<CoinDetailFetcher>,
    rates: Option<RateFooter>,
}

/// Router state
pub type AppState = Arc<Dashboard>;

impl Dashboard {
    /// Wires views and fetchers over the given providers
    ///
    /// `rate_provider` is required when client-side conversion is enabled.
    pub fn new(
        config: Config,
        market_provider: Arc<dyn MarketDataProvider>,
        rate_provider: Option<Arc<dyn ExchangeRateProvider>>,
    ) -> Result<Self, DashboardError> {
        let formatter = Formatter::new(config.locale);
        let templates = Templates::new()?;

        let rates_fetcher = match (config.convert_client_side, rate_provider) {
            (true, Some(provider)) => Some(Arc::new(ExchangeRateFetcher::new(provider))),
            (true, None) => return Err(ConfigError::MissingAppId.into()),
            (false, _) => None,
        };

        let mut market = MarketDataFetcher::new(market_provider.clone(), formatter);
        let mut detail = CoinDetailFetcher::new(market_provider, formatter);
        if let Some(rates) = &rates_fetcher {
            market = market.with_exchange_rates(rates.clone());
            detail = detail.with_exchange_rates(rates.clone());
        }

        let list = ListView::new(Arc::new(market), config.market_query(), formatter);
        let rates = rates_fetcher.map(|fetcher| RateFooter {
            site: FetchSite::new("footer_rate", ErrorPolicy::KeepLastValue),
            fetcher,
        });

        Ok(Self {
            config,
            formatter,
            templates,
            list,
            detail_fetcher: Arc::new(detail),
            rates,
        })
    }

    /// Builds the dashboard over the live CoinGecko and Open Exchange Rates APIs
    pub fn from_config(config: Config) -> Result<Self, DashboardError> {
        let market: Arc<dyn MarketDataProvider> =
            Arc::new(CoinGeckoProvider::with_base_url(&config.coingecko_url)?);

        let rates: Option<Arc<dyn ExchangeRateProvider>> = if config.convert_client_side {
            let app_id = config
                .exchange_rates_app_id
                .clone()
                .ok_or(ConfigError::MissingAppId)?;
            Some(Arc::new(OpenExchangeRatesProvider::with_base_url(
                &config.exchange_rates_url,
                app_id,
            )?))
        } else {
            None
        };

        Self::new(config, market, rates)
    }

    async fn refresh_rates(&self) {
        if let Some(rates) = &self.rates {
            let currency = &self.config.currency;
            rates
                .site
                .load_shared(|cancel| async move {
                    rates.fetcher.fetch(currency, &cancel).await
                })
                .await;
        }
    }

    fn footer(&self) -> Footer {
        let currency = self.config.currency.code();
        let rate = self.rates.as_ref().map(|rates| {
            rates.site.state().to_target(1.0).map_or_else(
                || PLACEHOLDER.to_string(),
                |rate| self.formatter.currency(rate, currency),
            )
        });

        Footer {
            currency: currency.to_string(),
            rate,
        }
    }

    async fn list_page(&self, order: SortOrder) -> Result<Page, DashboardError> {
        let (state, ()) = tokio::join!(self.list.load(), self.refresh_rates());
        Ok(self
            .list
            .render_state(&self.templates, &state, order, &self.footer())?)
    }

    async fn detail_page(&self, id: &str) -> Result<Page, DashboardError> {
        let view = DetailView::new(self.detail_fetcher.clone(), self.config.detail_query(id));
        let (state, ()) = tokio::join!(view.mount(), self.refresh_rates());
        Ok(view.render_state(&self.templates, &state, &self.footer())?)
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let status = match self.status {
            PageStatus::Ok => StatusCode::OK,
            PageStatus::NotFound => StatusCode::NOT_FOUND,
            PageStatus::UpstreamError => StatusCode::BAD_GATEWAY,
        };
        (status, Html(self.html)).into_response()
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Failed to render page");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ListParams {
    order: Option<String>,
}

async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Page, DashboardError> {
    state
        .list_page(SortOrder::from_param(params.order.as_deref()))
        .await
}

async fn coin_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Page, DashboardError> {
    state.detail_page(&id).await
}

async fn missing_coin(State(state): State<AppState>) -> Result<Page, DashboardError> {
    state.detail_page("").await
}

/// Builds the router for both pages
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/crypto/", get(missing_coin))
        .route("/crypto/:id", get(coin_detail))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C
pub async fn serve(config: Config) -> Result<(), DashboardError> {
    let addr = config.bind_addr;
    let dashboard = Arc::new(Dashboard::from_config(config)?);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Dashboard listening on http://{}", addr);

    axum::serve(listener, router(dashboard))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{coin_response, market_coin, MockMarketProvider, MockRateProvider};

    async fn spawn(dashboard: Dashboard) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(dashboard)))
                .await
                .unwrap();
        });
        format!("http://{}", addr)
    }

    fn market_provider() -> Arc<MockMarketProvider> {
        let provider = Arc::new(MockMarketProvider::new());
        provider.set_markets(vec![
            market_coin("bitcoin", "btc", 1, 1_200_000.0),
            market_coin("ethereum", "eth", 2, 60_000.0),
        ]);
        provider.set_coin(coin_response("bitcoin", "zar", 1_200_000.0, "Digital gold."));
        provider
    }

    #[tokio::test]
    async fn test_routes_answer_with_page_statuses() {
        let dashboard = Dashboard::new(Config::default(), market_provider(), None).unwrap();
        let base = spawn(dashboard).await;
        let client = reqwest::Client::new();

        let list = client.get(format!("{}/", base)).send().await.unwrap();
        assert_eq!(list.status(), 200);
        let body = list.text().await.unwrap();
        assert!(body.contains(r#"href="/crypto/bitcoin""#));
        assert!(body.contains("Prices in ZAR."));

        let detail = client
            .get(format!("{}/crypto/bitcoin", base))
            .send()
            .await
            .unwrap();
        assert_eq!(detail.status(), 200);
        assert!(detail.text().await.unwrap().contains("Digital gold."));

        let missing = client
            .get(format!("{}/crypto/dogecoin", base))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
        assert!(missing.text().await.unwrap().contains("Cryptocurrency not found"));

        let empty = client.get(format!("{}/crypto/", base)).send().await.unwrap();
        assert_eq!(empty.status(), 404);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let provider = Arc::new(MockMarketProvider::new());
        provider.set_markets_failure(crate::provider::mock::MockFailure::Status(500));
        let dashboard = Dashboard::new(Config::default(), provider, None).unwrap();
        let base = spawn(dashboard).await;

        let response = reqwest::get(format!("{}/", base)).await.unwrap();
        assert_eq!(response.status(), 502);
        assert!(response.text().await.unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_client_side_conversion_shows_rate_in_footer() {
        let config = Config {
            convert_client_side: true,
            exchange_rates_app_id: Some("test".to_string()),
            ..Config::default()
        };
        let rates: Arc<dyn ExchangeRateProvider> =
            Arc::new(MockRateProvider::with_rates(&[("ZAR", 18.71)]));
        let dashboard = Dashboard::new(config, market_provider(), Some(rates)).unwrap();

        let page = dashboard.list_page(SortOrder::Ascending).await.unwrap();

        assert_eq!(page.status, PageStatus::Ok);
        assert!(page.html.contains("1 USD = R 18,71"));
        assert!(page.html.contains("R 22 452 000,00"));
    }

    #[test]
    fn test_client_side_conversion_without_rate_provider_is_config_error() {
        let config = Config {
            convert_client_side: true,
            ..Config::default()
        };

        let err = Dashboard::new(config, market_provider(), None).err().unwrap();
        assert!(matches!(err, DashboardError::Config(ConfigError::MissingAppId)));
    }
}
