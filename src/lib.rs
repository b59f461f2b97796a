//! # Crypto Price Dashboard
//!
//! Lists and details cryptocurrency prices in a local currency, sourced from
//! CoinGecko market data and, optionally, Open Exchange Rates.
//!
//! ## Pipeline
//!
//! A view owns a [`FetchSite`] and triggers it on mount, on parameter change
//! or on refresh. The fetchers issue provider requests under the site's
//! cancellation token, normalize the wire JSON into display records and the
//! site publishes the result as reactive state. A newer chain always wins;
//! results of superseded chains are discarded whatever order they finish in.
//!
//! ## Usage
//!
//! ```no_run
//! use coin_dashboard::{
//!     CoinGeckoProvider, Currency, Formatter, MarketDataFetcher, MarketQuery,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(CoinGeckoProvider::new()?);
//! let fetcher = MarketDataFetcher::new(provider, Formatter::default());
//!
//! let query = MarketQuery::new(Currency::new("ZAR")?, 10).with_descriptions(true);
//! let coins = fetcher.fetch(&query, &CancellationToken::new()).await?;
//! for coin in coins {
//!     println!("{} {}: {}", coin.display.price_change_percentage, coin.symbol, coin.display.price);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! The `coin-dashboard` binary reads `DASHBOARD_*`, `COINGECKO_API_URL` and
//! `OPEN_EXCHANGE_RATES_*` from the environment (or a `.env` file). See
//! [`Config::from_env`].

pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod provider;
pub mod providers;
pub mod server;
pub mod state;
pub mod types;
pub mod view;
pub mod wire;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, DashboardError, ProviderError};
pub use fetcher::{CoinDetailFetcher, ExchangeRateFetcher, MarketDataFetcher};
pub use format::{
    format_currency, format_currency_no_fraction, format_date, format_percentage,
    format_plain_number, Formatter, NumberLocale,
};
pub use provider::{ExchangeRateProvider, MarketDataProvider};
pub use providers::{CoinGeckoProvider, OpenExchangeRatesProvider};
pub use state::{ErrorPolicy, FetchSite, FetchState, FetchStatus};
pub use types::{
    CoinDetail, CoinSummary, Currency, DetailQuery, ExchangeRateSnapshot, MarketQuery,
    PriceDirection,
};
