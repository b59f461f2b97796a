//! Constants for the crypto price dashboard
//!
//! Compile-time defaults for every setting. `config::Config::from_env`
//! overlays environment variables on top of these values.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko endpoint for ranked market pages
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// CoinGecko endpoint prefix for single coin detail (`/coins/{id}`)
pub const COINGECKO_COIN_ENDPOINT: &str = "/coins";

/// Open Exchange Rates API base URL
pub const OPEN_EXCHANGE_RATES_URL: &str = "https://openexchangerates.org/api";

/// Open Exchange Rates endpoint for the latest snapshot
pub const OPEN_EXCHANGE_RATES_LATEST_ENDPOINT: &str = "/latest.json";

/// Base currency of the exchange rate snapshot
pub const BASE_CURRENCY: &str = "USD";

/// Currency the dashboard displays values in unless configured otherwise
pub const DEFAULT_CURRENCY: &str = "ZAR";

/// Number of coins shown on the dashboard
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound accepted by the markets endpoint for `per_page`
pub const MAX_PAGE_SIZE: u32 = 250;

/// HTTP request timeout when talking to upstream APIs (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Address the dashboard server binds to
pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Placeholder rendered for values that cannot be formatted or converted
pub const PLACEHOLDER: &str = "-";

/// Sentinel rendered for unparseable dates
pub const INVALID_DATE: &str = "Invalid date";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "coin-dashboard/0.1.0";
