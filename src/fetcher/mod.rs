//! Fetch-and-normalize pipeline
//!
//! Fetchers issue provider requests under a cancellation token and reshape
//! the wire JSON into display records. Formatting always runs on the
//! extracted (and, when enabled, converted) figures.

pub mod detail;
pub mod market;
pub mod rates;

pub use detail::CoinDetailFetcher;
pub use market::MarketDataFetcher;
pub use rates::ExchangeRateFetcher;

use crate::{
    constants::PLACEHOLDER,
    format::Formatter,
    types::{CoinSummary, Currency, PriceDirection, SummaryDisplay},
};

/// Multiplier applied to monetary fields
///
/// `Identity` when the upstream already quotes the target currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Conversion {
    Identity,
    Rate(f64),
}

impl Conversion {
    pub(crate) fn apply(self, amount: Option<f64>) -> Option<f64> {
        match self {
            Conversion::Identity => amount,
            Conversion::Rate(rate) => amount.map(|value| value * rate),
        }
    }
}

pub(crate) fn money(formatter: &Formatter, amount: Option<f64>, currency: &Currency) -> String {
    amount.map_or_else(
        || PLACEHOLDER.to_string(),
        |value| formatter.currency(value, currency.code()),
    )
}

pub(crate) fn large_money(formatter: &Formatter, amount: Option<f64>, currency: &Currency) -> String {
    amount.map_or_else(
        || PLACEHOLDER.to_string(),
        |value| formatter.currency_no_fraction(value, currency.code()),
    )
}

pub(crate) fn percentage(formatter: &Formatter, value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| formatter.percentage(v))
}

pub(crate) fn date(formatter: &Formatter, iso: Option<&str>) -> String {
    iso.map_or_else(|| PLACEHOLDER.to_string(), |s| formatter.date(s))
}

/// Formats every display field of a summary
pub(crate) fn summary_display(formatter: &Formatter, coin: &CoinSummary) -> SummaryDisplay {
    let currency = &coin.currency;

    SummaryDisplay {
        price: money(formatter, coin.current_price, currency),
        price_change: money(formatter, coin.price_change_24h.map(f64::abs), currency),
        price_change_percentage: percentage(formatter, coin.price_change_percentage_24h),
        direction: PriceDirection::from_change(
            coin.price_change_24h.or(coin.price_change_percentage_24h),
        ),
        market_cap: large_money(formatter, coin.market_cap, currency),
        total_volume: large_money(formatter, coin.total_volume, currency),
        high_24h: money(formatter, coin.high_24h, currency),
        low_24h: money(formatter, coin.low_24h, currency),
        circulating_supply: coin
            .circulating_supply
            .map_or_else(|| PLACEHOLDER.to_string(), |v| formatter.plain_number(v)),
        ath: money(formatter, coin.ath, currency),
        ath_date: date(formatter, coin.ath_date.as_deref()),
    }
}
