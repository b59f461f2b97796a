//! Dashboard list view

use crate::{
    constants::PLACEHOLDER,
    fetcher::MarketDataFetcher,
    format::Formatter,
    state::{ErrorPolicy, FetchSite, FetchState, FetchStatus},
    types::{CoinSummary, MarketQuery, PriceDirection},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tera::Context;

use super::{Footer, Page, PageStatus, Templates};

/// Rank order of the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parses the `order` query parameter; anything but `desc` is ascending
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(value) if value.eq_ignore_ascii_case("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    fn toggled_param(self) -> &'static str {
        match self {
            SortOrder::Ascending => "desc",
            SortOrder::Descending => "asc",
        }
    }
}

/// Orders coins by market cap rank; unranked coins always come last
pub fn sort_by_rank(coins: &[CoinSummary], order: SortOrder) -> Vec<&CoinSummary> {
    let mut sorted: Vec<&CoinSummary> = coins.iter().collect();
    sorted.sort_by(|a, b| match (a.market_cap_rank, b.market_cap_rank) {
        (Some(x), Some(y)) => match order {
            SortOrder::Ascending => x.cmp(&y),
            SortOrder::Descending => y.cmp(&x),
        },
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted
}

#[derive(Serialize)]
struct ListRow<'a> {
    id: &'a str,
    rank: String,
    name: &'a str,
    symbol: &'a str,
    image: &'a str,
    price: &'a str,
    price_change_percentage: &'a str,
    direction: PriceDirection,
    market_cap: &'a str,
}

impl<'a> From<&'a CoinSummary> for ListRow<'a> {
    fn from(coin: &'a CoinSummary) -> Self {
        Self {
            id: &coin.id,
            rank: coin
                .market_cap_rank
                .map_or_else(|| PLACEHOLDER.to_string(), |rank| rank.to_string()),
            name: &coin.name,
            symbol: &coin.symbol,
            image: &coin.image,
            price: &coin.display.price,
            price_change_percentage: &coin.display.price_change_percentage,
            direction: coin.display.direction,
            market_cap: &coin.display.market_cap,
        }
    }
}

/// The ranked coin list shown at `/`
///
/// One instance is shared by every request. A failed refresh keeps the last
/// list on screen next to the error.
pub struct ListView {
    site: FetchSite<Vec<CoinSummary>>,
    fetcher: Arc<MarketDataFetcher>,
    query: MarketQuery,
    formatter: Formatter,
}

impl ListView {
    pub fn new(fetcher: Arc<MarketDataFetcher>, query: MarketQuery, formatter: Formatter) -> Self {
        Self {
            site: FetchSite::new("market_list", ErrorPolicy::KeepLastValue),
            fetcher,
            query,
            formatter,
        }
    }

    pub fn site(&self) -> &FetchSite<Vec<CoinSummary>> {
        &self.site
    }

    /// Fetches the list again, superseding any refresh in flight
    ///
    /// Returns the state left by whichever chain settled last.
    pub async fn refresh(&self) -> FetchState<Vec<CoinSummary>> {
        self.site
            .load(|cancel| async move { self.fetcher.fetch(&self.query, &cancel).await })
            .await
    }

    /// Fetches the list, joining a fetch already in flight
    ///
    /// Page requests use this so overlapping requests share one upstream
    /// chain instead of superseding each other.
    pub async fn load(&self) -> FetchState<Vec<CoinSummary>> {
        self.site
            .load_shared(|cancel| async move { self.fetcher.fetch(&self.query, &cancel).await })
            .await
    }

    /// Cancels a refresh in flight; the current list stays
    pub fn cancel(&self) {
        self.site.cancel();
    }

    /// Renders the current state of the list
    pub fn render(
        &self,
        templates: &Templates,
        order: SortOrder,
        footer: &Footer,
    ) -> Result<Page, tera::Error> {
        self.render_state(templates, &self.site.state(), order, footer)
    }

    pub fn render_state(
        &self,
        templates: &Templates,
        state: &FetchState<Vec<CoinSummary>>,
        order: SortOrder,
        footer: &Footer,
    ) -> Result<Page, tera::Error> {
        let coins = state.value().map(Vec::as_slice).unwrap_or_default();
        let rows: Vec<ListRow<'_>> = sort_by_rank(coins, order)
            .into_iter()
            .map(ListRow::from)
            .collect();

        let mut context = Context::new();
        context.insert("rows", &rows);
        context.insert("next_order", order.toggled_param());
        context.insert("error", &state.error_message());
        context.insert("loading", &state.is_loading());
        context.insert(
            "last_updated",
            &state.last_updated.map(|at| self.updated_at(at)),
        );
        context.insert("footer", footer);

        let status = if state.status == FetchStatus::Error && coins.is_empty() {
            PageStatus::UpstreamError
        } else {
            PageStatus::Ok
        };

        Ok(Page {
            status,
            html: templates.render(Templates::LIST, &context)?,
        })
    }

    fn updated_at(&self, at: DateTime<Utc>) -> String {
        format!(
            "{} {} UTC",
            self.formatter.date(&at.to_rfc3339()),
            at.format("%H:%M:%S")
        )
    }
}
