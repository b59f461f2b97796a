//! Coin detail view

use crate::{
    constants::PLACEHOLDER,
    fetcher::CoinDetailFetcher,
    state::{ErrorPolicy, FetchSite, FetchState},
    types::{CoinDetail, DetailQuery, PriceDirection},
};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tera::Context;

use super::{Footer, Page, PageStatus, Templates};

#[derive(Serialize)]
struct DetailContext<'a> {
    name: &'a str,
    symbol: &'a str,
    image: &'a str,
    rank: String,
    price: &'a str,
    price_change: &'a str,
    price_change_percentage: &'a str,
    direction: PriceDirection,
    market_cap: &'a str,
    total_volume: &'a str,
    high_24h: &'a str,
    low_24h: &'a str,
    circulating_supply: &'a str,
    ath: &'a str,
    ath_date: &'a str,
    atl: &'a str,
    atl_date: &'a str,
    sentiment_votes_up: &'a str,
    sentiment_votes_down: &'a str,
    description: Option<&'a str>,
    homepage: &'a str,
    blockchain_site: &'a str,
}

/// Only http(s) links are rendered as anchors
fn web_link(url: &str) -> &str {
    if url.starts_with("https://") || url.starts_with("http://") {
        url
    } else {
        ""
    }
}

impl<'a> From<&'a CoinDetail> for DetailContext<'a> {
    fn from(detail: &'a CoinDetail) -> Self {
        let summary = &detail.summary;
        let display = &summary.display;
        Self {
            name: &summary.name,
            symbol: &summary.symbol,
            image: &summary.image,
            rank: summary
                .market_cap_rank
                .map_or_else(|| PLACEHOLDER.to_string(), |rank| rank.to_string()),
            price: &display.price,
            price_change: &display.price_change,
            price_change_percentage: &display.price_change_percentage,
            direction: display.direction,
            market_cap: &display.market_cap,
            total_volume: &display.total_volume,
            high_24h: &display.high_24h,
            low_24h: &display.low_24h,
            circulating_supply: &display.circulating_supply,
            ath: &display.ath,
            ath_date: &display.ath_date,
            atl: &detail.display.atl,
            atl_date: &detail.display.atl_date,
            sentiment_votes_up: &detail.display.sentiment_votes_up,
            sentiment_votes_down: &detail.display.sentiment_votes_down,
            description: summary.description.as_deref(),
            homepage: web_link(&detail.homepage),
            blockchain_site: web_link(&detail.blockchain_site),
        }
    }
}

/// Detail page for one coin, shown at `/crypto/{id}`
///
/// An error clears the previous coin so a failed navigation never shows
/// stale figures under a new identifier.
pub struct DetailView {
    site: FetchSite<CoinDetail>,
    fetcher: Arc<CoinDetailFetcher>,
    query: Mutex<DetailQuery>,
}

impl DetailView {
    pub fn new(fetcher: Arc<CoinDetailFetcher>, query: DetailQuery) -> Self {
        Self {
            site: FetchSite::new("coin_detail", ErrorPolicy::ClearValue),
            fetcher,
            query: Mutex::new(query),
        }
    }

    pub fn site(&self) -> &FetchSite<CoinDetail> {
        &self.site
    }

    /// Identifier currently shown
    pub fn id(&self) -> String {
        self.current_query().id
    }

    /// Fetches the current identifier
    ///
    /// An empty identifier never reaches the provider; the view renders the
    /// not-found page for it.
    pub async fn mount(&self) -> FetchState<CoinDetail> {
        let query = self.current_query();
        if query.id.trim().is_empty() {
            self.site.cancel();
            return self.site.state();
        }

        self.site
            .load(|cancel| async move { self.fetcher.fetch(&query, &cancel).await })
            .await
    }

    /// Switches to another coin and fetches it
    ///
    /// A fetch still running for the previous identifier is superseded.
    pub async fn set_id(&self, id: &str) -> FetchState<CoinDetail> {
        {
            let mut query = self.query.lock().unwrap_or_else(PoisonError::into_inner);
            if query.id == id && self.site.state().value.is_some() {
                return self.site.state();
            }
            query.id = id.to_string();
        }
        self.mount().await
    }

    pub fn render(&self, templates: &Templates, footer: &Footer) -> Result<Page, tera::Error> {
        self.render_state(templates, &self.site.state(), footer)
    }

    pub fn render_state(
        &self,
        templates: &Templates,
        state: &FetchState<CoinDetail>,
        footer: &Footer,
    ) -> Result<Page, tera::Error> {
        let id = self.id();
        let not_found = id.trim().is_empty()
            || state.error.as_ref().is_some_and(|failure| failure.is_not_found());
        let coin = state.value().map(DetailContext::from);

        let mut context = Context::new();
        context.insert("id", &id);
        context.insert("not_found", &not_found);
        context.insert("error", &state.error_message());
        context.insert("coin", &coin);
        context.insert("footer", footer);

        let status = if not_found {
            PageStatus::NotFound
        } else if state.error.is_some() {
            PageStatus::UpstreamError
        } else {
            PageStatus::Ok
        };

        if not_found {
            tracing::debug!(coin = %id, "Rendering not-found page");
        }

        Ok(Page {
            status,
            html: templates.render(Templates::DETAIL, &context)?,
        })
    }

    fn current_query(&self) -> DetailQuery {
        self.query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
