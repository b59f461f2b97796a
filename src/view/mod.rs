//! HTML view layer
//!
//! Each view owns a [`FetchSite`](crate::state::FetchSite) and renders its
//! state through embedded `tera` templates. Auto-escaping is on for every
//! template, so upstream strings never reach the page unescaped.

pub mod detail;
pub mod list;

pub use detail::DetailView;
pub use list::{ListView, SortOrder};

use serde::Serialize;
use tera::{Context, Tera};

const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{% block title %}Crypto Dashboard{% endblock title %}</title>
<style>
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2933; }
nav { background: #1f2933; padding: 0.75rem 1.5rem; }
nav a { color: #fff; text-decoration: none; font-weight: bold; }
main { padding: 1.5rem; max-width: 960px; margin: 0 auto; }
table { border-collapse: collapse; width: 100%; }
th, td { padding: 0.5rem; text-align: left; border-bottom: 1px solid #e4e7eb; }
img { vertical-align: middle; }
.up { color: #0f9d58; }
.down { color: #d93025; }
.error { background: #fdecea; color: #b3261e; padding: 0.75rem; margin-bottom: 1rem; }
footer { padding: 1rem 1.5rem; color: #616e7c; font-size: 0.875rem; text-align: center; }
</style>
</head>
<body>
<nav><a href="/">Crypto Dashboard</a></nav>
<main>
{% block content %}{% endblock content %}
</main>
<footer>
<p>Data provided by CoinGecko. Prices in {{ footer.currency }}.</p>
{% if footer.rate %}<p class="rate">1 USD = {{ footer.rate }}</p>{% endif %}
</footer>
</body>
</html>
"#;

const LIST_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block content %}
<h1>Top Cryptocurrencies</h1>
{% if error %}<div class="error" role="alert">{{ error }}</div>{% endif %}
{% if rows | length > 0 %}
<table>
<thead>
<tr>
<th><a href="/?order={{ next_order }}">Rank</a></th>
<th>Name</th>
<th>Price</th>
<th>24h</th>
<th>Market Cap</th>
</tr>
</thead>
<tbody>
{% for coin in rows %}
<tr>
<td>{{ coin.rank }}</td>
<td><a href="/crypto/{{ coin.id }}"><img src="{{ coin.image }}" alt="" width="24" height="24"> {{ coin.name }} ({{ coin.symbol }})</a></td>
<td>{{ coin.price }}</td>
<td class="{{ coin.direction }}">{{ coin.price_change_percentage }}</td>
<td>{{ coin.market_cap }}</td>
</tr>
{% endfor %}
</tbody>
</table>
{% elif loading %}
<p>Loading...</p>
{% elif not error %}
<p>No coins to show.</p>
{% endif %}
{% if last_updated %}<p class="updated">Last updated: {{ last_updated }}</p>{% endif %}
{% endblock content %}
"#;

const DETAIL_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}{% if coin %}{{ coin.name }} | {% endif %}Crypto Dashboard{% endblock title %}
{% block content %}
{% if not_found %}
<h1>Cryptocurrency not found</h1>
<p>No coin matches &quot;{{ id }}&quot;.</p>
<p><a href="/">Back to Dashboard</a></p>
{% elif error %}
<div class="error" role="alert">{{ error }}</div>
<p><a href="/">Back to Dashboard</a></p>
{% elif coin %}
<p><a href="/">Back to Dashboard</a></p>
<h1><img src="{{ coin.image }}" alt="" width="48" height="48"> {{ coin.name }} ({{ coin.symbol }})</h1>
<p>Rank #{{ coin.rank }}</p>
<p class="price">{{ coin.price }} <span class="{{ coin.direction }}">{{ coin.price_change_percentage }} ({{ coin.price_change }})</span></p>
<table>
<tr><th>Market Cap</th><td>{{ coin.market_cap }}</td></tr>
<tr><th>24h Volume</th><td>{{ coin.total_volume }}</td></tr>
<tr><th>24h High</th><td>{{ coin.high_24h }}</td></tr>
<tr><th>24h Low</th><td>{{ coin.low_24h }}</td></tr>
<tr><th>Circulating Supply</th><td>{{ coin.circulating_supply }}</td></tr>
<tr><th>All-Time High</th><td>{{ coin.ath }} ({{ coin.ath_date }})</td></tr>
<tr><th>All-Time Low</th><td>{{ coin.atl }} ({{ coin.atl_date }})</td></tr>
<tr><th>Sentiment</th><td><span class="up">{{ coin.sentiment_votes_up }}</span> / <span class="down">{{ coin.sentiment_votes_down }}</span></td></tr>
</table>
{% if coin.description %}
<section>
<h2>About {{ coin.name }}</h2>
<p>{{ coin.description }}</p>
</section>
{% endif %}
{% if coin.homepage or coin.blockchain_site %}
<ul>
{% if coin.homepage %}<li><a href="{{ coin.homepage }}" rel="noopener noreferrer">Website</a></li>{% endif %}
{% if coin.blockchain_site %}<li><a href="{{ coin.blockchain_site }}" rel="noopener noreferrer">Blockchain Explorer</a></li>{% endif %}
</ul>
{% endif %}
{% else %}
<p>Loading...</p>
<p><a href="/">Back to Dashboard</a></p>
{% endif %}
{% endblock content %}
"#;

/// Compiled page templates
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub const LIST: &'static str = "list.html";
    pub const DETAIL: &'static str = "detail.html";

    /// Compiles the embedded templates
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", BASE_TEMPLATE),
            (Self::LIST, LIST_TEMPLATE),
            (Self::DETAIL, DETAIL_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }
}

/// Page footer contents shared by both views
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Footer {
    /// Display currency code
    pub currency: String,
    /// Formatted price of one US dollar, shown when client-side conversion is on
    pub rate: Option<String>,
}

/// Outcome a rendered page reports to the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Ok,
    NotFound,
    UpstreamError,
}

/// A rendered HTML page
#[derive(Debug, Clone)]
pub struct Page {
    pub status: PageStatus,
    pub html: String,
}
