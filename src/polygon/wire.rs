use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::polygon::model::{NewsArticle, Ticker, TickerType};

#[derive(Deserialize)]
pub(crate) struct TickerNode {
    #[serde(default)]
    pub(crate) ticker: Option<String>,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) market: Option<String>,
    #[serde(rename = "type")]
    #[serde(default)]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) locale: Option<String>,
    #[serde(default)]
    pub(crate) primary_exchange: Option<String>,
    #[serde(default)]
    pub(crate) currency_name: Option<String>,
    #[serde(default)]
    pub(crate) active: Option<bool>,
}

impl From<TickerNode> for Ticker {
    fn from(n: TickerNode) -> Self {
        Self::new(
            n.ticker.unwrap_or_default(),
            n.name.unwrap_or_default(),
            n.market.unwrap_or_default(),
            n.kind.unwrap_or_default(),
        )
        .with_details(n.locale, n.primary_exchange, n.currency_name, n.active)
    }
}

#[derive(Deserialize)]
pub(crate) struct TickerTypeNode {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) asset_class: Option<String>,
    #[serde(default)]
    pub(crate) locale: Option<String>,
}

impl From<TickerTypeNode> for TickerType {
    fn from(n: TickerTypeNode) -> Self {
        Self {
            code: n.code.unwrap_or_default(),
            description: n.description.unwrap_or_default(),
            asset_class: n.asset_class.unwrap_or_default(),
            locale: n.locale.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct NewsNode {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) author: Option<String>,
    #[serde(default)]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    pub(crate) article_url: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) published_utc: Option<String>,
    #[serde(default)]
    pub(crate) tickers: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) publisher: Option<PublisherNode>,
}

#[derive(Deserialize)]
pub(crate) struct PublisherNode {
    #[serde(default)]
    pub(crate) name: Option<String>,
}

impl From<NewsNode> for NewsArticle {
    fn from(n: NewsNode) -> Self {
        Self {
            id: n.id.unwrap_or_default(),
            title: n.title.unwrap_or_default(),
            author: n.author.unwrap_or_default(),
            image_url: n.image_url.unwrap_or_default(),
            article_url: n.article_url.unwrap_or_default(),
            description: n.description.unwrap_or_default(),
            published_utc: n
                .published_utc
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            tickers: n.tickers.unwrap_or_default(),
            publisher: n.publisher.and_then(|p| p.name),
        }
    }
}
