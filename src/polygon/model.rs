use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::FeedError;

/// Instrument metadata from the reference tickers listing.
///
/// Identity is the symbol alone: two `Ticker`s with the same symbol compare
/// equal and hash identically even if their other fields differ. Listings rely
/// on this to collapse records repeated across pages.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticker {
    symbol: String,
    name: String,
    market: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    primary_exchange: Option<String>,
    #[serde(default)]
    currency_name: Option<String>,
    #[serde(default)]
    active: Option<bool>,
}

impl Ticker {
    /// Creates a ticker with the four identifying columns.
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        market: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            market: market.into(),
            kind: kind.into(),
            locale: None,
            primary_exchange: None,
            currency_name: None,
            active: None,
        }
    }

    pub(crate) fn with_details(
        mut self,
        locale: Option<String>,
        primary_exchange: Option<String>,
        currency_name: Option<String>,
        active: Option<bool>,
    ) -> Self {
        self.locale = locale;
        self.primary_exchange = primary_exchange;
        self.currency_name = currency_name;
        self.active = active;
        self
    }

    /// The ticker symbol, e.g. `AAPL`.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The instrument's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The market code, e.g. `stocks`.
    #[must_use]
    pub fn market(&self) -> &str {
        &self.market
    }

    /// The ticker-type code, e.g. `CS` or `ETF`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Locale of the listing, e.g. `us` or `global`.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// MIC of the primary listing exchange, e.g. `XNAS`.
    #[must_use]
    pub fn primary_exchange(&self) -> Option<&str> {
        self.primary_exchange.as_deref()
    }

    /// Trading currency as the provider names it, e.g. `usd`.
    #[must_use]
    pub fn currency_name(&self) -> Option<&str> {
        self.currency_name.as_deref()
    }

    /// Whether the symbol is still actively traded.
    #[must_use]
    pub const fn active(&self) -> Option<bool> {
        self.active
    }
}

impl PartialEq for Ticker {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Ticker {}

impl Hash for Ticker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl PartialOrd for Ticker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ticker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbol.cmp(&other.symbol)
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.symbol, self.name, self.market, self.kind
        )
    }
}

/// A ticker-type code and its description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerType {
    /// The code used as the `type` filter, e.g. `CS`.
    pub code: String,
    /// Human readable description, e.g. `Common Stock`.
    pub description: String,
    /// The asset class the code belongs to.
    pub asset_class: String,
    /// Locale of the code, e.g. `us`.
    pub locale: String,
}

impl fmt::Display for TickerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} | {} | {}",
            self.code, self.description, self.asset_class, self.locale
        )
    }
}

/// Asset classes accepted by the ticker-types listing and the `market` filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    #[default]
    Stocks,
    Options,
    Crypto,
    Fx,
    Indices,
}

impl AssetClass {
    /// All asset classes, in listing order.
    pub const ALL: [Self; 5] = [
        Self::Stocks,
        Self::Options,
        Self::Crypto,
        Self::Fx,
        Self::Indices,
    ];

    /// The query-parameter form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stocks => "stocks",
            Self::Options => "options",
            Self::Crypto => "crypto",
            Self::Fx => "fx",
            Self::Indices => "indices",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for AssetClass {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for AssetClass {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stocks" => Ok(Self::Stocks),
            "options" => Ok(Self::Options),
            "crypto" => Ok(Self::Crypto),
            "fx" => Ok(Self::Fx),
            // older configurations spell it this way
            "indices" | "indicies" => Ok(Self::Indices),
            other => Err(FeedError::Data(format!("unknown asset class: {other}"))),
        }
    }
}

/// A news article mentioning one or more tickers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Provider-assigned article id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Author line as published.
    pub author: String,
    /// Teaser image, empty when absent.
    pub image_url: String,
    /// Link to the full article.
    pub article_url: String,
    /// Summary, empty when absent.
    pub description: String,
    /// Publication time.
    pub published_utc: Option<DateTime<Utc>>,
    /// Symbols the article is tagged with.
    pub tickers: Vec<String>,
    /// Publisher display name.
    pub publisher: Option<String>,
}

/// What to do with news articles whose id was already seen in an earlier page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Return every record as delivered. (Default)
    #[default]
    Keep,
    /// Drop records whose `id` already appeared, keeping the first occurrence.
    DropById,
}
