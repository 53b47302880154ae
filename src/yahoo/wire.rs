use serde::Deserialize;

use super::model::{QuoteItem, QuoteSnapshot};

/* ------------- Minimal serde mapping of /v1/finance/search ------------- */

#[derive(Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(default)]
    pub(crate) quotes: Option<Vec<QuoteItem>>,
}

/* ------------- /v7/finance/quote ------------- */

#[derive(Deserialize)]
pub(crate) struct V7Envelope {
    #[serde(rename = "quoteResponse")]
    pub(crate) quote_response: Option<V7QuoteResponse>,
}

#[derive(Deserialize)]
pub(crate) struct V7QuoteResponse {
    pub(crate) result: Option<Vec<V7QuoteNode>>,
    pub(crate) error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub(crate) struct V7QuoteNode {
    #[serde(default)]
    pub(crate) symbol: Option<String>,
    #[serde(rename = "shortName")]
    pub(crate) short_name: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    pub(crate) regular_market_price: Option<f64>,
    #[serde(rename = "regularMarketPreviousClose")]
    pub(crate) regular_market_previous_close: Option<f64>,
    pub(crate) currency: Option<String>,
    pub(crate) exchange: Option<String>,
    #[serde(rename = "fullExchangeName")]
    pub(crate) full_exchange_name: Option<String>,
    #[serde(rename = "marketState")]
    pub(crate) market_state: Option<String>,
}

impl From<V7QuoteNode> for QuoteSnapshot {
    fn from(n: V7QuoteNode) -> Self {
        Self {
            symbol: n.symbol.unwrap_or_default(),
            short_name: n.short_name,
            regular_market_price: n.regular_market_price,
            regular_market_previous_close: n.regular_market_previous_close,
            currency: n.currency,
            exchange: n.exchange,
            full_exchange_name: n.full_exchange_name,
            market_state: n.market_state,
        }
    }
}
