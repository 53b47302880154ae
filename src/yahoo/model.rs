use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// One hit of a quote search.
///
/// Equality and hashing consider only `symbol`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteItem {
    /// Exchange code, e.g. `NMS`.
    pub exchange: String,
    /// Short display name.
    pub shortname: String,
    /// Instrument class, e.g. `EQUITY` or `ETF`.
    pub quote_type: String,
    /// The symbol, e.g. `AAPL`.
    pub symbol: String,
    /// Search index the hit came from.
    pub index: String,
    /// Display form of `quote_type`, e.g. `Equity`.
    pub type_disp: String,
    /// Full legal name.
    pub longname: String,
    /// Display form of `exchange`, e.g. `NASDAQ`.
    pub exch_disp: String,
    /// Whether the provider has its own quote page for the hit.
    pub is_yahoo_finance: bool,
}

impl PartialEq for QuoteItem {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for QuoteItem {}

impl Hash for QuoteItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

/// A point-in-time quote from the multi-symbol quote endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Symbol the quote was requested for.
    pub symbol: String,
    /// Display name of the instrument.
    pub short_name: Option<String>,
    /// Last traded price in the regular session.
    pub regular_market_price: Option<f64>,
    /// Close of the previous regular session.
    pub regular_market_previous_close: Option<f64>,
    /// ISO currency code of the prices.
    pub currency: Option<String>,
    /// Exchange code, e.g. `NMS`.
    pub exchange: Option<String>,
    /// Exchange display name, e.g. `NasdaqGS`.
    pub full_exchange_name: Option<String>,
    /// Session state, e.g. `REGULAR`, `PRE`, `POST` or `CLOSED`.
    pub market_state: Option<String>,
}
