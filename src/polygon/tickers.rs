use std::collections::{BTreeMap, HashSet};

use url::Url;

use super::wire::TickerNode;
use super::{MAX_PAGE_LIMIT, PolygonClient, TICKERS_PATH, Ticker};
use crate::core::paginate::fetch_all;
use crate::core::{FeedError, ProgressFn};

/// Tickers grouped by market, then by type code. Each list is sorted by symbol.
pub type TickerIndex = BTreeMap<String, BTreeMap<String, Vec<Ticker>>>;

/// A builder for the paginated ticker listing.
///
/// The result is a set: a ticker repeated across pages is kept once.
pub struct TickersBuilder {
    client: PolygonClient,
    market: Option<String>,
    kind: Option<String>,
    starting_at: Option<String>,
    limit: u32,
    progress: Option<ProgressFn>,
}

impl std::fmt::Debug for TickersBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickersBuilder")
            .field("market", &self.market)
            .field("kind", &self.kind)
            .field("starting_at", &self.starting_at)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl TickersBuilder {
    pub(super) fn new(client: &PolygonClient) -> Self {
        Self {
            client: client.clone(),
            market: None,
            kind: None,
            starting_at: None,
            limit: MAX_PAGE_LIMIT,
            progress: None,
        }
    }

    /// Restrict to one market, e.g. `AssetClass::Stocks` or `"otc"`.
    #[must_use]
    pub fn market(mut self, market: impl AsRef<str>) -> Self {
        self.market = Some(market.as_ref().to_string());
        self
    }

    /// Restrict to one ticker-type code, e.g. `CS`.
    #[must_use]
    pub fn kind(mut self, code: impl Into<String>) -> Self {
        self.kind = Some(code.into());
        self
    }

    /// Only tickers sorting at or after `symbol`; the listing is then ordered by ticker.
    #[must_use]
    pub fn starting_at(mut self, symbol: impl Into<String>) -> Self {
        self.starting_at = Some(symbol.into());
        self
    }

    /// Page size, clamped to `1..=1000`. Default: 1000.
    #[must_use]
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = n.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    /// Called after every page with the running totals.
    #[must_use]
    pub fn progress(mut self, f: ProgressFn) -> Self {
        self.progress = Some(f);
        self
    }

    fn url(&self) -> Result<Url, FeedError> {
        let mut url = self.client.endpoint(TICKERS_PATH)?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("limit", &self.limit.to_string());
            if let Some(m) = &self.market {
                qp.append_pair("market", m);
            }
            if let Some(k) = &self.kind {
                qp.append_pair("type", k);
            }
            if let Some(s) = &self.starting_at {
                qp.append_pair("sort", "ticker");
                qp.append_pair("ticker.gte", s);
            }
        }
        Ok(url)
    }

    /// Fetches every page of the listing.
    ///
    /// # Errors
    ///
    /// Any failing page aborts the listing: transport errors, a non-`OK`
    /// envelope or a `count` that disagrees with the page's records.
    #[tracing::instrument(skip(self), err, fields(market = ?self.market, kind = ?self.kind))]
    pub async fn fetch(self) -> Result<HashSet<Ticker>, FeedError> {
        let url = self.url()?;
        let tickers: HashSet<Ticker> = fetch_all(
            &self.client,
            url,
            |n: TickerNode| Ticker::from(n),
            self.progress.as_ref(),
        )
        .await?;
        tracing::debug!(count = tickers.len(), "tickers loaded");
        Ok(tickers)
    }
}

/// Groups tickers by market, then by type code, each group sorted by symbol.
pub fn group_by_market_and_kind(tickers: impl IntoIterator<Item = Ticker>) -> TickerIndex {
    let mut index = TickerIndex::new();
    for t in tickers {
        index
            .entry(t.market().to_string())
            .or_default()
            .entry(t.kind().to_string())
            .or_default()
            .push(t);
    }
    for group in index.values_mut().flat_map(BTreeMap::values_mut) {
        group.sort();
    }
    index
}
