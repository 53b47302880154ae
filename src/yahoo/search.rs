use url::Url;

use super::YahooClient;
use super::model::QuoteItem;
use super::wire::SearchEnvelope;
use crate::core::cache::cache_key;
use crate::core::{CacheMode, FeedError};

const DEFAULT_QUOTES_COUNT: u32 = 10;
const DEFAULT_LANG: &str = "de-de";
const DEFAULT_REGION: &str = "DE";

/// Fixed tuning parameters of the search endpoint: quotes only, exact phrase matching.
const TUNING: &[(&str, &str)] = &[
    ("newsCount", "0"),
    ("listsCount", "0"),
    ("enableFuzzyQuery", "false"),
    ("quotesQueryId", "tss_match_phrase_query"),
    ("multiQuoteQueryId", "multi_quote_single_token_query"),
    ("newsQueryId", "news_cie_vespa"),
    ("enableCb", "false"),
    ("enableNavLinks", "false"),
    ("enableEnhancedTrivialQuery", "true"),
    ("enableResearchReports", "false"),
    ("enableCulturalAssets", "false"),
    ("enableLogoUrl", "false"),
];

fn parse_search_body(body: &str) -> Result<Vec<QuoteItem>, FeedError> {
    let env: SearchEnvelope = serde_json::from_str(body)?;
    match env.quotes {
        Some(quotes) => Ok(quotes),
        None => {
            tracing::error!("no quotes array in the search response");
            Ok(Vec::new())
        }
    }
}

/// A builder for a free-text quote search.
///
/// Responses are cached by their canonical request signature, so repeating a
/// search is answered without touching the network.
#[derive(Debug)]
pub struct SearchBuilder {
    client: YahooClient,
    query: String,
    quotes_count: u32,
    lang: String,
    region: String,
    cache_mode: CacheMode,
}

impl SearchBuilder {
    pub(super) fn new(client: &YahooClient, query: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            query: query.into(),
            quotes_count: DEFAULT_QUOTES_COUNT,
            lang: DEFAULT_LANG.to_string(),
            region: DEFAULT_REGION.to_string(),
            cache_mode: CacheMode::Use,
        }
    }

    /// Sets the maximum number of quote results to return. Default: 10.
    #[must_use]
    pub const fn quotes_count(mut self, n: u32) -> Self {
        self.quotes_count = n;
        self
    }

    /// Sets the language for the search results. Default: `de-de`.
    #[must_use]
    pub fn lang(mut self, s: impl Into<String>) -> Self {
        self.lang = s.into();
        self
    }

    /// Sets the region for the search results. Default: `DE`.
    #[must_use]
    pub fn region(mut self, s: impl Into<String>) -> Self {
        self.region = s.into();
        self
    }

    /// Sets the cache mode for this specific API call.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    fn url(&self) -> Url {
        let mut url = self.client.search_base().clone();
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("lang", &self.lang);
            qp.append_pair("region", &self.region);
            qp.append_pair("quotesCount", &self.quotes_count.to_string());
            qp.extend_pairs(TUNING);
            qp.append_pair("q", &self.query);
        }
        url
    }

    /// Executes the search.
    ///
    /// A response without a `quotes` array yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` if the request fails, the endpoint answers with a
    /// non-success status, or the body is not JSON.
    #[tracing::instrument(skip(self), err, fields(query = %self.query))]
    pub async fn fetch(self) -> Result<Vec<QuoteItem>, FeedError> {
        let url = self.url();
        let key = cache_key(&url);
        let cache = self.client.cache();

        if self.cache_mode == CacheMode::Use
            && let Some(body) = cache.get(&key)
        {
            tracing::trace!("search served from cache");
            return parse_search_body(&body);
        }

        let body = self.client.get(&url, "search_v1", &self.query).await?;
        let items = parse_search_body(&body)?;
        if self.cache_mode != CacheMode::Bypass {
            cache.put(key, body);
        }
        Ok(items)
    }
}
