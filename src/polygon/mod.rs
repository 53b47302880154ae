//! Key-authenticated reference data: tickers, ticker types and news.
//!
//! Every request, including each page of a listing, passes through the
//! client's [`RateLimiter`] and gets the `apiKey` parameter appended when the
//! URL does not carry one already.

mod model;
mod news;
mod tickers;
mod wire;

pub use model::{AssetClass, DuplicatePolicy, NewsArticle, Ticker, TickerType};
pub use news::NewsBuilder;
pub use tickers::{TickerIndex, TickersBuilder, group_by_market_and_kind};

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use reqwest::header::ACCEPT;
use url::Url;

use crate::core::client::{HttpOptions, send_for_text};
use crate::core::paginate::{Envelope, PageSource, SUCCESS_STATUS};
use crate::core::{FeedError, RateLimiter};
use wire::TickerTypeNode;

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Free-tier allowance.
pub const DEFAULT_MAX_CALLS_PER_MINUTE: u32 = 5;

/// Environment variable read by [`PolygonClientBuilder::api_key_from_env`].
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";

/// Largest page size the listings accept.
pub const MAX_PAGE_LIMIT: u32 = 1000;

const API_KEY_PARAM: &str = "apiKey";
// Relative to the base URL, which may carry a path prefix.
const TICKERS_PATH: &str = "v3/reference/tickers";
const TICKER_TYPES_PATH: &str = "v3/reference/tickers/types";
const NEWS_PATH: &str = "v2/reference/news";

/// Client for the reference-data REST API.
///
/// Cloning is cheap and clones share the rate limiter and the API key.
#[derive(Clone)]
pub struct PolygonClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base: Url,
    api_key: RwLock<Option<String>>,
    limiter: Arc<RateLimiter>,
    max_admission_wait: Option<Duration>,
}

impl std::fmt::Debug for PolygonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonClient")
            .field("base", &self.inner.base.as_str())
            .field("limiter", &self.inner.limiter)
            .field("max_admission_wait", &self.inner.max_admission_wait)
            .finish_non_exhaustive()
    }
}

impl PolygonClient {
    /// Create a new builder.
    pub fn builder() -> PolygonClientBuilder {
        PolygonClientBuilder::default()
    }

    /// The API key currently in use, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<String> {
        self.inner
            .api_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the API key for all subsequent requests, including those of clones.
    pub fn set_api_key(&self, key: impl Into<String>) {
        let key = key.into();
        *self
            .inner
            .api_key
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(key).filter(|k| !k.trim().is_empty());
        tracing::debug!("API key updated");
    }

    /// The limiter every request of this client is admitted through.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.inner.limiter
    }

    /// Lists the ticker-type codes of `asset_class`.
    ///
    /// Single page. A non-`OK` envelope or one without results yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` on transport failures or an unparseable body.
    #[tracing::instrument(skip(self), err)]
    pub async fn ticker_types(&self, asset_class: AssetClass) -> Result<Vec<TickerType>, FeedError> {
        let mut url = self.endpoint(TICKER_TYPES_PATH)?;
        url.query_pairs_mut()
            .append_pair("asset_class", asset_class.as_str());

        let body = self.get(&url).await?;
        let envelope: Envelope<TickerTypeNode> = serde_json::from_str(&body)?;

        let status = envelope.status.unwrap_or_default();
        if status != SUCCESS_STATUS {
            tracing::warn!(%status, error = ?envelope.error, "ticker types request was not successful");
            return Ok(Vec::new());
        }
        let Some(results) = envelope.results else {
            tracing::warn!("ticker types response carried no results");
            return Ok(Vec::new());
        };
        Ok(results.into_iter().map(TickerType::from).collect())
    }

    /// Starts a ticker listing. See [`TickersBuilder`] for the filters.
    pub fn tickers(&self) -> TickersBuilder {
        TickersBuilder::new(self)
    }

    /// Every ticker the provider lists, across all markets.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` if any page fails.
    pub async fn all_tickers(&self) -> Result<HashSet<Ticker>, FeedError> {
        self.tickers().fetch().await
    }

    /// Every ticker, grouped by market and then by type code.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` if any page fails.
    pub async fn tickers_by_market_and_kind(&self) -> Result<TickerIndex, FeedError> {
        Ok(group_by_market_and_kind(self.all_tickers().await?))
    }

    /// Starts a news query for `symbol` published between `start` and `end`, both inclusive.
    pub fn news(
        &self,
        symbol: impl Into<String>,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> NewsBuilder {
        NewsBuilder::new(self, symbol, start, end)
    }

    /* -------- internals -------- */

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, FeedError> {
        Ok(self.inner.base.join(path)?)
    }

    async fn admit(&self) -> Result<(), FeedError> {
        match self.inner.max_admission_wait {
            Some(max_wait) => self.inner.limiter.enter_within(max_wait).await,
            None => {
                self.inner.limiter.enter().await;
                Ok(())
            }
        }
    }

    fn authorize(&self, url: &Url) -> Result<Url, FeedError> {
        if url.query_pairs().any(|(k, _)| k == API_KEY_PARAM) {
            return Ok(url.clone());
        }
        let key = self.api_key().ok_or(FeedError::MissingApiKey)?;
        let mut url = url.clone();
        url.query_pairs_mut().append_pair(API_KEY_PARAM, &key);
        Ok(url)
    }

    async fn get(&self, url: &Url) -> Result<String, FeedError> {
        let url = self.authorize(url)?;
        self.admit().await?;

        let endpoint = format!(
            "polygon_{}",
            url.path().trim_matches('/').replace('/', "_")
        );
        let key = url
            .query_pairs()
            .find(|(k, _)| k == "cursor")
            .map_or_else(|| "first".to_string(), |(_, v)| v.into_owned());

        let req = self
            .inner
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .build()?;
        send_for_text(&self.inner.http, req, &endpoint, &key).await
    }
}

impl PageSource for PolygonClient {
    fn fetch_page<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String, FeedError>> {
        Box::pin(self.get(url))
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct PolygonClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    limiter: Option<Arc<RateLimiter>>,
    max_calls_per_minute: Option<u32>,
    max_admission_wait: Option<Duration>,
    http: HttpOptions,
}

impl PolygonClientBuilder {
    /// Override the REST base (e.g., `https://api.polygon.io`).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Read the API key from `POLYGON_API_KEY`, if set.
    #[must_use]
    pub fn api_key_from_env(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        self
    }

    /// Share an existing limiter, e.g. between several clients on the same key.
    /// Takes precedence over [`max_calls_per_minute`](Self::max_calls_per_minute).
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Calls admitted per rolling minute. Default: 5.
    #[must_use]
    pub const fn max_calls_per_minute(mut self, n: u32) -> Self {
        self.max_calls_per_minute = Some(n);
        self
    }

    /// Fail with `AdmissionTimeout` instead of waiting longer than `d` for the limiter.
    /// Default: wait as long as it takes.
    #[must_use]
    pub const fn max_admission_wait(mut self, d: Duration) -> Self {
        self.max_admission_wait = Some(d);
        self
    }

    /// Override the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http.user_agent = Some(ua.into());
        self
    }

    /// Set a global request timeout (overall). Default: none.
    #[must_use]
    pub const fn timeout(mut self, d: Duration) -> Self {
        self.http.timeout = Some(d);
        self
    }

    /// Set a connect timeout. Default: none.
    #[must_use]
    pub const fn connect_timeout(mut self, d: Duration) -> Self {
        self.http.connect_timeout = Some(d);
        self
    }

    /// Builds the client. A missing API key is reported by the first request, not here,
    /// so the key can still be supplied later through [`PolygonClient::set_api_key`].
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built or the default base URL does not parse.
    pub fn build(self) -> Result<PolygonClient, FeedError> {
        let mut base = match self.base_url {
            Some(u) => u,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let limiter = self.limiter.unwrap_or_else(|| {
            Arc::new(RateLimiter::per_minute(
                self.max_calls_per_minute
                    .unwrap_or(DEFAULT_MAX_CALLS_PER_MINUTE),
            ))
        });

        Ok(PolygonClient {
            inner: Arc::new(Inner {
                http: self.http.build()?,
                base,
                api_key: RwLock::new(self.api_key.filter(|k| !k.trim().is_empty())),
                limiter,
                max_admission_wait: self.max_admission_wait,
            }),
        })
    }
}
