//! The bot-gated quote provider: free-text search and quote snapshots.
//!
//! Requests carry the session's crumb and cookies. The session is established
//! on first use through a [`SessionBootstrap`], by default the scripted
//! consent walk of [`BrowserBootstrap`].

mod model;
mod quote;
mod search;
mod wire;

pub use model::{QuoteItem, QuoteSnapshot};
pub use search::SearchBuilder;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::core::cache::DEFAULT_CACHE_CAPACITY;
use crate::core::client::{HttpOptions, send_for_text};
use crate::core::session::browser::{DEFAULT_CONSENT_URL, DEFAULT_CRUMB_URL};
use crate::core::{
    BrowserBootstrap, CrumbSession, FeedError, RateLimiter, ResponseCache, SessionBootstrap,
};

/// Production search endpoint.
pub const DEFAULT_SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";

/// Production multi-symbol quote endpoint.
pub const DEFAULT_QUOTE_URL: &str = "https://query2.finance.yahoo.com/v7/finance/quote";

/// Client for search and quote snapshots.
///
/// Cloning is cheap; clones share the session, the search cache and the limiter.
#[derive(Clone)]
pub struct YahooClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    search_base: Url,
    quote_base: Url,
    session: CrumbSession,
    cache: ResponseCache,
    limiter: Option<Arc<RateLimiter>>,
    refresh_on_auth_failure: bool,
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("search_base", &self.inner.search_base.as_str())
            .field("quote_base", &self.inner.quote_base.as_str())
            .field("session", &self.inner.session)
            .field("cached", &self.inner.cache.len())
            .finish_non_exhaustive()
    }
}

impl YahooClient {
    /// Create a new builder.
    pub fn builder() -> YahooClientBuilder {
        YahooClientBuilder::default()
    }

    /// Starts a quote search for `query`. See [`SearchBuilder`].
    pub fn search(&self, query: impl Into<String>) -> SearchBuilder {
        SearchBuilder::new(self, query)
    }

    /// The session every request is decorated with.
    #[must_use]
    pub fn session(&self) -> &CrumbSession {
        &self.inner.session
    }

    /// The search response cache.
    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /* -------- internals -------- */

    pub(crate) fn search_base(&self) -> &Url {
        &self.inner.search_base
    }

    pub(crate) fn quote_base(&self) -> &Url {
        &self.inner.quote_base
    }

    /// GETs `url` with the session applied and returns the body.
    ///
    /// With `refresh_session_on_auth_failure` a 401/403 drops the session and
    /// the request is repeated once with a freshly bootstrapped one.
    pub(crate) async fn get(&self, url: &Url, endpoint: &str, key: &str) -> Result<String, FeedError> {
        let mut refreshed = false;
        loop {
            if let Some(limiter) = &self.inner.limiter {
                limiter.enter().await;
            }

            let mut req = self.inner.http.get(url.clone()).build()?;
            self.inner.session.prepare(&mut req).await;

            match send_for_text(&self.inner.http, req, endpoint, key).await {
                Err(FeedError::Status {
                    status: 401 | 403, ..
                }) if self.inner.refresh_on_auth_failure && !refreshed => {
                    tracing::debug!(endpoint, "auth rejected, refreshing crumb session");
                    self.inner.session.invalidate().await;
                    refreshed = true;
                }
                other => return other,
            }
        }
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct YahooClientBuilder {
    search_base: Option<Url>,
    quote_base: Option<Url>,
    consent_url: Option<Url>,
    crumb_url: Option<Url>,
    bootstrap: Option<Arc<dyn SessionBootstrap>>,
    cache_capacity: Option<usize>,
    limiter: Option<Arc<RateLimiter>>,
    refresh_on_auth_failure: bool,
    http: HttpOptions,
}

impl YahooClientBuilder {
    /// Override the search endpoint (e.g., `https://query1.finance.yahoo.com/v1/finance/search`).
    #[must_use]
    pub fn search_base(mut self, url: Url) -> Self {
        self.search_base = Some(url);
        self
    }

    /// Override the quote endpoint (e.g., `https://query2.finance.yahoo.com/v7/finance/quote`).
    #[must_use]
    pub fn quote_base(mut self, url: Url) -> Self {
        self.quote_base = Some(url);
        self
    }

    /// Override the consent page used by the default bootstrap.
    #[must_use]
    pub fn consent_url(mut self, url: Url) -> Self {
        self.consent_url = Some(url);
        self
    }

    /// Override the crumb endpoint used by the default bootstrap.
    #[must_use]
    pub fn crumb_url(mut self, url: Url) -> Self {
        self.crumb_url = Some(url);
        self
    }

    /// Obtain the session through `bootstrap` instead of the consent walk.
    /// Takes precedence over [`consent_url`](Self::consent_url) and [`crumb_url`](Self::crumb_url).
    #[must_use]
    pub fn session_bootstrap(mut self, bootstrap: Arc<dyn SessionBootstrap>) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Number of search responses kept. Default: 10 000.
    #[must_use]
    pub const fn cache_capacity(mut self, n: usize) -> Self {
        self.cache_capacity = Some(n);
        self
    }

    /// Admit every request through `limiter`. Default: no limit.
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Shorthand for a fresh limiter of `n` calls per rolling minute.
    #[must_use]
    pub fn max_calls_per_minute(mut self, n: u32) -> Self {
        self.limiter = Some(Arc::new(RateLimiter::per_minute(n)));
        self
    }

    /// On HTTP 401/403, re-run the bootstrap and retry the request once. Default: off.
    #[must_use]
    pub const fn refresh_session_on_auth_failure(mut self, on: bool) -> Self {
        self.refresh_on_auth_failure = on;
        self
    }

    /// Override the User-Agent of the underlying client.
    ///
    /// Gated requests still send the session's own `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http.user_agent = Some(ua.into());
        self
    }

    /// Set a global request timeout (overall). Default: none.
    ///
    /// Also bounds every hop of the default consent walk.
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

    /// Builds the client. No network I/O happens until the first request.
    ///
    /// # Errors
    ///
    /// Fails if an HTTP client cannot be built or a default URL does not parse.
    pub fn build(self) -> Result<YahooClient, FeedError> {
        let search_base = match self.search_base {
            Some(u) => u,
            None => Url::parse(DEFAULT_SEARCH_URL)?,
        };
        let quote_base = match self.quote_base {
            Some(u) => u,
            None => Url::parse(DEFAULT_QUOTE_URL)?,
        };

        let bootstrap: Arc<dyn SessionBootstrap> = match self.bootstrap {
            Some(b) => b,
            None => {
                let consent = match self.consent_url {
                    Some(u) => u,
                    None => Url::parse(DEFAULT_CONSENT_URL)?,
                };
                let crumb = match self.crumb_url {
                    Some(u) => u,
                    None => Url::parse(DEFAULT_CRUMB_URL)?,
                };
                Arc::new(BrowserBootstrap::with_options(consent, crumb, &self.http)?)
            }
        };

        Ok(YahooClient {
            inner: Arc::new(Inner {
                http: self.http.build()?,
                search_base,
                quote_base,
                session: CrumbSession::new(bootstrap),
                cache: ResponseCache::new(self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)),
                limiter: self.limiter,
                refresh_on_auth_failure: self.refresh_on_auth_failure,
            }),
        })
    }
}
