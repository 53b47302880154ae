//! Cursor-following "fetch everything" loop with envelope validation.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::core::FeedError;

/// The literal status marker of a successful envelope.
pub(crate) const SUCCESS_STATUS: &str = "OK";

/// Progress snapshot handed to a [`ProgressFn`] after every page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageProgress {
    /// Records collected so far, counting duplicates.
    pub items: usize,
    /// Pages fetched so far.
    pub pages: usize,
    /// Time since the first request was issued.
    pub elapsed: Duration,
}

impl fmt::Display for PageProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs();
        write!(
            f,
            "Items collected: {}, Elapsed time: {:02}:{:02}:{:02}",
            self.items,
            secs / 3600,
            (secs % 3600) / 60,
            secs % 60
        )
    }
}

/// Callback invoked after each page of a paginated listing.
pub type ProgressFn = Arc<dyn Fn(&PageProgress) + Send + Sync>;

/// Wire shape of a paginated provider response.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "W: Deserialize<'de>"))]
pub(crate) struct Envelope<W> {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) results: Option<Vec<W>>,
    #[serde(default)]
    pub(crate) count: Option<usize>,
    #[serde(default)]
    pub(crate) next_url: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) request_id: Option<String>,
}

/// A validated envelope.
#[derive(Debug)]
pub(crate) struct Page<W> {
    pub(crate) results: Vec<W>,
    pub(crate) next_url: Option<String>,
}

impl<W> Envelope<W> {
    /// Enforces the status marker and the `count == len(results)` invariant.
    pub(crate) fn into_page(self) -> Result<Page<W>, FeedError> {
        let status = self.status.unwrap_or_default();
        if status != SUCCESS_STATUS {
            let message = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "Status is not OK".to_string());
            tracing::debug!(%status, request_id = ?self.request_id, %message, "provider rejected request");
            return Err(FeedError::Provider { status, message });
        }

        let results = self.results.unwrap_or_default();
        if let Some(expected) = self.count
            && expected != results.len()
        {
            return Err(FeedError::CountMismatch {
                expected,
                actual: results.len(),
            });
        }

        Ok(Page {
            results,
            next_url: self.next_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

pub(crate) fn parse_page<W: DeserializeOwned>(body: &str) -> Result<Page<W>, FeedError> {
    let envelope: Envelope<W> = serde_json::from_str(body)?;
    envelope.into_page()
}

/// One provider's way of turning a page URL into a response body.
///
/// Implementations perform rate limiter admission and credential decoration
/// right before the HTTP call, so every page pays its own admission.
pub(crate) trait PageSource: Send + Sync {
    fn fetch_page<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<String, FeedError>>;
}

/// Fetches `first` and every page reachable through `next_url`, in cursor order.
///
/// Each record is mapped through `parse` and pushed into a fresh `C`; a set
/// collapses duplicates, a `Vec` keeps them. Any failing page aborts the whole
/// loop and nothing accumulated so far is returned.
pub(crate) async fn fetch_all<S, W, T, C, F>(
    source: &S,
    first: Url,
    parse: F,
    progress: Option<&ProgressFn>,
) -> Result<C, FeedError>
where
    S: PageSource + ?Sized,
    W: DeserializeOwned,
    C: Default + Extend<T>,
    F: Fn(W) -> T,
{
    let started = Instant::now();
    let mut acc = C::default();
    let mut items = 0usize;
    let mut pages = 0usize;
    let mut next = Some(first);

    while let Some(url) = next.take() {
        tracing::trace!(url = %redact(&url), "fetching page");
        let body = source.fetch_page(&url).await?;
        let page: Page<W> = parse_page(&body)?;

        pages += 1;
        items += page.results.len();
        acc.extend(page.results.into_iter().map(&parse));

        if let Some(cb) = progress {
            cb(&PageProgress {
                items,
                pages,
                elapsed: started.elapsed(),
            });
        }

        next = match page.next_url {
            Some(cursor) => Some(url.join(&cursor)?),
            None => None,
        };
    }

    tracing::debug!(
        pages,
        items,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "pagination complete"
    );
    Ok(acc)
}

/// Strips credentials before a URL reaches the logs.
pub(crate) fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "apiKey" || k == "crumb" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    if pairs.is_empty() {
        return shown.to_string();
    }
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}
