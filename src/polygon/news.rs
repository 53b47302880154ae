use std::collections::HashSet;

use chrono::NaiveDate;
use url::Url;

use super::wire::NewsNode;
use super::{DuplicatePolicy, MAX_PAGE_LIMIT, NEWS_PATH, NewsArticle, PolygonClient};
use crate::core::paginate::fetch_all;
use crate::core::{FeedError, ProgressFn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A builder for the paginated news listing of one symbol.
///
/// Articles come back in cursor order, oldest first.
pub struct NewsBuilder {
    client: PolygonClient,
    symbol: String,
    start: NaiveDate,
    end: NaiveDate,
    limit: u32,
    duplicates: DuplicatePolicy,
    progress: Option<ProgressFn>,
}

impl std::fmt::Debug for NewsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsBuilder")
            .field("symbol", &self.symbol)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("limit", &self.limit)
            .field("duplicates", &self.duplicates)
            .finish_non_exhaustive()
    }
}

impl NewsBuilder {
    pub(super) fn new(
        client: &PolygonClient,
        symbol: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            client: client.clone(),
            symbol: symbol.into(),
            start,
            end,
            limit: MAX_PAGE_LIMIT,
            duplicates: DuplicatePolicy::Keep,
            progress: None,
        }
    }

    /// Page size, clamped to `1..=1000`. Default: 1000.
    #[must_use]
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = n.clamp(1, MAX_PAGE_LIMIT);
        self
    }

    /// How to treat an article id seen twice. Default: [`DuplicatePolicy::Keep`].
    #[must_use]
    pub const fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Called after every page with the running totals.
    #[must_use]
    pub fn progress(mut self, f: ProgressFn) -> Self {
        self.progress = Some(f);
        self
    }

    fn url(&self) -> Result<Url, FeedError> {
        if self.start > self.end {
            return Err(FeedError::InvalidDates);
        }
        let mut url = self.client.endpoint(NEWS_PATH)?;
        url.query_pairs_mut()
            .append_pair("ticker", &self.symbol)
            .append_pair(
                "published_utc.gte",
                &self.start.format(DATE_FORMAT).to_string(),
            )
            .append_pair(
                "published_utc.lte",
                &self.end.format(DATE_FORMAT).to_string(),
            )
            .append_pair("sort", "published_utc")
            .append_pair("limit", &self.limit.to_string());
        Ok(url)
    }

    /// Fetches every page of articles in the date range.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::InvalidDates` if `start` is after `end`; otherwise
    /// any failing page aborts the listing.
    #[tracing::instrument(skip(self), err, fields(symbol = %self.symbol, start = %self.start, end = %self.end))]
    pub async fn fetch(self) -> Result<Vec<NewsArticle>, FeedError> {
        let url = self.url()?;
        let articles: Vec<NewsArticle> = fetch_all(
            &self.client,
            url,
            |n: NewsNode| NewsArticle::from(n),
            self.progress.as_ref(),
        )
        .await?;

        Ok(match self.duplicates {
            DuplicatePolicy::Keep => articles,
            DuplicatePolicy::DropById => drop_repeated_ids(articles),
        })
    }
}

fn drop_repeated_ids(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let before = articles.len();
    let mut seen = HashSet::new();
    let kept: Vec<_> = articles
        .into_iter()
        .filter(|a| seen.insert(a.id.clone()))
        .collect();
    if kept.len() < before {
        tracing::debug!(dropped = before - kept.len(), "dropped repeated news articles");
    }
    kept
}
