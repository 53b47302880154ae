//! stockfeed: the market-data fetch layer of a stock browser.
//!
//! Two providers are supported:
//! - [`PolygonClient`]: key-authenticated REST with cursor pagination
//!   (tickers, ticker types, news). Every page is admitted through a
//!   sliding-window [`RateLimiter`].
//! - [`YahooClient`]: quote search and quote snapshots behind a cookie-consent
//!   wall, using a lazily bootstrapped [`CrumbSession`]. Search responses are
//!   kept in an LRU [`ResponseCache`].
//!
//! Both clients are cheap to clone and are meant to be built once by the
//! application and passed to whoever needs them.
//!
//! ```no_run
//! # async fn demo() -> Result<(), stockfeed::FeedError> {
//! use chrono::NaiveDate;
//! use stockfeed::{AssetClass, PolygonClient, YahooClient};
//!
//! let polygon = PolygonClient::builder().api_key_from_env().build()?;
//! let stocks = polygon.tickers().market(AssetClass::Stocks).fetch().await?;
//! let news = polygon
//!     .news(
//!         "AAPL",
//!         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//!     )
//!     .fetch()
//!     .await?;
//!
//! let yahoo = YahooClient::builder().build()?;
//! let hits = yahoo.search("SAP").fetch().await?;
//! # let _ = (stocks, news, hits);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod polygon;
pub mod yahoo;

pub use crate::core::{
    BrowserBootstrap, CacheMode, CrumbSession, ErrorKind, FeedError, PageProgress, ProgressFn,
    RateLimiter, ResponseCache, Session, SessionBootstrap, SessionCookie, StaticBootstrap,
};
pub use polygon::{
    AssetClass, DuplicatePolicy, NewsArticle, NewsBuilder, PolygonClient, PolygonClientBuilder,
    Ticker, TickerIndex, TickerType, TickersBuilder,
};
pub use yahoo::{QuoteItem, QuoteSnapshot, SearchBuilder, YahooClient, YahooClientBuilder};

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
