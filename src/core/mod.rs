//! Core components of the `stockfeed` fetch layer.
//!
//! This module contains the provider-agnostic building blocks:
//! - The primary [`FeedError`] type and its [`ErrorKind`] classification.
//! - The sliding-window [`RateLimiter`].
//! - The bounded LRU [`ResponseCache`].
//! - The cursor-following paginator and its envelope validation.
//! - The consent/crumb [`CrumbSession`] and its bootstrap seam.

/// LRU response cache and cache-key canonicalization.
pub mod cache;
pub(crate) mod client;
/// The primary error type (`FeedError`) for the crate.
pub mod error;
/// Sliding-window rate limiting.
pub mod limiter;
pub(crate) mod net;
/// Cursor pagination over status/results/count/next_url envelopes.
pub mod paginate;
/// Cookie-consent and crumb session handling.
pub mod session;

#[cfg(feature = "test-mode")]
pub(crate) mod fixtures;

// convenient re-exports so most code can just `use crate::core::FeedError`
pub use cache::{CacheMode, ResponseCache};
pub use error::{ErrorKind, FeedError};
pub use limiter::RateLimiter;
pub use paginate::{PageProgress, ProgressFn};
pub use session::{
    BrowserBootstrap, CrumbSession, Session, SessionBootstrap, SessionCookie, StaticBootstrap,
};
