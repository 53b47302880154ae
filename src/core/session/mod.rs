//! Consent/crumb session for the bot-gated provider.
//!
//! A [`CrumbSession`] obtains its [`Session`] once, lazily, through a
//! [`SessionBootstrap`]. A failed bootstrap is not an error for callers: the
//! session is kept in a degraded state (`instantiated == false`) and requests
//! are still decorated with headers and whatever cookies exist, just without a
//! crumb. The state never changes afterwards unless [`CrumbSession::invalidate`]
//! is called explicitly.

pub mod browser;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use reqwest::header::{ACCEPT, COOKIE, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::core::FeedError;

pub use browser::BrowserBootstrap;

/// `Accept` header sent with every gated request.
pub const ACCEPT_HEADER_VALUE: &str = "text/html,application/json";

/// `User-Agent` header sent with every gated request.
pub const USER_AGENT_HEADER_VALUE: &str = "Mozilla/5.0";

/// A cookie captured during the bootstrap, replayed by value afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie was issued for.
    pub domain: String,
    /// Path the cookie was issued for.
    pub path: String,
    /// Expiry, if the cookie is not a session cookie.
    pub expires: Option<DateTime<Utc>>,
}

impl SessionCookie {
    /// Creates a cookie for `domain` with path `/` and no expiry.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expires: None,
        }
    }
}

/// Cookies and crumb obtained from one bootstrap.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<SessionCookie>,
    crumb: String,
    instantiated: bool,
}

impl Session {
    /// A usable session.
    #[must_use]
    pub fn new(cookies: Vec<SessionCookie>, crumb: impl Into<String>) -> Self {
        Self {
            cookies,
            crumb: crumb.into(),
            instantiated: true,
        }
    }

    /// The session left behind by a failed bootstrap.
    #[must_use]
    pub fn degraded() -> Self {
        Self::default()
    }

    /// Whether the bootstrap succeeded.
    #[must_use]
    pub const fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    /// The crumb, if the session is usable.
    #[must_use]
    pub fn crumb(&self) -> Option<&str> {
        self.instantiated.then_some(self.crumb.as_str())
    }

    /// Cookies to replay.
    #[must_use]
    pub fn cookies(&self) -> &[SessionCookie] {
        &self.cookies
    }

    /// All cookies as a single `Cookie` header value (`a=1; b=2`).
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Decorates an outgoing request.
    ///
    /// `Accept`, `User-Agent` and the stored cookies are always attached. The
    /// `crumb` query parameter is appended only when the session is
    /// instantiated; otherwise the degraded state is logged and the request
    /// goes out without it.
    pub fn prepare_request(&self, req: &mut reqwest::Request) {
        let headers = req.headers_mut();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER_VALUE));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_HEADER_VALUE));

        if let Some(cookies) = self.cookie_header() {
            match HeaderValue::from_str(&cookies) {
                Ok(v) => {
                    headers.insert(COOKIE, v);
                    tracing::trace!(count = self.cookies.len(), "cookie header added");
                }
                Err(e) => tracing::warn!(error = %e, "stored cookies do not form a valid header"),
            }
        }

        if self.instantiated {
            req.url_mut()
                .query_pairs_mut()
                .append_pair("crumb", &self.crumb);
            tracing::trace!("crumb added");
        } else {
            tracing::error!(url = %req.url(), "crumb session was not properly instantiated, sending request without crumb");
        }
    }
}

/// Narrow seam for obtaining a [`Session`].
///
/// Production code uses [`BrowserBootstrap`]; tests hand in a
/// [`StaticBootstrap`] or their own implementation.
pub trait SessionBootstrap: Send + Sync {
    /// Runs the bootstrap once.
    ///
    /// # Errors
    ///
    /// Any failure; the caller degrades the session instead of propagating it.
    fn bootstrap(&self) -> BoxFuture<'_, Result<Session, FeedError>>;
}

/// A bootstrap that hands out a fixed outcome without any I/O.
#[derive(Clone, Debug)]
pub struct StaticBootstrap {
    outcome: Result<Session, String>,
}

impl StaticBootstrap {
    /// Always succeeds with the given cookies and crumb.
    pub fn new(cookies: Vec<SessionCookie>, crumb: impl Into<String>) -> Self {
        Self {
            outcome: Ok(Session::new(cookies, crumb)),
        }
    }

    /// Always fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(reason.into()),
        }
    }
}

impl SessionBootstrap for StaticBootstrap {
    fn bootstrap(&self) -> BoxFuture<'_, Result<Session, FeedError>> {
        let outcome = self.outcome.clone().map_err(FeedError::Session);
        Box::pin(async move { outcome })
    }
}

/// Lazily bootstrapped, shared session for one provider.
pub struct CrumbSession {
    bootstrap: Arc<dyn SessionBootstrap>,
    state: RwLock<Option<Arc<Session>>>,
    fetch_lock: Mutex<()>,
    attempts: AtomicUsize,
}

impl std::fmt::Debug for CrumbSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrumbSession")
            .field("attempts", &self.attempts.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl CrumbSession {
    /// Wraps a bootstrap. Nothing runs until the first request needs the session.
    pub fn new(bootstrap: Arc<dyn SessionBootstrap>) -> Self {
        Self {
            bootstrap,
            state: RwLock::new(None),
            fetch_lock: Mutex::new(()),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Returns the session, running the bootstrap if no session exists yet.
    ///
    /// Concurrent first callers share a single bootstrap run.
    pub async fn session(&self) -> Arc<Session> {
        // Fast path: the session exists already.
        if let Some(s) = self.state.read().await.as_ref() {
            return s.clone();
        }

        let _guard = self.fetch_lock.lock().await;

        // Another task may have finished the bootstrap while this one waited.
        if let Some(s) = self.state.read().await.as_ref() {
            return s.clone();
        }

        self.attempts.fetch_add(1, Ordering::SeqCst);
        let session = match self.bootstrap.bootstrap().await {
            Ok(s) => {
                tracing::debug!(cookies = s.cookies().len(), "crumb session established");
                s
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot capture crumb and cookies, continuing without a crumb");
                Session::degraded()
            }
        };

        let session = Arc::new(session);
        *self.state.write().await = Some(session.clone());
        session
    }

    /// Decorates `req` with the session, bootstrapping first if needed.
    pub async fn prepare(&self, req: &mut reqwest::Request) {
        self.session().await.prepare_request(req);
    }

    /// Whether the current session is usable. Bootstraps if needed.
    pub async fn is_instantiated(&self) -> bool {
        self.session().await.is_instantiated()
    }

    /// Drops the current session so the next request bootstraps again.
    pub async fn invalidate(&self) {
        let _guard = self.fetch_lock.lock().await;
        *self.state.write().await = None;
        tracing::debug!("crumb session invalidated");
    }

    /// How many times the bootstrap has run.
    pub fn bootstrap_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}
