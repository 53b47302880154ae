//! HTTP plumbing shared by the provider clients.
//! Builders embed [`HttpOptions`]; every call goes out through [`send_for_text`].

use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder, Request};

use crate::core::paginate::redact;
use crate::core::{FeedError, net};

/// Desktop browser UA, sent unless the builder overrides it.
pub(crate) const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/122.0.0.0 Safari/537.36"
);

/// Transport settings collected by the client builders.
#[derive(Clone, Debug, Default)]
pub(crate) struct HttpOptions {
    pub(crate) user_agent: Option<String>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) connect_timeout: Option<Duration>,
}

impl HttpOptions {
    /// A client builder carrying the user agent and both timeouts.
    pub(crate) fn client_builder(&self) -> ClientBuilder {
        let mut httpb =
            Client::builder().user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT));

        if let Some(t) = self.timeout {
            httpb = httpb.timeout(t);
        }
        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }
        httpb
    }

    pub(crate) fn build(&self) -> Result<Client, FeedError> {
        Ok(self.client_builder().build()?)
    }
}

/// Executes `req` and returns the body of a successful response.
///
/// Non-success statuses are mapped through [`FeedError::from_status`] with
/// credentials stripped from the reported URL. `endpoint` and `key` name the
/// fixture when recording is enabled.
pub(crate) async fn send_for_text(
    http: &Client,
    req: Request,
    endpoint: &str,
    key: &str,
) -> Result<String, FeedError> {
    let url = redact(req.url());
    let started = Instant::now();

    let resp = http.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        tracing::debug!(%url, status = status.as_u16(), "endpoint returned an error status");
        return Err(FeedError::from_status(status.as_u16(), url));
    }

    let body = net::get_text(resp, endpoint, key, "json").await?;
    tracing::debug!(
        %url,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "calling endpoint"
    );
    Ok(body)
}
