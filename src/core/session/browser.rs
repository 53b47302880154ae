//! Scripted walk through the consent wall that yields a crumb session.
//!
//! No JavaScript runs. The consent page is parsed, the consent button is
//! located with a CSS selector and "clicked" by submitting its enclosing form
//! the way a browser would. Redirects are followed by hand so the cookies set
//! on every hop are captured with their domain, path and expiry.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::{Client, Method, RequestBuilder, Response, redirect};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{Session, SessionBootstrap, SessionCookie};
use crate::core::FeedError;
use crate::core::client::HttpOptions;
use futures::future::BoxFuture;

/// Page that presents the consent wall.
pub const DEFAULT_CONSENT_URL: &str = "https://finance.yahoo.com/quote/AAPL";

/// Endpoint that issues a crumb once consent cookies are present.
pub const DEFAULT_CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";

/// Locator of the "accept all cookies" button.
pub const CONSENT_BUTTON_SELECTOR: &str = "button[name='agree']";

const MAX_REDIRECTS: usize = 10;

/// Production [`SessionBootstrap`]: consent page, button click, crumb endpoint.
#[derive(Debug, Clone)]
pub struct BrowserBootstrap {
    http: Client,
    consent_url: Url,
    crumb_url: Url,
    consent_button: String,
}

impl BrowserBootstrap {
    /// Bootstrap against the default endpoints.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FeedError> {
        Self::with_urls(
            Url::parse(DEFAULT_CONSENT_URL)?,
            Url::parse(DEFAULT_CRUMB_URL)?,
        )
    }

    /// Bootstrap against custom consent and crumb endpoints.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn with_urls(consent_url: Url, crumb_url: Url) -> Result<Self, FeedError> {
        Self::with_options(consent_url, crumb_url, &HttpOptions::default())
    }

    /// Like [`with_urls`](Self::with_urls), with the owning client's user agent and timeouts.
    pub(crate) fn with_options(
        consent_url: Url,
        crumb_url: Url,
        options: &HttpOptions,
    ) -> Result<Self, FeedError> {
        let http = options
            .client_builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            consent_url,
            crumb_url,
            consent_button: CONSENT_BUTTON_SELECTOR.to_string(),
        })
    }

    /// Overrides the CSS selector of the consent button.
    #[must_use]
    pub fn consent_button(mut self, selector: impl Into<String>) -> Self {
        self.consent_button = selector.into();
        self
    }

    async fn run(&self) -> Result<Session, FeedError> {
        let mut jar = CookieLog::default();

        let page = self
            .navigate(
                self.http
                    .get(self.consent_url.clone())
                    .header(ACCEPT, "text/html"),
                &mut jar,
            )
            .await?;
        let page_url = page.url().clone();
        let html = page.text().await?;

        let button = find_consent_button(&html, &page_url, &self.consent_button)?;
        match button.form {
            Some(form) => {
                tracing::debug!(action = %form.action, method = %form.method, "clicking consent button");
                let req = if form.method == Method::POST {
                    self.http.post(form.action).form(&form.fields)
                } else {
                    self.http.get(form.action).query(&form.fields)
                };
                self.navigate(req, &mut jar).await?;
            }
            None => tracing::debug!("consent button has no form, nothing to submit"),
        }

        let resp = self
            .navigate(self.http.get(self.crumb_url.clone()), &mut jar)
            .await?;
        let crumb = resp.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('{') || crumb.contains('<') {
            return Err(FeedError::Session(format!("Received invalid crumb: {crumb}")));
        }
        tracing::trace!(%crumb, "crumb set");

        Ok(Session::new(jar.into_cookies(), crumb))
    }

    /// Sends `req` and follows redirects, recording cookies on every hop.
    async fn navigate(
        &self,
        req: RequestBuilder,
        jar: &mut CookieLog,
    ) -> Result<Response, FeedError> {
        let mut resp = req.send().await?;
        let mut hops = 0;
        loop {
            jar.record(&resp);
            let status = resp.status();

            if status.is_redirection() {
                if hops == MAX_REDIRECTS {
                    return Err(FeedError::Session(format!(
                        "too many redirects starting at {}",
                        resp.url()
                    )));
                }
                let location = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| FeedError::Session("redirect without Location".into()))?;
                let next = resp.url().join(location)?;
                tracing::trace!(%next, "following redirect");
                resp = self.http.get(next).send().await?;
                hops += 1;
                continue;
            }

            if !status.is_success() {
                return Err(FeedError::from_status(status.as_u16(), resp.url().as_str()));
            }
            return Ok(resp);
        }
    }
}

impl SessionBootstrap for BrowserBootstrap {
    fn bootstrap(&self) -> BoxFuture<'_, Result<Session, FeedError>> {
        Box::pin(self.run())
    }
}

/// Cookies seen during the walk, newest value per (name, domain, path).
#[derive(Debug, Default)]
struct CookieLog {
    cookies: Vec<SessionCookie>,
}

impl CookieLog {
    fn record(&mut self, resp: &Response) {
        let host = resp.url().host_str().unwrap_or_default().to_string();
        for c in resp.cookies() {
            let expires = c
                .max_age()
                .and_then(|age| TimeDelta::from_std(age).ok())
                .map(|age| Utc::now() + age)
                .or_else(|| c.expires().map(DateTime::<Utc>::from));
            let cookie = SessionCookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
                domain: c.domain().map_or_else(|| host.clone(), str::to_string),
                path: c.path().unwrap_or("/").to_string(),
                expires,
            };

            self.cookies.retain(|x| {
                !(x.name == cookie.name && x.domain == cookie.domain && x.path == cookie.path)
            });
            if cookie.expires.is_some_and(|at| at <= Utc::now()) {
                continue;
            }
            tracing::trace!(name = %cookie.name, domain = %cookie.domain, "cookie saved");
            self.cookies.push(cookie);
        }
    }

    fn into_cookies(self) -> Vec<SessionCookie> {
        self.cookies
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConsentButton {
    pub(crate) form: Option<ConsentForm>,
}

/// What a click on the consent button submits.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConsentForm {
    pub(crate) action: Url,
    pub(crate) method: Method,
    pub(crate) fields: Vec<(String, String)>,
}

fn selector(css: &str) -> Result<Selector, FeedError> {
    Selector::parse(css).map_err(|e| FeedError::Session(format!("invalid selector {css:?}: {e:?}")))
}

/// Locates the consent button and works out the submission its click would trigger.
pub(crate) fn find_consent_button(
    html: &str,
    page_url: &Url,
    button_css: &str,
) -> Result<ConsentButton, FeedError> {
    let button_sel = selector(button_css)?;
    let doc = Html::parse_document(html);

    let Some(button) = doc.select(&button_sel).next() else {
        return Err(FeedError::Session(format!(
            "consent button {button_css:?} not found on {page_url}"
        )));
    };

    let Some(form) = button
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "form")
    else {
        return Ok(ConsentButton { form: None });
    };

    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => Method::POST,
        _ => Method::GET,
    };
    let action = match form.value().attr("action").map(str::trim) {
        Some(a) if !a.is_empty() => page_url.join(a)?,
        _ => page_url.clone(),
    };

    let mut fields = Vec::new();
    for input in form.select(&selector("input[name]")?) {
        let el = input.value();
        let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
        if matches!(kind.as_str(), "submit" | "button" | "image" | "reset" | "file") {
            continue;
        }
        if matches!(kind.as_str(), "checkbox" | "radio") && el.attr("checked").is_none() {
            continue;
        }
        if let Some(name) = el.attr("name") {
            fields.push((name.to_string(), el.attr("value").unwrap_or_default().to_string()));
        }
    }
    if let Some(name) = button.value().attr("name") {
        let value = button.value().attr("value").unwrap_or(name);
        fields.push((name.to_string(), value.to_string()));
    }

    Ok(ConsentButton {
        form: Some(ConsentForm {
            action,
            method,
            fields,
        }),
    })
}
