use std::sync::Arc;
use std::time::{Duration, Instant};

use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};
use stockfeed::{BrowserBootstrap, FeedError, SessionBootstrap, YahooClient};

use crate::common::{self, CRUMB, search_body, url};

const CONSENT_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Before you continue</title></head>
<body>
  <form method="post" action="/consent/collect?sessionId=s-1" class="consent-form">
    <input type="hidden" name="csrfToken" value="tok-42">
    <input type="hidden" name="sessionId" value="s-1">
    <button type="submit" name="reject" value="reject">Reject all</button>
    <button type="submit" name="agree" value="agree">Accept all</button>
  </form>
</body></html>"#;

struct ConsentMocks<'a> {
    page: Mock<'a>,
    submit: Mock<'a>,
    landing: Mock<'a>,
    crumb: Mock<'a>,
}

fn mock_consent_walk(server: &MockServer) -> ConsentMocks<'_> {
    let page = server.mock(|when, then| {
        when.method(GET).path("/quote/AAPL");
        then.status(200)
            .header("content-type", "text/html")
            .header("set-cookie", "GUCS=abc; Path=/")
            .body(CONSENT_PAGE);
    });
    let submit = server.mock(|when, then| {
        when.method(POST)
            .path("/consent/collect")
            .query_param("sessionId", "s-1")
            .body_includes("csrfToken=tok-42")
            .body_includes("agree=agree");
        then.status(302)
            .header("location", "/consent/done")
            .header("set-cookie", "A1=xyz; Max-Age=3600; Path=/");
    });
    let landing = server.mock(|when, then| {
        when.method(GET).path("/consent/done");
        then.status(200)
            .header("set-cookie", "A3=last; Path=/")
            .body("<html>welcome</html>");
    });
    let crumb = server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body(format!("{CRUMB}\n"));
    });
    ConsentMocks {
        page,
        submit,
        landing,
        crumb,
    }
}

fn bootstrap(server: &MockServer) -> BrowserBootstrap {
    BrowserBootstrap::with_urls(url(server, "/quote/AAPL"), url(server, "/v1/test/getcrumb")).unwrap()
}

#[tokio::test]
async fn consent_walk_collects_cookies_and_crumb() {
    let server = common::setup_server();
    let mocks = mock_consent_walk(&server);

    let session = bootstrap(&server).bootstrap().await.unwrap();

    mocks.page.assert();
    mocks.submit.assert();
    mocks.landing.assert();
    mocks.crumb.assert();

    assert!(session.is_instantiated());
    assert_eq!(session.crumb(), Some(CRUMB));

    let names: Vec<_> = session.cookies().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["GUCS", "A1", "A3"]);
    for c in session.cookies() {
        assert_eq!(c.path, "/");
        assert_eq!(c.domain, server.host());
    }
    let a1 = &session.cookies()[1];
    assert_eq!(a1.value, "xyz");
    assert!(a1.expires.is_some());
    assert!(session.cookies()[0].expires.is_none());
}

#[tokio::test]
async fn client_replays_what_the_walk_collected() {
    let server = common::setup_server();
    let mocks = mock_consent_walk(&server);
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/finance/search")
            .query_param("crumb", CRUMB)
            .header("cookie", "GUCS=abc; A1=xyz; A3=last");
        then.status(200).body(search_body(&["AAPL"]));
    });

    let client = YahooClient::builder()
        .search_base(url(&server, "/v1/finance/search"))
        .consent_url(url(&server, "/quote/AAPL"))
        .crumb_url(url(&server, "/v1/test/getcrumb"))
        .build()
        .unwrap();

    client.search("apple").fetch().await.unwrap();
    client.search("apple inc").fetch().await.unwrap();

    search.assert_hits(2);
    mocks.page.assert_hits(1);
    mocks.crumb.assert_hits(1);
}

#[tokio::test]
async fn page_without_consent_button_fails_the_walk() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/quote/AAPL");
        then.status(200).body("<html><body>Apple Inc. (AAPL)</body></html>");
    });
    let crumb = server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body(CRUMB);
    });

    let err = bootstrap(&server).bootstrap().await.unwrap_err();

    assert!(matches!(err, FeedError::Session(ref m) if m.contains("not found")), "{err:?}");
    crumb.assert_hits(0);
}

#[tokio::test]
async fn html_instead_of_crumb_is_rejected() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/quote/AAPL");
        then.status(200)
            .body(r#"<form method="get" action="/ok"><button name="agree">OK</button></form>"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/ok").query_param("agree", "agree");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/test/getcrumb");
        then.status(200).body("<html>Too Many Requests</html>");
    });

    let err = bootstrap(&server).bootstrap().await.unwrap_err();
    assert!(matches!(err, FeedError::Session(_)), "{err:?}");
}

#[tokio::test]
async fn failed_walk_leaves_client_usable_without_crumb() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/quote/AAPL");
        then.status(500);
    });
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/finance/search")
            .query_param_missing("crumb");
        then.status(200).body(search_body(&["AAPL"]));
    });

    let client = YahooClient::builder()
        .search_base(url(&server, "/v1/finance/search"))
        .session_bootstrap(Arc::new(bootstrap(&server)))
        .build()
        .unwrap();

    let hits = client.search("apple").fetch().await.unwrap();
    assert_eq!(hits.len(), 1);
    search.assert();
    assert!(!client.session().is_instantiated().await);
}

#[tokio::test]
async fn slow_consent_page_is_cut_off_by_the_client_timeout() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/quote/AAPL");
        then.status(200)
            .delay(Duration::from_secs(4))
            .body(CONSENT_PAGE);
    });
    let search = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/finance/search")
            .query_param_missing("crumb");
        then.status(200).body(search_body(&["AAPL"]));
    });

    let client = YahooClient::builder()
        .search_base(url(&server, "/v1/finance/search"))
        .consent_url(url(&server, "/quote/AAPL"))
        .crumb_url(url(&server, "/v1/test/getcrumb"))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let started = Instant::now();
    let hits = client.search("apple").fetch().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    assert_eq!(hits.len(), 1);
    search.assert();
    assert!(!client.session().is_instantiated().await);
}
