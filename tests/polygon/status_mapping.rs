use httpmock::Method::GET;
use stockfeed::{ErrorKind, FeedError};

use crate::common::{self, API_KEY};

async fn listing_error(status: u16) -> FeedError {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/v3/reference/tickers");
        then.status(status).body("nope");
    });
    common::polygon(&server).all_tickers().await.unwrap_err()
}

#[tokio::test]
async fn http_statuses_map_to_transport_errors() {
    assert!(matches!(listing_error(404).await, FeedError::NotFound { .. }));
    assert!(matches!(listing_error(429).await, FeedError::RateLimited { .. }));
    assert!(matches!(
        listing_error(503).await,
        FeedError::ServerError { status: 503, .. }
    ));

    let err = listing_error(401).await;
    assert!(matches!(err, FeedError::Status { status: 401, .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn reported_url_does_not_leak_the_key() {
    let err = listing_error(500).await;
    let shown = err.to_string();
    assert!(shown.contains("/v3/reference/tickers"), "{shown}");
    assert!(!shown.contains(API_KEY), "{shown}");
}

#[tokio::test]
async fn non_json_body_is_a_protocol_error() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/v3/reference/tickers");
        then.status(200).body("<html>maintenance</html>");
    });

    let err = common::polygon(&server).all_tickers().await.unwrap_err();
    assert!(matches!(err, FeedError::Json(_)));
    assert_eq!(err.kind(), ErrorKind::Protocol);
}
