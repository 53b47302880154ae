use httpmock::Method::GET;
use stockfeed::FeedError;

use crate::common::{self, CRUMB};

const PATH: &str = "/v7/finance/quote";

#[tokio::test]
async fn quotes_for_several_symbols_in_one_request() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("symbols", "AAPL,MSFT")
            .query_param("crumb", CRUMB);
        then.status(200).body(
            r#"{"quoteResponse":{"result":[
                {"symbol":"AAPL","shortName":"Apple Inc.","regularMarketPrice":189.5,
                 "regularMarketPreviousClose":188.0,"currency":"USD","exchange":"NMS",
                 "fullExchangeName":"NasdaqGS","marketState":"REGULAR"},
                {"symbol":"MSFT","shortName":"Microsoft Corporation","regularMarketPrice":402.1,
                 "currency":"USD","exchange":"NMS","marketState":"CLOSED"}
            ],"error":null}}"#,
        );
    });

    let quotes = common::yahoo(&server)
        .quotes(&["AAPL", "MSFT"])
        .await
        .unwrap();

    mock.assert();
    assert_eq!(quotes.len(), 2);
    assert_eq!(quotes[0].regular_market_previous_close, Some(188.0));
    assert_eq!(quotes[1].symbol, "MSFT");
    assert_eq!(quotes[1].regular_market_previous_close, None);
    assert_eq!(quotes[1].market_state.as_deref(), Some("CLOSED"));
}

#[tokio::test]
async fn error_object_fails_the_call() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).body(
            r#"{"quoteResponse":{"result":null,"error":{"code":"argument-error","description":"Invalid Crumb"}}}"#,
        );
    });

    let err = common::yahoo(&server).quotes(&["AAPL"]).await.unwrap_err();
    match err {
        FeedError::Provider { message, .. } => assert_eq!(message, "Invalid Crumb"),
        other => panic!("expected Provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn no_symbols_no_request() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).body(r#"{"quoteResponse":{"result":[]}}"#);
    });

    let quotes = common::yahoo(&server).quotes(&[]).await.unwrap();
    assert!(quotes.is_empty());
    mock.assert_hits(0);
}
