use httpmock::Method::GET;
use stockfeed::{AssetClass, PolygonClient};

use crate::common::{self, API_KEY};

const PATH: &str = "/v3/reference/tickers/types";

#[tokio::test]
async fn ticker_types_for_an_asset_class() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("asset_class", "stocks")
            .query_param("apiKey", API_KEY);
        then.status(200).body(
            r#"{"status":"OK","request_id":"t1","count":2,"results":[
                {"code":"CS","description":"Common Stock","asset_class":"stocks","locale":"us"},
                {"code":"ETF","description":"Exchange Traded Fund","asset_class":"stocks","locale":"us"}
            ]}"#,
        );
    });

    let types = common::polygon(&server)
        .ticker_types(AssetClass::Stocks)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].code, "CS");
    assert_eq!(types[1].to_string(), "ETF: Exchange Traded Fund | stocks | us");
}

#[tokio::test]
async fn unsuccessful_envelope_yields_no_types() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("asset_class", "fx");
        then.status(200)
            .body(r#"{"status":"NOT_AUTHORIZED","request_id":"t2","message":"upgrade your plan"}"#);
    });
    server.mock(|when, then| {
        when.method(GET).path(PATH).query_param("asset_class", "crypto");
        then.status(200).body(r#"{"status":"OK","request_id":"t3"}"#);
    });

    let client = common::polygon(&server);
    assert!(client.ticker_types(AssetClass::Fx).await.unwrap().is_empty());
    assert!(client.ticker_types(AssetClass::Crypto).await.unwrap().is_empty());
}

#[tokio::test]
async fn base_url_with_a_path_prefix() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/polygon{PATH}"))
            .query_param("asset_class", "crypto");
        then.status(200)
            .body(r#"{"status":"OK","count":1,"results":[{"code":"CRYPTO","description":"Digital asset"}]}"#);
    });

    let client = PolygonClient::builder()
        .base_url(common::url(&server, "/polygon"))
        .api_key(API_KEY)
        .build()
        .unwrap();
    let types = client.ticker_types(AssetClass::Crypto).await.unwrap();

    mock.assert();
    assert_eq!(types[0].code, "CRYPTO");
}
