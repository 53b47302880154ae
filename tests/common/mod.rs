#![allow(dead_code)]

use std::sync::Arc;

use httpmock::MockServer;
use serde_json::{Value, json};
use stockfeed::{PolygonClient, SessionCookie, StaticBootstrap, YahooClient};
use url::Url;

pub const API_KEY: &str = "test-key";
pub const CRUMB: &str = "crumb-value";

pub fn setup_server() -> MockServer {
    MockServer::start()
}

pub fn url(server: &MockServer, path: &str) -> Url {
    Url::parse(&server.url(path)).unwrap()
}

/// A client pointed at `server` with a limit high enough to never wait.
pub fn polygon(server: &MockServer) -> PolygonClient {
    PolygonClient::builder()
        .base_url(Url::parse(&server.base_url()).unwrap())
        .api_key(API_KEY)
        .max_calls_per_minute(1000)
        .build()
        .unwrap()
}

pub fn cookies() -> Vec<SessionCookie> {
    vec![
        SessionCookie::new("A1", "one", ".yahoo.com"),
        SessionCookie::new("GUC", "two", ".yahoo.com"),
    ]
}

/// A client pointed at `server` whose session comes from a fixed cookie pair and crumb.
pub fn yahoo(server: &MockServer) -> YahooClient {
    YahooClient::builder()
        .search_base(url(server, "/v1/finance/search"))
        .quote_base(url(server, "/v7/finance/quote"))
        .session_bootstrap(Arc::new(StaticBootstrap::new(cookies(), CRUMB)))
        .build()
        .unwrap()
}

pub fn ticker(symbol: &str, market: &str, kind: &str) -> Value {
    json!({
        "ticker": symbol,
        "name": format!("{symbol} Inc."),
        "market": market,
        "locale": "us",
        "primary_exchange": "XNAS",
        "type": kind,
        "active": true,
        "currency_name": "usd",
    })
}

/// An `OK` page with a consistent `count` and an optional absolute cursor.
pub fn page(results: Vec<Value>, next_url: Option<String>) -> String {
    let mut body = json!({
        "status": "OK",
        "request_id": "req-1",
        "count": results.len(),
        "results": results,
    });
    if let Some(next) = next_url {
        body["next_url"] = Value::String(next);
    }
    body.to_string()
}

pub fn search_body(symbols: &[&str]) -> String {
    let quotes: Vec<Value> = symbols
        .iter()
        .map(|s| {
            json!({
                "exchange": "NMS",
                "shortname": format!("{s} short"),
                "quoteType": "EQUITY",
                "symbol": s,
                "index": "quotes",
                "score": 20000.0,
                "typeDisp": "Equity",
                "longname": format!("{s} long"),
                "exchDisp": "NASDAQ",
                "isYahooFinance": true,
            })
        })
        .collect();
    json!({ "explains": [], "count": quotes.len(), "quotes": quotes, "news": [] }).to_string()
}
