use chrono::{NaiveDate, TimeZone, Utc};
use httpmock::Method::GET;
use serde_json::{Value, json};
use stockfeed::{DuplicatePolicy, FeedError};

use crate::common::{self, API_KEY, page};

const PATH: &str = "/v2/reference/news";

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn article(id: &str, published: &str) -> Value {
    json!({
        "id": id,
        "publisher": { "name": "Benzinga", "homepage_url": "https://www.benzinga.com/" },
        "title": format!("headline {id}"),
        "author": "Newsdesk",
        "published_utc": published,
        "article_url": format!("https://news.test/{id}"),
        "tickers": ["AAPL", "MSFT"],
        "image_url": "https://news.test/img.png",
        "description": "something happened",
    })
}

fn mock_two_pages(server: &httpmock::MockServer) -> (httpmock::Mock<'_>, httpmock::Mock<'_>) {
    let next = format!("{}{PATH}?cursor=n2", server.base_url());
    let first = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("ticker", "AAPL")
            .query_param("published_utc.gte", "2024-01-01")
            .query_param("published_utc.lte", "2024-01-31")
            .query_param("sort", "published_utc")
            .query_param("limit", "1000")
            .query_param("apiKey", API_KEY);
        then.status(200).body(page(
            vec![
                article("a1", "2024-01-02T13:30:00Z"),
                article("a2", "2024-01-05T08:00:00Z"),
            ],
            Some(next),
        ));
    });
    let second = server.mock(|when, then| {
        when.method(GET)
            .path(PATH)
            .query_param("cursor", "n2")
            .query_param("apiKey", API_KEY);
        then.status(200).body(page(
            vec![
                article("a2", "2024-01-05T08:00:00Z"),
                article("a3", "2024-01-20T21:15:00Z"),
            ],
            None,
        ));
    });
    (first, second)
}

#[tokio::test]
async fn news_keeps_cursor_order_and_duplicates_by_default() {
    let server = common::setup_server();
    let (first, second) = mock_two_pages(&server);

    let articles = common::polygon(&server)
        .news("AAPL", day(2024, 1, 1), day(2024, 1, 31))
        .fetch()
        .await
        .unwrap();

    first.assert_hits(1);
    second.assert_hits(1);

    let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "a2", "a3"]);

    let a1 = &articles[0];
    assert_eq!(a1.publisher.as_deref(), Some("Benzinga"));
    assert_eq!(a1.tickers, vec!["AAPL", "MSFT"]);
    assert_eq!(
        a1.published_utc,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 13, 30, 0).unwrap())
    );
}

#[tokio::test]
async fn news_can_drop_repeated_ids() {
    let server = common::setup_server();
    mock_two_pages(&server);

    let articles = common::polygon(&server)
        .news("AAPL", day(2024, 1, 1), day(2024, 1, 31))
        .duplicates(DuplicatePolicy::DropById)
        .fetch()
        .await
        .unwrap();

    let ids: Vec<_> = articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "a3"]);
}

#[tokio::test]
async fn reversed_date_range_sends_nothing() {
    let server = common::setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).body(page(vec![], None));
    });

    let err = common::polygon(&server)
        .news("AAPL", day(2024, 2, 1), day(2024, 1, 1))
        .fetch()
        .await
        .unwrap_err();

    assert!(matches!(err, FeedError::InvalidDates));
    assert_eq!(err.kind(), stockfeed::ErrorKind::Config);
    mock.assert_hits(0);
}

#[tokio::test]
async fn sparse_records_default_to_empty_fields() {
    let server = common::setup_server();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).body(page(
            vec![json!({ "id": "bare", "title": "only a title", "published_utc": "not a date" })],
            None,
        ));
    });

    let articles = common::polygon(&server)
        .news("AAPL", day(2024, 1, 1), day(2024, 1, 1))
        .fetch()
        .await
        .unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].author, "");
    assert!(articles[0].tickers.is_empty());
    assert_eq!(articles[0].published_utc, None);
    assert_eq!(articles[0].publisher, None);
}
