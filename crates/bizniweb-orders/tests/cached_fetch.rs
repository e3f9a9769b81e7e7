//! Integration tests for `fetch_orders_cached` against a mock API and a
//! temporary cache directory.

use bizniweb_core::DateRange;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bizniweb_orders::{fetch_orders_cached, OrderCache, OrderClient, OrderClientSettings};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn client(server: &MockServer) -> OrderClient {
    OrderClient::new(
        OrderClientSettings {
            api_url: server.uri(),
            user_agent: "bizniweb-test/0.1".to_owned(),
            timeout_secs: 5,
            page_size: 30,
            max_retries: 0,
            backoff_secs: 0,
            inter_request_delay_ms: 0,
            server_date_filter: true,
        },
        "secret-token",
    )
    .unwrap()
}

fn single_page(orders: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": {"getOrderList": {"data": orders, "pageInfo": {"hasNextPage": false}}}
    }))
}

#[tokio::test]
async fn second_run_is_served_from_cache() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = OrderCache::new(dir.path(), 3);
    let range = DateRange::new(d("2024-05-01"), d("2024-05-03")).unwrap();
    let today = d("2024-06-30");

    Mock::given(method("POST"))
        .respond_with(single_page(json!([
            {"id": 2, "pur_date": "2024-05-03 08:00:00"},
            {"id": 1, "pur_date": "2024-05-01 18:00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let first = fetch_orders_cached(&client, &cache, range, today, true).await.unwrap();
    let ids: Vec<_> = first.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["1", "2"]);

    // Empty 2024-05-02 was cached too, so no further request is made.
    assert_eq!(cache.load_day(d("2024-05-02")), Some(Vec::new()));
    let second = fetch_orders_cached(&client, &cache, range, today, true).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn only_missed_span_is_fetched_and_fresh_days_are_not_cached() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = OrderCache::new(dir.path(), 3);
    let today = d("2024-05-10");

    let cached_order: bizniweb_orders::Order =
        serde_json::from_value(json!({"id": "c1", "pur_date": "2024-05-05 12:00:00"})).unwrap();
    cache.store_day(d("2024-05-05"), &[cached_order]).unwrap();

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "variables": {"filter": {"pur_date_from": "2024-05-06", "pur_date_to": "2024-05-10"}}
        })))
        .respond_with(single_page(json!([
            {"id": "n1", "pur_date": "2024-05-06 09:00:00"},
            {"id": "n2", "pur_date": "2024-05-09 09:00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let range = DateRange::new(d("2024-05-05"), d("2024-05-10")).unwrap();
    let orders = fetch_orders_cached(&client(&server), &cache, range, today, true)
        .await
        .unwrap();
    let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["c1", "n1", "n2"]);

    assert!(cache.path_for(d("2024-05-06")).exists());
    assert!(!cache.path_for(d("2024-05-07")).exists());
    assert!(!cache.path_for(d("2024-05-09")).exists());
}

#[tokio::test]
async fn no_cache_refetches_but_refreshes_files() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let cache = OrderCache::new(dir.path(), 3);
    let day = d("2024-05-01");
    cache.store_day(day, &[]).unwrap();

    Mock::given(method("POST"))
        .respond_with(single_page(json!([{"id": 9, "pur_date": "2024-05-01 10:00:00"}])))
        .expect(1)
        .mount(&server)
        .await;

    let orders = fetch_orders_cached(
        &client(&server),
        &cache,
        DateRange::day(day),
        d("2024-06-01"),
        false,
    )
    .await
    .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(cache.load_day(day).map(|o| o.len()), Some(1));
}
