use super::*;
use serde_json::json;

fn envelope(value: serde_json::Value) -> GraphqlResponse<OrderListData> {
    serde_json::from_value(value).unwrap()
}

fn settings(api_url: &str) -> OrderClientSettings {
    OrderClientSettings {
        api_url: api_url.to_owned(),
        user_agent: "bizniweb-test/0.1".to_owned(),
        timeout_secs: 5,
        page_size: 30,
        max_retries: 0,
        backoff_secs: 0,
        inter_request_delay_ms: 0,
        server_date_filter: true,
    }
}

#[test]
fn into_page_skips_null_orders() {
    let page = into_page(envelope(json!({
        "data": {"getOrderList": {
            "data": [{"id": 1, "pur_date": "2024-05-01 10:00:00"}, null],
            "pageInfo": {"hasNextPage": false}
        }}
    })))
    .unwrap();
    assert_eq!(page.orders.len(), 1);
    assert_eq!(page.skipped, 1);
    assert!(!page.page_info.has_next_page);
}

#[test]
fn into_page_uses_partial_data_despite_errors() {
    let page = into_page(envelope(json!({
        "data": {"getOrderList": {"data": [{"id": "7", "pur_date": "2024-05-01"}], "pageInfo": null}},
        "errors": [{"message": "Cannot resolve field oss"}]
    })))
    .unwrap();
    assert_eq!(page.orders[0].id, "7");
    assert_eq!(page.page_info, PageInfo::default());
}

#[test]
fn into_page_without_data_surfaces_graphql_errors() {
    let err = into_page(envelope(json!({
        "data": null,
        "errors": [{"message": "Invalid token"}, {"message": "Access denied"}]
    })))
    .unwrap_err();
    assert_eq!(err.to_string(), "GraphQL error: Invalid token; Access denied");
}

#[test]
fn into_page_without_data_or_errors_is_missing_data() {
    let err = into_page(envelope(json!({"data": {"getOrderList": null}}))).unwrap_err();
    assert!(matches!(err, OrderApiError::MissingData));
}

#[test]
fn new_rejects_bad_url() {
    let result = OrderClient::new(settings("not a url"), "token");
    assert!(matches!(result, Err(OrderApiError::InvalidApiUrl { .. })));
}

#[test]
fn new_rejects_token_with_newline() {
    let result = OrderClient::new(settings("https://shop.example/api/graphql"), "abc\ndef");
    assert!(matches!(result, Err(OrderApiError::InvalidToken)));
}

#[test]
fn from_app_config_requires_token() {
    let config = bizniweb_core::AppConfig {
        api_url: "https://shop.example/api/graphql".to_owned(),
        api_token: None,
        log_level: "info".to_owned(),
        data_dir: "./data".into(),
        cache_dir: "./data/cache".into(),
        costs_path: "./config/costs.yaml".into(),
        user_agent: "bizniweb-test/0.1".to_owned(),
        request_timeout_secs: 5,
        page_size: 30,
        max_retries: 0,
        retry_backoff_secs: 0,
        inter_request_delay_ms: 0,
        order_cache_fresh_days: 3,
        server_date_filter: true,
        ads_cache_fresh_days: 3,
        ads_cache_max_age_days: 30,
        facebook: None,
        google_ads: None,
    };
    assert!(matches!(
        OrderClient::from_app_config(&config),
        Err(OrderApiError::MissingToken)
    ));

    let config = bizniweb_core::AppConfig {
        api_token: Some("token".to_owned()),
        ..config
    };
    assert!(OrderClient::from_app_config(&config).is_ok());
}
