//! Integration tests for `FacebookAdsClient` using wiremock HTTP mocks.

use bizniweb_ads::{AdsError, AdsHttpSettings, FacebookAdsClient};
use bizniweb_core::{DateRange, FacebookConfig};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, max_retries: u32) -> FacebookAdsClient {
    FacebookAdsClient::with_base_url(
        FacebookConfig {
            access_token: "fb-token".to_owned(),
            ad_account_id: "act_42".to_owned(),
            api_version: "v21.0".to_owned(),
        },
        AdsHttpSettings {
            timeout_secs: 5,
            user_agent: "bizniweb-test/0.1".to_owned(),
            max_retries,
            backoff_secs: 0,
        },
        base_url,
    )
    .expect("client construction should not fail")
}

fn may_first_week() -> DateRange {
    DateRange::new("2024-05-01".parse().unwrap(), "2024-05-07".parse().unwrap()).unwrap()
}

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[tokio::test]
async fn daily_spend_follows_paging_next() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/insights"))
        .and(query_param("after", "CURSOR2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"date_start": "2024-05-03", "date_stop": "2024-05-03", "spend": "7.10",
                      "impressions": "300", "clicks": "4"}],
            "paging": {"cursors": {"before": "x", "after": "y"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/insights"))
        .and(query_param("access_token", "fb-token"))
        .and(query_param("time_increment", "1"))
        .and(query_param("level", "account"))
        .and(query_param("time_range", r#"{"since":"2024-05-01","until":"2024-05-07"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"date_start": "2024-05-01", "date_stop": "2024-05-01", "spend": "12.50",
                 "impressions": "1000", "clicks": "20", "cpc": "0.625", "cpm": "12.5", "ctr": "2"},
                {"date_start": "2024-05-02", "date_stop": "2024-05-02", "spend": "0.40"}
            ],
            "paging": {"next": format!("{}/v21.0/act_42/insights?access_token=fb-token&after=CURSOR2", server.uri())}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let spend = client.daily_spend(may_first_week()).await.unwrap();

    assert_eq!(spend.len(), 3);
    assert_eq!(spend[&day("2024-05-01")], dec("12.50"));
    assert_eq!(spend[&day("2024-05-03")], dec("7.10"));
}

#[tokio::test]
async fn daily_insights_keeps_metrics() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"date_start": "2024-05-01", "spend": "12.50", "impressions": "1000",
                      "clicks": "20", "cpc": "0.625", "cpm": "12.5", "ctr": "2"}]
        })))
        .mount(&server)
        .await;

    let insights = test_client(&server.uri(), 0)
        .daily_insights(may_first_week())
        .await
        .unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].impressions, 1000);
    assert_eq!(insights[0].clicks, 20);
    assert_eq!(insights[0].cpc, Some(dec("0.625")));
}

#[tokio::test]
async fn expired_token_is_auth_error_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Error validating access token: Session has expired",
                      "type": "OAuthException", "code": 190}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server.uri(), 3).daily_spend(may_first_week()).await;
    assert!(matches!(result, Err(AdsError::Auth { .. })), "got: {result:?}");
}

#[tokio::test]
async fn server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let spend = test_client(&server.uri(), 2)
        .daily_spend(may_first_week())
        .await
        .unwrap();
    assert!(spend.is_empty());
}

#[tokio::test]
async fn campaign_spend_queries_each_campaign() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "111", "name": "Spring sale", "status": "ACTIVE"},
                {"id": "222", "name": "Dormant", "status": "PAUSED"},
                {"id": "333", "name": "Broken", "status": "ACTIVE"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v21.0/111/insights"))
        .and(query_param("level", "campaign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"date_start": "2024-05-01", "spend": "55.00", "impressions": "9000",
                      "clicks": "120", "reach": "4000"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v21.0/222/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v21.0/333/insights"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Unsupported get request", "type": "GraphMethodException", "code": 100}
        })))
        .mount(&server)
        .await;

    let campaigns = test_client(&server.uri(), 0)
        .campaign_spend(may_first_week())
        .await
        .unwrap();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].campaign_name, "Spring sale");
    assert_eq!(campaigns[0].spend, dec("55.00"));
    assert_eq!(campaigns[0].reach, Some(4000));
}

#[tokio::test]
async fn account_info_reads_name_and_currency() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v21.0/act_42"))
        .and(query_param("fields", "id,name,currency,account_status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "act_42", "name": "Vevo Shop", "currency": "EUR", "account_status": 1
        })))
        .mount(&server)
        .await;

    let info = test_client(&server.uri(), 0).account_info().await.unwrap();
    assert_eq!(info.name, "Vevo Shop");
    assert_eq!(info.currency.as_deref(), Some("EUR"));
    assert_eq!(info.status.as_deref(), Some("ACTIVE"));
}

#[tokio::test]
async fn unparseable_paging_next_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v21.0/act_42/insights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"date_start": "2024-05-01", "date_stop": "2024-05-01", "spend": "12.50"}],
            "paging": {"next": "not a url"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let err = client.daily_spend(may_first_week()).await.unwrap_err();
    assert!(
        matches!(err, AdsError::Api { ref message, .. } if message.contains("paging.next")),
        "expected Api error, got: {err:?}"
    );
}
