use actix_web::{App, test, web};
use serde_json::json;

use coindeck::config::{AppConfig, BinanceConfig};
use coindeck::server::{AppState, routes};

mod test_utils {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn config_with_credentials(base_url: &str) -> AppConfig {
        AppConfig {
            port: 0,
            binance: Some(BinanceConfig {
                api_key: "test-key".to_string(),
                api_secret: "s3cr3t".to_string(),
            }),
            binance_base_url: base_url.to_string(),
        }
    }

    pub fn config_without_credentials() -> AppConfig {
        AppConfig {
            port: 0,
            binance: None,
            binance_base_url: "http://127.0.0.1:9".to_string(),
        }
    }

    pub async fn mock_json(server: &MockServer, endpoint: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(server)
            .await;
    }
}

#[actix_web::test]
async fn test_health_is_always_ok() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_without_credentials(),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Backend is running");
}

#[actix_web::test]
async fn test_balance_without_credentials_is_500() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_without_credentials(),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/balance").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 500);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": "Binance API credentials not configured",
        })
    );
}

#[actix_web::test]
async fn test_balance_aggregates_upstream_data() {
    let upstream = wiremock::MockServer::start().await;
    test_utils::mock_json(
        &upstream,
        "/api/v3/account",
        json!({"balances": [
            {"asset": "BTC", "free": "0.5", "locked": "0.0"},
            {"asset": "USDT", "free": "100.0", "locked": "0.0"},
            {"asset": "ETH", "free": "0.0", "locked": "0.0"}
        ]}),
    )
    .await;
    test_utils::mock_json(
        &upstream,
        "/api/v3/ticker/price",
        json!({"symbol": "BTCUSDT", "price": "30000.00"}),
    )
    .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_with_credentials(&upstream.uri()),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/balance").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalBalance"], "15100.00");
    assert_eq!(body["balances"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_balance_surfaces_upstream_error_as_400() {
    let upstream = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/api/v3/account"))
        .respond_with(wiremock::ResponseTemplate::new(401).set_body_string(
            r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#,
        ))
        .mount(&upstream)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_with_credentials(&upstream.uri()),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/balance").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        "Invalid API-key, IP, or permissions for action."
    );
}

#[actix_web::test]
async fn test_transactions_with_empty_history() {
    let upstream = wiremock::MockServer::start().await;
    test_utils::mock_json(&upstream, "/sapi/v1/capital/deposit/hisrec", json!([])).await;
    test_utils::mock_json(&upstream, "/sapi/v1/capital/withdraw/history", json!([])).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_with_credentials(&upstream.uri()),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/transactions").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["transactions"], json!([]));
    assert_eq!(body["truncated"], false);
}

#[actix_web::test]
async fn test_deposits_today_shape() {
    let upstream = wiremock::MockServer::start().await;
    let now = chrono::Utc::now().timestamp_millis();
    test_utils::mock_json(
        &upstream,
        "/sapi/v1/capital/deposit/hisrec",
        json!([{
            "id": "dep-1",
            "amount": "250.0",
            "coin": "USDT",
            "network": "BSC",
            "status": 1,
            "insertTime": now - 60_000,
            "txId": "0xabc"
        }]),
    )
    .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_with_credentials(&upstream.uri()),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/deposits/today")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalToday"], "250.00");
    assert_eq!(body["count"], 1);
    assert_eq!(body["deposits"][0]["type"], "incoming");
    assert_eq!(body["deposits"][0]["status"], "confirmed");
}

#[actix_web::test]
async fn test_earn_yield_sums_rewards() {
    let upstream = wiremock::MockServer::start().await;
    let now = chrono::Utc::now().timestamp_millis();
    test_utils::mock_json(
        &upstream,
        "/sapi/v1/simple-earn/flexible/history/rewardsRecord",
        json!({"rows": [
            {"rewards": "0.40", "asset": "USDT", "time": now - 86_400_000, "projectId": "USDT001"},
            {"rewards": "0.35", "asset": "USDT", "time": now - 43_200_000, "projectId": "USDT001"}
        ], "total": 2}),
    )
    .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_with_credentials(&upstream.uri()),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/earn/yield").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalYield"], "0.75");
}

#[actix_web::test]
async fn test_earn_history_combines_ledgers() {
    let upstream = wiremock::MockServer::start().await;
    let now = chrono::Utc::now().timestamp_millis();
    test_utils::mock_json(
        &upstream,
        "/sapi/v1/simple-earn/flexible/history/subscriptionRecord",
        json!({"rows": [
            {"amount": "100.0", "asset": "USDT", "time": now - 200_000, "purchaseId": 26055}
        ], "total": 1}),
    )
    .await;
    test_utils::mock_json(
        &upstream,
        "/sapi/v1/simple-earn/flexible/history/redemptionRecord",
        json!({"rows": [
            {"amount": "50.0", "asset": "USDT", "time": now - 50_000, "projectId": "USDT001", "redeemId": 40607}
        ], "total": 1}),
    )
    .await;
    test_utils::mock_json(
        &upstream,
        "/sapi/v1/simple-earn/flexible/history/rewardsRecord",
        json!({"rows": [
            {"rewards": "0.25", "asset": "USDT", "time": now - 100_000, "projectId": "USDT001"}
        ], "total": 1}),
    )
    .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState {
                config: test_utils::config_with_credentials(&upstream.uri()),
            }))
            .configure(routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/earn/history").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["subscriptions"].as_array().unwrap().len(), 1);
    assert_eq!(body["redemptions"].as_array().unwrap().len(), 1);
    assert_eq!(body["interests"].as_array().unwrap().len(), 1);

    // newest first: redemption, interest, subscription
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["type"], "redemption");
    assert_eq!(history[1]["type"], "interest");
    assert_eq!(history[2]["type"], "subscription");

    // the redemption carries the interest accrued before it
    assert_eq!(body["redemptions"][0]["yieldAmount"], 0.25);
    assert_eq!(body["redemptions"][0]["yieldInUSD"], 0.25);
}
