use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};

use super::{
    checkout::{accepting_gateway, mpesa_checkout, CHECKOUT_REQUEST_ID},
    helpers::{bearer, seed_marketplace, send, test_config, valid_token, Marketplace, CALLBACK_SECRET},
    mocks::{idle_gateway, MockGateway},
};
use crate::config::ServerConfig;

const ACK: &str = r#"{"ResultCode":0,"ResultDesc":"Success"}"#;

fn success_callback() -> Value {
    json!({"Body": {"stkCallback": {
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": CHECKOUT_REQUEST_ID,
        "ResultCode": 0,
        "ResultDesc": "The service request is processed successfully.",
        "CallbackMetadata": {"Item": [
            {"Name": "Amount", "Value": 4030.00},
            {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
            {"Name": "TransactionDate", "Value": 20231215143022u64},
            {"Name": "PhoneNumber", "Value": 254712345678u64}
        ]}
    }}})
}

fn cancelled_callback() -> Value {
    json!({"Body": {"stkCallback": {
        "MerchantRequestID": "29115-34620561-1",
        "CheckoutRequestID": CHECKOUT_REQUEST_ID,
        "ResultCode": 1032,
        "ResultDesc": "Request cancelled by user"
    }}})
}

/// Checks out one panel with M-PESA and returns the order id.
async fn pending_order(market: &Marketplace) -> i64 {
    market.fill_cart(1).await;
    let token = valid_token(&market.customer);
    let req = TestRequest::post().uri("/api/customer/checkout").insert_header(bearer(&token)).set_json(mpesa_checkout());
    let (status, body) = send(req, &test_config(), &market.db, accepting_gateway()).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    body["order"]["id"].as_i64().unwrap()
}

async fn deliver(market: &Marketplace, config: &ServerConfig, req: TestRequest) {
    let (status, body) = send(req, config, &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACK);
}

async fn customer_order(market: &Marketplace, order_id: i64) -> Value {
    let token = valid_token(&market.customer);
    let uri = format!("/api/customer/orders/{order_id}");
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let detail: Value = serde_json::from_str(&body).unwrap();
    detail["order"].clone()
}

fn callback_uri(token: &str) -> String {
    format!("/api/mpesa/callback?token={token}")
}

#[actix_web::test]
async fn successful_payment_completes_the_order() {
    let market = seed_marketplace().await;
    let order_id = pending_order(&market).await;
    let req = TestRequest::post().uri(&callback_uri(CALLBACK_SECRET)).set_json(success_callback());
    deliver(&market, &test_config(), req).await;

    let order = customer_order(&market, order_id).await;
    assert_eq!(order["payment_status"], "completed");
    assert_eq!(order["order_status"], "processing");
    assert_eq!(order["mpesa_receipt_number"], "NLJ7RT61SV");

    // A redelivery is acknowledged and recorded as a duplicate
    let req = TestRequest::post().uri(&callback_uri(CALLBACK_SECRET)).set_json(success_callback());
    deliver(&market, &test_config(), req).await;

    let token = valid_token(&market.admin);
    let uri = format!("/api/admin/orders/{order_id}");
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let detail: Value = serde_json::from_str(&body).unwrap();
    let outcomes = detail["callbacks"].as_array().unwrap().iter().map(|c| c["outcome"].clone()).collect::<Vec<_>>();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.contains(&json!("applied")));
    assert!(outcomes.contains(&json!("duplicate")));
}

#[actix_web::test]
async fn cancelled_payment_fails_the_order() {
    let market = seed_marketplace().await;
    let order_id = pending_order(&market).await;
    let req = TestRequest::post().uri(&callback_uri(CALLBACK_SECRET)).set_json(cancelled_callback());
    deliver(&market, &test_config(), req).await;

    let order = customer_order(&market, order_id).await;
    assert_eq!(order["payment_status"], "failed");
    assert_eq!(order["order_status"], "cancelled");
    assert_eq!(order["payment_failure_reason"], "Request cancelled by user");
}

#[actix_web::test]
async fn wrong_token_is_acknowledged_but_ignored() {
    let market = seed_marketplace().await;
    let order_id = pending_order(&market).await;
    let req = TestRequest::post().uri(&callback_uri("guessed")).set_json(success_callback());
    deliver(&market, &test_config(), req).await;
    let req = TestRequest::post().uri("/api/mpesa/callback").set_json(success_callback());
    deliver(&market, &test_config(), req).await;

    let order = customer_order(&market, order_id).await;
    assert_eq!(order["payment_status"], "pending");
}

#[actix_web::test]
async fn garbage_is_acknowledged() {
    let market = seed_marketplace().await;
    let order_id = pending_order(&market).await;
    let req = TestRequest::post()
        .uri(&callback_uri(CALLBACK_SECRET))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json at all");
    deliver(&market, &test_config(), req).await;

    let order = customer_order(&market, order_id).await;
    assert_eq!(order["payment_status"], "pending");
}

#[actix_web::test]
async fn oversized_body_is_acknowledged() {
    let market = seed_marketplace().await;
    let order_id = pending_order(&market).await;
    let mut callback = success_callback();
    callback["Body"]["stkCallback"]["ResultDesc"] = json!("x".repeat(300 * 1024));
    let req = TestRequest::post().uri(&callback_uri(CALLBACK_SECRET)).set_json(callback);
    deliver(&market, &test_config(), req).await;

    let order = customer_order(&market, order_id).await;
    assert_eq!(order["payment_status"], "pending");
}

#[actix_web::test]
async fn unknown_checkout_request_is_acknowledged() {
    let market = seed_marketplace().await;
    let mut callback = success_callback();
    callback["Body"]["stkCallback"]["CheckoutRequestID"] = json!("ws_CO_00000000000000000000");
    let req = TestRequest::post().uri(&callback_uri(CALLBACK_SECRET)).set_json(callback);
    deliver(&market, &test_config(), req).await;
}

#[actix_web::test]
async fn callbacks_from_outside_the_whitelist_are_ignored() {
    let market = seed_marketplace().await;
    let order_id = pending_order(&market).await;
    let mut config = test_config();
    config.callback.whitelist = Some(vec!["196.201.214.200".parse().unwrap()]);

    let req = TestRequest::post()
        .uri(&callback_uri(CALLBACK_SECRET))
        .peer_addr("10.1.1.1:40000".parse().unwrap())
        .set_json(success_callback());
    deliver(&market, &config, req).await;
    let order = customer_order(&market, order_id).await;
    assert_eq!(order["payment_status"], "pending");

    let req = TestRequest::post()
        .uri(&callback_uri(CALLBACK_SECRET))
        .peer_addr("196.201.214.200:40000".parse().unwrap())
        .set_json(success_callback());
    deliver(&market, &config, req).await;
    let order = customer_order(&market, order_id).await;
    assert_eq!(order["payment_status"], "completed");
}

#[actix_web::test]
async fn payment_status_queries_are_scoped_to_the_owner() {
    let market = seed_marketplace().await;
    pending_order(&market).await;
    let uri = format!("/api/mpesa/query/{CHECKOUT_REQUEST_ID}");

    let token = valid_token(&market.other_customer);
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut gateway = MockGateway::new();
    gateway
        .expect_query_status()
        .withf(|id| id.to_string() == CHECKOUT_REQUEST_ID)
        .times(1)
        .returning(|_| Ok(json!({"ResultCode": "0", "ResultDesc": "The service request is processed successfully."})));
    let token = valid_token(&market.customer);
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, gateway).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["ResultCode"], "0");
}
