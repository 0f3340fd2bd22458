use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use slm_common::Money;
use solar_market_engine::traits::{GatewayError, PaymentInitiation};

use super::{
    helpers::{bearer, seed_marketplace, send, test_config, valid_token},
    mocks::{idle_gateway, MockGateway},
};

pub const CHECKOUT_REQUEST_ID: &str = "ws_CO_15122023143022123456";

/// A gateway that accepts exactly one STK push for KES 4,030.
pub fn accepting_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway
        .expect_initiate_payment()
        .withf(|req| req.amount == Money::from_units(4030) && req.phone == "0712345678")
        .times(1)
        .returning(|_| {
            Ok(PaymentInitiation {
                checkout_request_id: CHECKOUT_REQUEST_ID.to_string(),
                merchant_request_id: "29115-34620561-1".to_string(),
                customer_message: "Success. Request accepted for processing".to_string(),
            })
        });
    gateway.expect_query_status().never();
    gateway
}

pub fn mpesa_checkout() -> Value {
    json!({"payment_method": "mpesa", "shipping_address": "Kenyatta Avenue, Nairobi", "phone_number": "0712 345 678"})
}

#[actix_web::test]
async fn mpesa_checkout_sends_stk_push() {
    let market = seed_marketplace().await;
    market.fill_cart(1).await;
    let token = valid_token(&market.customer);
    let req = TestRequest::post().uri("/api/customer/checkout").insert_header(bearer(&token)).set_json(mpesa_checkout());
    let (status, body) = send(req, &test_config(), &market.db, accepting_gateway()).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "M-PESA payment initiated. Check your phone.");
    assert_eq!(body["mpesa"]["checkout_request_id"], CHECKOUT_REQUEST_ID);
    let order = &body["order"];
    assert_eq!(order["subtotal"].as_f64(), Some(3000.0));
    assert_eq!(order["shipping_fee"].as_f64(), Some(1000.0));
    assert_eq!(order["tax"].as_f64(), Some(30.0));
    assert_eq!(order["total_amount"].as_f64(), Some(4030.0));
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["mpesa_checkout_request_id"], CHECKOUT_REQUEST_ID);

    // The cart is emptied once the prompt has gone out
    let req = TestRequest::get().uri("/api/customer/cart").insert_header(bearer(&token));
    let (_, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    let cart: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(cart["item_count"], 0);
}

#[actix_web::test]
async fn gateway_failure_keeps_the_order_and_the_cart() {
    let market = seed_marketplace().await;
    market.fill_cart(1).await;
    let mut gateway = MockGateway::new();
    gateway.expect_initiate_payment().times(1).returning(|_| {
        Err(GatewayError::Rejected { code: "400.002.02".to_string(), description: "Invalid PhoneNumber".to_string() })
    });
    let token = valid_token(&market.customer);
    let req = TestRequest::post().uri("/api/customer/checkout").insert_header(bearer(&token)).set_json(mpesa_checkout());
    let (status, body) = send(req, &test_config(), &market.db, gateway).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Payment initiation failed");
    assert!(body["details"].as_str().unwrap().contains("Invalid PhoneNumber"));
    assert_eq!(body["order"]["payment_status"], "failed");
    assert_eq!(body["order"]["total_amount"].as_f64(), Some(4030.0));

    let req = TestRequest::get().uri("/api/customer/cart").insert_header(bearer(&token));
    let (_, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    let cart: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(cart["item_count"], 1);
}

#[actix_web::test]
async fn checkout_requires_a_phone_number() {
    let market = seed_marketplace().await;
    market.fill_cart(1).await;
    let token = valid_token(&market.customer);
    let req = TestRequest::post()
        .uri("/api/customer/checkout")
        .insert_header(bearer(&token))
        .set_json(json!({"payment_method": "mpesa", "shipping_address": "Kisumu"}));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Phone number is required"}"#);
}

#[actix_web::test]
async fn empty_cart_cannot_be_checked_out() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.customer);
    let req = TestRequest::post().uri("/api/customer/checkout").insert_header(bearer(&token)).set_json(mpesa_checkout());
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn cash_on_delivery_completes_immediately() {
    let market = seed_marketplace().await;
    market.fill_cart(2).await;
    let token = valid_token(&market.customer);
    let req = TestRequest::post().uri("/api/customer/checkout").insert_header(bearer(&token)).set_json(
        json!({"payment_method": "cash_on_delivery", "shipping_address": "Eldoret", "phone_number": "0722000111"}),
    );
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["message"], "Order placed successfully");
    assert!(body.get("mpesa").is_none());
    assert_eq!(body["order"]["payment_status"], "completed");
    assert_eq!(body["order"]["total_amount"].as_f64(), Some(7060.0));

    let req = TestRequest::get().uri("/api/customer/orders").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["total"], 1);
}
