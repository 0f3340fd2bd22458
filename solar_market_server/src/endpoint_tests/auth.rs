use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use serde_json::Value;
use solar_market_engine::db_types::Role;

use super::{
    helpers::{bearer, issue_token, seed_marketplace, send, test_config, valid_token},
    mocks::idle_gateway,
};

#[actix_web::test]
async fn missing_token_is_rejected() {
    let market = seed_marketplace().await;
    let req = TestRequest::get().uri("/api/customer/cart");
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Authentication Error"));
}

#[actix_web::test]
async fn malformed_header_is_rejected() {
    let market = seed_marketplace().await;
    let req = TestRequest::get().uri("/api/customer/cart").insert_header(("Authorization", "Token abc"));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn tampered_token_is_rejected() {
    let market = seed_marketplace().await;
    let mut token = valid_token(&market.customer);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let req = TestRequest::get().uri("/api/customer/cart").insert_header(bearer(&token));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn expired_token_is_rejected() {
    let market = seed_marketplace().await;
    let token = issue_token(market.customer.id, Role::Customer, (Utc::now() - Duration::hours(2)).timestamp());
    let req = TestRequest::get().uri("/api/customer/cart").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("expired"), "{body}");
}

#[actix_web::test]
async fn customers_cannot_use_admin_routes() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.customer);
    let req = TestRequest::get().uri("/api/admin/users").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("customer"), "{body}");
}

#[actix_web::test]
async fn providers_cannot_check_out() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.provider);
    let req = TestRequest::post()
        .uri("/api/customer/checkout")
        .insert_header(bearer(&token))
        .set_json(serde_json::json!({"payment_method": "mpesa", "shipping_address": "Nakuru", "phone_number": "0712345678"}));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_can_list_users_by_role() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.admin);
    let req = TestRequest::get().uri("/api/admin/users?role=customer").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let users: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u["role"] == "customer"));
}

#[actix_web::test]
async fn admins_cannot_be_deactivated() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.admin);
    let uri = format!("/api/admin/users/{}/deactivate", market.admin.id);
    let req = TestRequest::put().uri(&uri).insert_header(bearer(&token));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/admin/users/{}/deactivate", market.customer.id);
    let req = TestRequest::put().uri(&uri).insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let user: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(user["is_active"], false);
}
