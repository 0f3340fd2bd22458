use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use solar_market_engine::{
    db_types::{NewProviderProfile, NewUser, Role},
    AccountApi,
    CatalogApi,
};

use super::{
    helpers::{bearer, seed_marketplace, send, test_config, valid_token},
    mocks::idle_gateway,
};

#[actix_web::test]
async fn browse_and_search_products() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.customer);

    let req = TestRequest::get().uri("/api/customer/products?search=panel&min_wattage=50").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["name"], "100W Solar Panel");

    let req = TestRequest::get().uri("/api/customer/products?max_price=2000").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["total"], 0);
}

#[actix_web::test]
async fn inverted_price_range_is_rejected() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.customer);
    let req =
        TestRequest::get().uri("/api/customer/products?min_price=5000&max_price=100").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"min_price cannot exceed max_price"}"#);
}

#[actix_web::test]
async fn malformed_query_is_rejected() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.customer);
    let req = TestRequest::get().uri("/api/customer/products?min_price=lots").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid query parameters"), "{body}");
}

#[actix_web::test]
async fn unknown_product() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.customer);
    let req = TestRequest::get().uri("/api/customer/products/9999").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Product 9999 not found"}"#);
}

#[actix_web::test]
async fn unapproved_providers_cannot_list_products() {
    let market = seed_marketplace().await;
    let accounts = AccountApi::new(market.db.clone(), 10);
    let newcomer = NewUser {
        email: "newcomer@example.com".into(),
        full_name: "Newcomer".into(),
        phone: None,
        role: Role::Provider,
    };
    let newcomer = accounts.create_user(newcomer).await.unwrap();
    let catalog = CatalogApi::new(market.db.clone(), 12);
    let profile = NewProviderProfile { business_name: "Sunrise Energy".into(), ..Default::default() };
    catalog.create_profile(newcomer.id, profile).await.unwrap();

    let token = valid_token(&newcomer);
    let product = json!({"name": "Solar lantern", "description": "Portable lantern", "price": 1500, "stock_quantity": 5});
    let req = TestRequest::post().uri("/api/provider/products").insert_header(bearer(&token)).set_json(&product);
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The approved provider can, but the product waits for an admin
    let token = valid_token(&market.provider);
    let req = TestRequest::post().uri("/api/provider/products").insert_header(bearer(&token)).set_json(&product);
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["is_approved"], false);

    let token = valid_token(&market.admin);
    let req = TestRequest::get().uri("/api/admin/products/pending").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let pending: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["name"], "Solar lantern");
}

#[actix_web::test]
async fn providers_only_see_their_own_products() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.provider);
    let uri = format!("/api/provider/products/{}", market.panel.id);
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);

    // An admin token is not a provider token
    let token = valid_token(&market.admin);
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cart_round_trip() {
    let market = seed_marketplace().await;
    let token = valid_token(&market.customer);
    let req = TestRequest::post()
        .uri("/api/customer/cart/add")
        .insert_header(bearer(&token))
        .set_json(json!({"product_id": market.panel.id, "quantity": 2}));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::CREATED);

    let req = TestRequest::post().uri("/api/customer/cart/add").insert_header(bearer(&token)).set_json(json!({}));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"product_id is required"}"#);

    let req = TestRequest::get().uri("/api/customer/cart").insert_header(bearer(&token));
    let (status, body) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
    let cart: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(cart["item_count"], 1);
    assert_eq!(cart["subtotal"].as_f64(), Some(6000.0));

    let req = TestRequest::delete().uri("/api/customer/cart/clear").insert_header(bearer(&token));
    let (status, _) = send(req, &test_config(), &market.db, idle_gateway()).await;
    assert_eq!(status, StatusCode::OK);
}

mod mocked_backend {
    use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
    use chrono::Utc;
    use slm_common::Money;
    use solar_market_engine::{
        db_types::{Product, Role},
        traits::CatalogApiError,
        CatalogApi,
    };

    use crate::{
        auth::TokenValidator,
        endpoint_tests::{
            helpers::{bearer, issue_token, send_with, test_config},
            mocks::MockCatalogManager,
        },
        middleware::IdentityMiddlewareFactory,
        routes::ProductDetailRoute,
    };

    fn configure(backend: MockCatalogManager) -> impl FnOnce(&mut ServiceConfig) {
        move |cfg| {
            let validator = TokenValidator::new(&test_config().auth);
            cfg.app_data(web::Data::new(CatalogApi::new(backend, 12))).service(
                web::scope("/api")
                    .wrap(IdentityMiddlewareFactory::new(validator))
                    .service(ProductDetailRoute::<MockCatalogManager>::new()),
            );
        }
    }

    fn customer_token() -> String {
        issue_token(1, Role::Customer, Utc::now().timestamp() + 3600)
    }

    fn lantern(is_active: bool) -> Product {
        Product {
            id: 7,
            provider_id: 3,
            name: "Solar lantern".into(),
            description: "Portable lantern".into(),
            price: Money::from_units(1500),
            wattage: Some(5),
            battery_capacity: None,
            solar_panel_type: None,
            lighting_duration: Some("8 hours".into()),
            warranty_period: None,
            stock_quantity: 4,
            image_url: None,
            is_active,
            is_approved: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn withdrawn_products_are_hidden() {
        let mut backend = MockCatalogManager::new();
        backend.expect_fetch_product().times(1).returning(|_| Ok(Some(lantern(false))));
        let req = TestRequest::get().uri("/api/customer/products/7").insert_header(bearer(&customer_token()));
        let (status, body) = send_with(req, configure(backend)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, r#"{"error":"Product 7 not found"}"#);
    }

    #[actix_web::test]
    async fn storage_failures_are_500s() {
        let mut backend = MockCatalogManager::new();
        backend
            .expect_fetch_product()
            .times(1)
            .returning(|_| Err(CatalogApiError::DatabaseError("database is locked".into())));
        let req = TestRequest::get().uri("/api/customer/products/7").insert_header(bearer(&customer_token()));
        let (status, body) = send_with(req, configure(backend)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("database is locked"), "{body}");
    }

    #[actix_web::test]
    async fn non_numeric_ids_are_rejected() {
        let mut backend = MockCatalogManager::new();
        backend.expect_fetch_product().never();
        let req = TestRequest::get().uri("/api/customer/products/lantern").insert_header(bearer(&customer_token()));
        let (status, _) = send_with(req, configure(backend)).await;
        // No path error handler is registered on this app, so actix answers on its own
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
