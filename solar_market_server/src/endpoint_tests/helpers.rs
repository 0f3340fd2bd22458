use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
    ResponseError,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;
use slm_common::{Money, Secret};
use solar_market_engine::{
    db_types::{NewProduct, NewProviderProfile, NewUser, Product, Role, User},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::PaymentGateway,
    AccountApi,
    CartApi,
    CatalogApi,
    SqliteDatabase,
};

use crate::{
    auth::JwtClaims,
    config::{AuthConfig, CallbackConfig, ServerConfig},
    server::configure_app,
};

// DO NOT re-use these secrets anywhere.
pub const JWT_SECRET: &str = "endpoint-test-secret-0123456789abcdef";
pub const CALLBACK_SECRET: &str = "callback-test-secret";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        auth: AuthConfig::new(JWT_SECRET),
        callback: CallbackConfig { secret: Some(Secret::new(CALLBACK_SECRET.to_string())), whitelist: None },
        ..Default::default()
    }
}

pub fn issue_token(sub: i64, role: Role, exp: i64) -> String {
    let claims = JwtClaims { sub, role, exp };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).expect("Failed to sign token")
}

/// A token that is good for the next hour.
pub fn valid_token(user: &User) -> String {
    issue_token(user.id, user.role, (Utc::now() + Duration::hours(1)).timestamp())
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Sends a single request through a fully configured app and returns the status and body.
pub async fn send<G: PaymentGateway + 'static>(
    req: TestRequest,
    config: &ServerConfig,
    db: &SqliteDatabase,
    gateway: G,
) -> (StatusCode, String) {
    send_with(req, |cfg| configure_app(cfg, config, db.clone(), gateway)).await
}

/// Sends a single request to an app set up by `configure`. Requests rejected by middleware surface as errors from the
/// service, so those are rendered into responses here.
pub async fn send_with<F: FnOnce(&mut ServiceConfig)>(req: TestRequest, configure: F) -> (StatusCode, String) {
    let service = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    let (status, body) = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            (res.status(), res.into_body().try_into_bytes().unwrap())
        },
        Err(e) => {
            let res = e.error_response();
            (res.status(), res.into_body().try_into_bytes().unwrap())
        },
    };
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub struct Marketplace {
    pub db: SqliteDatabase,
    pub customer: User,
    pub other_customer: User,
    pub provider: User,
    pub admin: User,
    /// An approved 100W panel priced at KES 3,000, with 10 in stock.
    pub panel: Product,
}

/// Creates a fresh database with one approved provider, one approved product and a few users.
pub async fn seed_marketplace() -> Marketplace {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    let accounts = AccountApi::new(db.clone(), 10);
    let customer = accounts.create_user(new_user("wanjiru@example.com", Role::Customer)).await.unwrap();
    let other_customer = accounts.create_user(new_user("otieno@example.com", Role::Customer)).await.unwrap();
    let provider = accounts.create_user(new_user("jua@example.com", Role::Provider)).await.unwrap();
    let admin = accounts.create_user(new_user("admin@example.com", Role::Admin)).await.unwrap();

    let catalog = CatalogApi::new(db.clone(), 12);
    let profile = NewProviderProfile { business_name: "Jua Kali Solar".into(), ..Default::default() };
    let profile = catalog.create_profile(provider.id, profile).await.unwrap();
    catalog.set_profile_approval(profile.id, true).await.unwrap();
    let panel = NewProduct {
        name: "100W Solar Panel".into(),
        description: "Monocrystalline panel for home systems".into(),
        price: Money::from_units(3000),
        wattage: Some(100),
        stock_quantity: 10,
        ..Default::default()
    };
    let panel = catalog.create_product(provider.id, panel).await.unwrap();
    let panel = catalog.set_product_approval(panel.id, true).await.unwrap();
    Marketplace { db, customer, other_customer, provider, admin, panel }
}

impl Marketplace {
    pub async fn fill_cart(&self, quantity: i64) {
        let cart = CartApi::new(self.db.clone(), 50);
        cart.add_item(self.customer.id, self.panel.id, quantity).await.unwrap();
    }
}

fn new_user(email: &str, role: Role) -> NewUser {
    NewUser { email: email.into(), full_name: email.split('@').next().unwrap_or(email).into(), phone: None, role }
}
