#![allow(dead_code)]
//! Shared fixtures for the engine integration tests: a freshly migrated SQLite database per test, seeded users and
//! products, and a scripted payment gateway.
pub mod mock_gateway;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use log::*;
use solar_market_engine::{
    db_types::{Money, NewProduct, NewProviderProfile, NewUser, OrderNumber, Product, Role, TicketNumber, User},
    helpers::{RandomReferences, ReferenceGenerator},
    traits::{AccountManagement, CartManagement, CatalogManagement},
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub use self::mock_gateway::MockGateway;

pub async fn fresh_db() -> (String, SqliteDatabase) {
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/slm_engine_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    Sqlite::create_database(&url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to database");
    db.run_migrations().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    (url, db)
}

pub async fn drop_db(url: &str, mut db: SqliteDatabase) {
    db.close().await.expect("Error closing database");
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

pub async fn add_user(db: &SqliteDatabase, email: &str, role: Role) -> User {
    let user = NewUser {
        email: email.to_string(),
        full_name: email.split('@').next().unwrap_or("user").to_string(),
        phone: Some("0712345678".to_string()),
        role,
    };
    db.insert_user(user).await.expect("Error inserting user")
}

/// A provider with an approved profile.
pub async fn add_provider(db: &SqliteDatabase, email: &str) -> User {
    let user = add_user(db, email, Role::Provider).await;
    let profile = NewProviderProfile { business_name: format!("{email} Solar Ltd"), ..Default::default() };
    let profile = db.insert_profile(user.id, profile).await.expect("Error inserting profile");
    db.set_profile_approval(profile.id, true).await.expect("Error approving profile");
    user
}

/// An active, approved product.
pub async fn add_product(db: &SqliteDatabase, provider_id: i64, name: &str, price_units: i64, stock: i64) -> Product {
    let product = NewProduct {
        name: name.to_string(),
        description: format!("{name} for off-grid homes"),
        price: Money::from_units(price_units),
        wattage: Some(100),
        stock_quantity: stock,
        ..Default::default()
    };
    let product = db.insert_product(provider_id, product).await.expect("Error inserting product");
    db.set_product_approval(product.id, true).await.expect("Error approving product").expect("Product vanished")
}

pub async fn fill_cart(db: &SqliteDatabase, customer_id: i64, product_id: i64, quantity: i64) {
    db.add_to_cart(customer_id, product_id, quantity).await.expect("Error adding to cart");
}

pub async fn stock_of(db: &SqliteDatabase, product_id: i64) -> i64 {
    db.fetch_product(product_id).await.expect("Error fetching product").expect("Product missing").stock_quantity
}

/// Hands out the scripted order numbers first, then falls back to random ones.
#[derive(Default)]
pub struct ScriptedReferences {
    orders: Mutex<VecDeque<String>>,
    repeat_forever: Option<String>,
}

impl ScriptedReferences {
    pub fn new(orders: &[&str]) -> Self {
        Self { orders: Mutex::new(orders.iter().map(|s| s.to_string()).collect()), repeat_forever: None }
    }

    pub fn always(order_number: &str) -> Self {
        Self { orders: Mutex::new(VecDeque::new()), repeat_forever: Some(order_number.to_string()) }
    }

    pub fn shared(self) -> Arc<dyn ReferenceGenerator> {
        Arc::new(self)
    }
}

impl ReferenceGenerator for ScriptedReferences {
    fn order_number(&self) -> OrderNumber {
        if let Some(n) = &self.repeat_forever {
            return OrderNumber(n.clone());
        }
        match self.orders.lock().unwrap().pop_front() {
            Some(n) => OrderNumber(n),
            None => RandomReferences.order_number(),
        }
    }

    fn ticket_number(&self) -> TicketNumber {
        RandomReferences.ticket_number()
    }
}
