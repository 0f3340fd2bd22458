use std::{collections::HashMap, fmt::Debug};

use cucumber::World;
use solar_market_engine::{
    db_types::{Order, Product},
    order_objects::ReconciliationOutcome,
    traits::{AccountManagement, CheckoutError},
    OrderFlowApi,
    SqliteDatabase,
};

use crate::support::{fresh_db, MockGateway};

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    pub customers: HashMap<String, i64>,
    pub providers: HashMap<String, i64>,
    pub products: HashMap<String, Product>,
    pub last_order: Option<Order>,
    pub last_error: Option<CheckoutError>,
    pub last_outcome: Option<ReconciliationOutcome>,
}

pub struct MarketSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: MockGateway,
    pub api: OrderFlowApi<SqliteDatabase, MockGateway>,
}

impl Debug for MarketSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MarketSystem ({})", self.db_path)
    }
}

impl MarketSystem {
    pub async fn new() -> Self {
        let (db_path, db) = fresh_db().await;
        let gateway = MockGateway::default();
        let api = OrderFlowApi::new(db.clone(), gateway.clone());
        Self { db_path, db, gateway, api }
    }
}

impl MarketWorld {
    pub fn system(&self) -> &MarketSystem {
        self.system.as_ref().expect("The marketplace has not been set up")
    }

    pub fn customer(&self, name: &str) -> i64 {
        *self.customers.get(name).unwrap_or_else(|| panic!("Unknown customer {name}"))
    }

    pub fn product(&self, name: &str) -> &Product {
        self.products.get(name).unwrap_or_else(|| panic!("Unknown product {name}"))
    }

    /// The most recent order, freshly read from the database.
    pub async fn current_order(&self) -> Order {
        let id = self.last_order.as_ref().expect("No order has been placed").id;
        self.system().db.fetch_order(id).await.expect("Error fetching order").expect("Order vanished")
    }
}
