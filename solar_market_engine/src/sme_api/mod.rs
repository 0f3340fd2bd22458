//! # Solar market engine public API
//!
//! The `sme_api` module exposes the programmatic API of the engine. The API is modular, so that clients can pick the
//! parts they need:
//!
//! * [`order_flow_api`] turns carts into orders, initiates M-PESA payments and reconciles the gateway's callbacks.
//! * [`cart_api`] manages customer carts.
//! * [`catalog_api`] covers products and provider profiles.
//! * [`account_api`] covers users, order history and analytics.
//! * [`ticket_api`] covers customer support tickets.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs.
//!
//! ```rust,ignore
//! use solar_market_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/solar_market.db", 5).await?;
//! // SqliteDatabase implements CartManagement
//! let api = CartApi::new(db, 50);
//! let cart = api.view_cart(customer_id).await?;
//! ```
pub mod account_api;
pub mod cart_api;
pub mod catalog_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod ticket_api;
