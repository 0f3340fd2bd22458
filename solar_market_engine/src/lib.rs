//! Solar Market Engine
//!
//! The solar market engine holds the core logic of the solar equipment marketplace: carts, checkout, payment
//! reconciliation for M-PESA STK push payments, and the catalogue, account and support-ticket resource layer.
//! It knows nothing about HTTP, and it knows about the payment processor only through the [`traits::PaymentGateway`]
//! trait.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@traits`] and the SQLite backend). The traits describe what a backend must provide; the SQLite
//!    implementation lives in [`SqliteDatabase`]. The data types used by the backend are defined in [`mod@db_types`]
//!    and are public.
//! 2. The public API ([`mod@sme_api`]). [`OrderFlowApi`] drives checkout and payment reconciliation. [`CartApi`],
//!    [`CatalogApi`], [`AccountApi`] and [`TicketApi`] cover the conventional resource layer.
pub mod db_types;
pub mod helpers;
pub mod sme_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use sme_api::{
    account_api::AccountApi,
    cart_api::CartApi,
    catalog_api::CatalogApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    ticket_api::TicketApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
