//! # Backend contracts
//!
//! The traits in this module define what a storage backend must provide for the solar marketplace engine, plus the
//! [`PaymentGateway`] collaborator that the checkout flow calls out to.
//!
//! * [`CheckoutManagement`] is the heart of the engine: order creation with stock reservation, and the
//!   compare-and-swap payment transitions used by checkout and callback reconciliation.
//! * [`CartManagement`] stages customer intent before checkout.
//! * [`CatalogManagement`] covers products and provider profiles.
//! * [`AccountManagement`] covers users and read access to orders, line items and the payment callback audit trail.
//! * [`TicketManagement`] covers customer support tickets.
mod account_management;
mod cart_management;
mod catalog_management;
mod checkout_management;
mod payment_gateway;
mod ticket_management;

pub mod data_objects;

pub use account_management::{AccountApiError, AccountManagement};
pub use cart_management::{CartApiError, CartManagement};
pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use checkout_management::{CheckoutError, CheckoutManagement, PaymentVerdict, Settlement};
pub use payment_gateway::{GatewayError, PaymentGateway, PaymentInitiation, PaymentRequest};
pub use ticket_management::{TicketApiError, TicketManagement};
