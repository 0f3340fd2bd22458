//! # Solar market server
//! This crate hosts the HTTP server for the solar marketplace. It is responsible for:
//! * Authenticating callers (HS256 bearer tokens) and enforcing the role allowed on each route.
//! * Exposing the customer, provider and admin REST API on top of the solar market engine.
//! * Receiving M-PESA STK push callbacks and handing them to the engine for reconciliation. The gateway always gets
//!   the same acknowledgement back, whatever happens locally.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/mpesa/callback`: The STK push result webhook. Guarded by a URL token and an optional IP whitelist.
//! * `/api/customer/...`, `/api/provider/...`, `/api/admin/...`: The marketplace API. See [routes](routes/index.html).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
