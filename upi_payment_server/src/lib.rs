//! # UPI payment server
//! This crate hosts the HTTP server for the UPI payment gateway. It is responsible for:
//! * Accepting payment notifications from the listener app and handing them to the reconciliation engine.
//! * Creating orders for merchants and serving their UPI QR codes.
//! * The dashboard endpoints: orders, ledger, unmapped notifications, statistics and settings.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/notifications`: Listener app notifications. Requires the listener token.
//! * `/api/orders`: Order creation (merchant access) and listing.
//! * `/api/transactions`, `/api/unmapped-notifications`, `/api/dashboard/stats`: Dashboard data.
//! * `/api/settings`: Merchant settings, key and token regeneration, and the allowed domain list.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
