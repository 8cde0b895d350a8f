//! # UPI payment engine public API
//!
//! The `upe_api` module exposes the programmatic API of the payment engine. Each API wraps a storage backend that
//! implements the traits it needs, so callers only pick up the functionality they use.
//!
//! * [`reconciliation_api`] matches forwarded payment notifications to orders. It is the only writer of payment-driven
//!   status transitions and ledger entries.
//! * [`order_api`] opens orders, reports their deadlines and runs the expiry sweep.
//! * [`ledger_api`] reads the transaction ledger and the unmapped notification sink.
//! * [`settings_api`] manages the merchant settings record.
//!
//! ```rust,ignore
//! use upi_payment_engine::{ReconciliationApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url("sqlite://data/upi_gateway.db", 5).await?;
//! let api = ReconciliationApi::new(db, EventProducers::default());
//! let outcome = api.reconcile(payload).await?;
//! ```
pub mod errors;
pub mod ledger_api;
pub mod order_api;
pub mod order_objects;
pub mod reconciliation_api;
pub mod settings_api;
pub mod timeout_policy;
