//! # Storage backend contracts
//!
//! This module defines the behaviour that a storage backend must expose in order to be used by the UPI payment
//! engine.
//!
//! * [`OrderManagement`] creates, fetches and searches orders, and performs the conditional status transition.
//! * [`LedgerManagement`] provides read access to the transaction ledger and the unmapped notification sink.
//! * [`SettingsManagement`] manages the single merchant settings record.
//! * [`PaymentGatewayDatabase`] is the highest level of behaviour. It composes the traits above and adds the atomic,
//!   multi-record operations used by the reconciliation engine.
mod data_objects;
mod ledger_management;
mod order_management;
mod payment_gateway_database;
mod settings_management;

pub use data_objects::{ExpiryResult, PaymentClaim};
pub use ledger_management::LedgerManagement;
pub use order_management::OrderManagement;
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
pub use settings_management::SettingsManagement;
