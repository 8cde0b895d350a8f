//! UPI Payment Engine
//!
//! The UPI payment engine lets merchants collect UPI payments without a payment-aggregator integration. Customers pay
//! a generated `upi://pay` intent with any UPI app, and a listener app on the merchant's phone forwards the resulting
//! payment notification to the gateway. This library contains the core logic: matching those free-text notifications
//! to orders, exactly once per order.
//!
//! The library is divided into these main sections:
//! 1. Storage. The backend contracts live in [`mod@traits`] and SQLite is the supported backend. The data types used in
//!    the database are defined in [`mod@db_types`] and are public.
//! 2. The notification parser and other pure helpers ([`mod@helpers`]).
//! 3. The engine's public API: [`ReconciliationApi`], [`OrderApi`], [`LedgerApi`] and [`SettingsApi`].
//!
//! The engine also emits events that can be subscribed to ([`mod@events`]), for example when a payment has been
//! recorded or a notification could not be matched.
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;
mod upe_api;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    ExpiryResult,
    LedgerManagement,
    OrderManagement,
    PaymentClaim,
    PaymentGatewayDatabase,
    PaymentGatewayError,
    SettingsManagement,
};
pub use upe_api::{
    errors::{LedgerApiError, OrderApiError, ReconciliationError, SettingsApiError},
    ledger_api::LedgerApi,
    order_api::OrderApi,
    order_objects,
    reconciliation_api::{ReconciliationApi, ReconciliationOutcome, UnmappedReason},
    settings_api::{SettingsApi, SettingsView},
    timeout_policy::OrderTimeoutPolicy,
};
