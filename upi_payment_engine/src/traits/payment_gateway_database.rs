use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{NewTransaction, NewUnmappedNotification, OrderId, OrderStatusType, UnmappedNotification},
    traits::{
        data_objects::{ExpiryResult, PaymentClaim},
        LedgerManagement,
        OrderManagement,
        SettingsManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the UPI payment engine.
///
/// On top of plain order, ledger and settings access, a backend must provide the atomic operations the
/// reconciliation engine relies on:
/// * Claiming an order for a payment (status transition plus ledger entry, all or nothing)
/// * Appending to the unmapped notification sink
/// * Sweeping stale pending orders into `EXPIRED`
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement + LedgerManagement + SettingsManagement {
    /// Records a payment against an order, in a single atomic transaction:
    /// * The order is moved into `new_status` (`COMPLETED` or `EXPIRED`), conditional on it still being `PENDING`.
    ///   An order that was already swept into `EXPIRED`, and has no ledger entry yet, may also be claimed with
    ///   `new_status = EXPIRED`. It keeps its status and original `expired_at`.
    /// * The transaction is appended to the ledger.
    ///
    /// If the conditional update matches nothing, or the ledger already holds a transaction for the order,
    /// [`PaymentClaim::AlreadyClaimed`] is returned and nothing is committed. Any other failure rolls back both writes.
    async fn claim_order_payment(
        &self,
        new_status: OrderStatusType,
        transaction: NewTransaction,
    ) -> Result<PaymentClaim, PaymentGatewayError>;

    /// Appends a notification that could not be matched to an order.
    async fn record_unmapped_notification(
        &self,
        notification: NewUnmappedNotification,
    ) -> Result<UnmappedNotification, PaymentGatewayError>;

    /// Marks `PENDING` orders created before `created_before` as `EXPIRED`, stamping `expired_at` with `at`.
    ///
    /// Each order is flipped with its own conditional update, so a payment that lands while the sweep is running is
    /// never overwritten. The result lists the orders that were actually expired.
    async fn expire_pending_orders(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<ExpiryResult, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cannot insert order, since it already exists with id {0}")]
    OrderAlreadyExists(OrderId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Orders cannot be moved into {0} status")]
    IllegalStatusTransition(OrderStatusType),
    #[error("The merchant settings have not been initialised")]
    SettingsNotInitialized,
    #[error("Invalid settings value. {0}")]
    InvalidSettings(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
