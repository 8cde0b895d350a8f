use crate::{
    db_types::{OrderId, Transaction, UnmappedNotification},
    traits::PaymentGatewayError,
};

/// Read access to the append-only transaction ledger and unmapped notification sink. Records in both are only ever
/// created by [`crate::traits::PaymentGatewayDatabase`].
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// All transactions, newest first.
    async fn fetch_transactions(&self) -> Result<Vec<Transaction>, PaymentGatewayError>;

    async fn fetch_transaction_for_order(&self, order_id: &OrderId) -> Result<Option<Transaction>, PaymentGatewayError>;

    /// All unmapped notifications, newest first.
    async fn fetch_unmapped_notifications(&self) -> Result<Vec<UnmappedNotification>, PaymentGatewayError>;
}
