use std::fmt::Debug;

use crate::{
    db_types::{OrderId, Transaction, UnmappedNotification},
    traits::LedgerManagement,
    upe_api::errors::LedgerApiError,
};

/// Read-only access to the transaction ledger and the unmapped notification sink.
pub struct LedgerApi<B> {
    db: B,
}

impl<B> Debug for LedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerApi")
    }
}

impl<B> LedgerApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> LedgerApi<B>
where B: LedgerManagement
{
    /// All matched payments, newest first.
    pub async fn transactions(&self) -> Result<Vec<Transaction>, LedgerApiError> {
        let result = self.db.fetch_transactions().await?;
        Ok(result)
    }

    pub async fn transaction_for_order(&self, order_id: &OrderId) -> Result<Option<Transaction>, LedgerApiError> {
        let result = self.db.fetch_transaction_for_order(order_id).await?;
        Ok(result)
    }

    /// Notifications that could not be matched to an order, newest first.
    pub async fn unmapped_notifications(&self) -> Result<Vec<UnmappedNotification>, LedgerApiError> {
        let result = self.db.fetch_unmapped_notifications().await?;
        Ok(result)
    }
}
