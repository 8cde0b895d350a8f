use crate::db_types::{Order, Transaction};

/// The result of trying to record a payment against an order.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentClaim {
    /// The order transition and the ledger entry were committed together.
    Claimed { order: Order, transaction: Transaction },
    /// Another notification already claimed this order. Nothing was written.
    AlreadyClaimed,
}

#[derive(Debug, Clone, Default)]
pub struct ExpiryResult {
    pub expired: Vec<Order>,
}

impl ExpiryResult {
    pub fn new(expired: Vec<Order>) -> Self {
        Self { expired }
    }

    pub fn count(&self) -> usize {
        self.expired.len()
    }
}
