use crate::db_types::{Order, Transaction, UnmappedNotification};

/// Emitted once per order, when a payment notification has been matched and committed to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceivedEvent {
    pub order: Order,
    pub transaction: Transaction,
}

impl PaymentReceivedEvent {
    pub fn new(order: Order, transaction: Transaction) -> Self {
        Self { order, transaction }
    }

    pub fn is_late(&self) -> bool {
        self.transaction.is_late_payment
    }
}

/// Emitted when a notification lands in the unmapped sink.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationUnmappedEvent {
    pub notification: UnmappedNotification,
}

impl NotificationUnmappedEvent {
    pub fn new(notification: UnmappedNotification) -> Self {
        Self { notification }
    }
}
