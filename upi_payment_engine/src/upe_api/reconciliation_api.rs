use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use log::*;
use serde_json::Value;

use crate::{
    db_types::{NewTransaction, NewUnmappedNotification, Order, OrderId, OrderStatusType, Transaction},
    events::{EventProducers, NotificationUnmappedEvent, PaymentReceivedEvent},
    helpers::parse_notification,
    traits::{PaymentClaim, PaymentGatewayDatabase},
    upe_api::{errors::ReconciliationError, timeout_policy::OrderTimeoutPolicy},
};

/// A claim that loses a race without a ledger entry for the order is decided again, at most this many times in total.
const MAX_CLAIM_ATTEMPTS: usize = 3;

/// Why a notification could not be credited to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmappedReason {
    NoOrderId,
    OrderNotFound(OrderId),
    /// The order exists but is in a status that never accepts payments (`FAILED`).
    OrderNotPayable(OrderId),
}

impl Display for UnmappedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnmappedReason::NoOrderId => write!(f, "no order_id found"),
            UnmappedReason::OrderNotFound(_) => write!(f, "order not found"),
            UnmappedReason::OrderNotPayable(_) => write!(f, "order not payable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// The notification was appended to the unmapped sink.
    Unmapped(UnmappedReason),
    /// The order had already been paid. Nothing was written.
    Duplicate(OrderId),
    /// Paid within the timeout. The order is now `COMPLETED`.
    Completed(OrderId),
    /// Paid after the timeout. The order is `EXPIRED` and the ledger entry is flagged as a late payment.
    ExpiredLate(OrderId),
}

impl ReconciliationOutcome {
    pub fn order_id(&self) -> Option<&OrderId> {
        match self {
            ReconciliationOutcome::Unmapped(UnmappedReason::NoOrderId) => None,
            ReconciliationOutcome::Unmapped(UnmappedReason::OrderNotFound(id)) => Some(id),
            ReconciliationOutcome::Unmapped(UnmappedReason::OrderNotPayable(id)) => Some(id),
            ReconciliationOutcome::Duplicate(id) => Some(id),
            ReconciliationOutcome::Completed(id) => Some(id),
            ReconciliationOutcome::ExpiredLate(id) => Some(id),
        }
    }
}

/// `ReconciliationApi` matches forwarded payment notifications to orders.
///
/// Every notification ends up in exactly one place: the transaction ledger (together with the order's status
/// transition), the unmapped sink, or nowhere at all if the order had already been paid. Payment-driven status
/// transitions and ledger entries are only ever created here.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReconciliationApi<B>
where B: PaymentGatewayDatabase
{
    pub async fn reconcile(&self, raw: Value) -> Result<ReconciliationOutcome, ReconciliationError> {
        self.reconcile_at(raw, Utc::now()).await
    }

    /// Reconciles a raw notification payload, using `now` as the decision time.
    ///
    /// 1. The payload is parsed. Without an order id, it goes to the unmapped sink.
    /// 2. An unknown order id goes to the unmapped sink, as does a notification for a `FAILED` order.
    /// 3. A `COMPLETED` order yields [`ReconciliationOutcome::Duplicate`] with no side effects.
    /// 4. Otherwise the payment is on time if no more than the current order timeout has passed since the order was
    ///    created. The order transition and the ledger entry are committed atomically.
    ///
    /// If the claim loses a race, the ledger decides. An existing ledger entry for the order means another
    /// notification paid it, and the outcome is `Duplicate`. Without one, the order changed status underneath us
    /// (typically the expiry sweep), so it is read again and the decision is repeated.
    ///
    /// An `Err` means nothing was committed.
    pub async fn reconcile_at(
        &self,
        raw: Value,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let parsed = parse_notification(&raw);
        let Some(order_id) = parsed.order_id else {
            debug!("🔄️🔔️ Notification carries no order id");
            return self.send_to_sink(raw, UnmappedReason::NoOrderId, now).await;
        };
        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            let Some(order) = self.db.fetch_order_by_order_id(&order_id).await? else {
                debug!("🔄️🔔️ Notification references unknown order {order_id}");
                return self.send_to_sink(raw, UnmappedReason::OrderNotFound(order_id), now).await;
            };
            match order.status {
                OrderStatusType::Completed => {
                    info!("🔄️🔔️ Order {order_id} has already been paid. Ignoring duplicate notification.");
                    return Ok(ReconciliationOutcome::Duplicate(order_id));
                },
                OrderStatusType::Failed => {
                    warn!("🔄️🔔️ Payment notification received for failed order {order_id}. Sending it for review.");
                    return self.send_to_sink(raw, UnmappedReason::OrderNotPayable(order_id), now).await;
                },
                OrderStatusType::Pending | OrderStatusType::Expired => {},
            }
            let settings = self.db.fetch_settings().await?.ok_or(ReconciliationError::SettingsNotInitialized)?;
            let policy = OrderTimeoutPolicy::from_settings(&settings);
            // The only terminal status left here is EXPIRED, which can only take a late payment
            let is_late = order.status.is_terminal() || policy.is_late(&order, now);
            let new_status = if is_late { OrderStatusType::Expired } else { OrderStatusType::Completed };
            let transaction =
                NewTransaction::new(order_id.clone(), parsed.payer_name.clone(), raw.clone()).late(is_late).at(now);
            trace!("🔄️🔔️ Claiming order {order_id} for payment. Late: {is_late}. Attempt {attempt}");
            match self.db.claim_order_payment(new_status, transaction).await? {
                PaymentClaim::Claimed { order, transaction } => {
                    info!(
                        "🔄️💰️ Payment of {} from {} recorded for order {order_id}. Order is {}",
                        order.amount, transaction.payer_name, order.status
                    );
                    self.call_payment_received_hook(order, transaction).await;
                    return if is_late {
                        Ok(ReconciliationOutcome::ExpiredLate(order_id))
                    } else {
                        Ok(ReconciliationOutcome::Completed(order_id))
                    };
                },
                PaymentClaim::AlreadyClaimed => {
                    if self.db.fetch_transaction_for_order(&order_id).await?.is_some() {
                        info!("🔄️🔔️ Order {order_id} was paid by a concurrent notification. This one is a duplicate.");
                        return Ok(ReconciliationOutcome::Duplicate(order_id));
                    }
                    debug!("🔄️🔔️ Order {order_id} changed status while it was being claimed. Deciding again.");
                },
            }
        }
        warn!("🔄️🔔️ Could not claim order {order_id} after {MAX_CLAIM_ATTEMPTS} attempts. Sending it for review.");
        self.send_to_sink(raw, UnmappedReason::OrderNotPayable(order_id), now).await
    }

    async fn send_to_sink(
        &self,
        raw: Value,
        reason: UnmappedReason,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationOutcome, ReconciliationError> {
        let record = NewUnmappedNotification::new(raw, &reason).at(now);
        let notification = self.db.record_unmapped_notification(record).await?;
        info!("🔄️📥️ Notification #{} stored as unmapped: {reason}", notification.id);
        for emitter in &self.producers.notification_unmapped_producer {
            emitter.publish_event(NotificationUnmappedEvent::new(notification.clone())).await;
        }
        Ok(ReconciliationOutcome::Unmapped(reason))
    }

    async fn call_payment_received_hook(&self, order: Order, transaction: Transaction) {
        for emitter in &self.producers.payment_received_producer {
            debug!("🔄️💰️ Notifying payment received hook subscribers");
            emitter.publish_event(PaymentReceivedEvent::new(order.clone(), transaction.clone())).await;
        }
    }
}
