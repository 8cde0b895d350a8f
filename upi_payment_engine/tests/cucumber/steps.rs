use cucumber::{given, then, when};
use upi_payment_engine::{
    db_types::{OrderId, OrderStatusType, SettingsUpdate},
    LedgerManagement,
    OrderApi,
    OrderManagement,
    ReconciliationOutcome,
    SettingsManagement,
};

use crate::{
    cucumber::GatewayWorld,
    support::prepare_env::{insert_order_at, notification, secs, t0},
};

#[given(expr = "a pending order {word} for {int} paise")]
async fn pending_order(world: &mut GatewayWorld, order_id: String, paise: i64) {
    insert_order_at(world.db(), &order_id, paise, t0()).await;
}

#[given(expr = "order {word} has failed")]
async fn failed_order(world: &mut GatewayWorld, order_id: String) {
    let id = OrderId::from(order_id);
    let order = world.db().update_order_status(&id, OrderStatusType::Failed, t0()).await.expect("Error updating order");
    assert!(order.is_some(), "Order {id} was not pending");
}

#[when(expr = "the order timeout is changed to {int} seconds")]
async fn change_timeout(world: &mut GatewayWorld, timeout: i64) {
    let update = SettingsUpdate { order_timeout_secs: Some(timeout), ..Default::default() };
    world.db().update_settings(update).await.expect("Error updating settings");
}

#[when(expr = "the expiry sweep runs after {int} seconds")]
async fn expiry_sweep(world: &mut GatewayWorld, after: i64) {
    let api = OrderApi::new(world.db().clone());
    api.expire_stale_orders(t0() + secs(after)).await.expect("Error running expiry sweep");
}

#[when(expr = "the notification {string} with text {string} arrives after {int} seconds")]
async fn notification_arrives(world: &mut GatewayWorld, title: String, text: String, after: i64) {
    let raw = notification(&title, &text);
    let outcome = world.api().reconcile_at(raw, t0() + secs(after)).await.expect("Error reconciling notification");
    world.last_outcome = Some(outcome);
}

#[then(expr = "the outcome is {word}")]
async fn check_outcome(world: &mut GatewayWorld, expected: String) {
    let outcome = world.last_outcome.as_ref().expect("No notification has been reconciled");
    let name = match outcome {
        ReconciliationOutcome::Unmapped(_) => "unmapped",
        ReconciliationOutcome::Duplicate(_) => "duplicate",
        ReconciliationOutcome::Completed(_) => "completed",
        ReconciliationOutcome::ExpiredLate(_) => "expired",
    };
    assert_eq!(name, expected, "Unexpected outcome {outcome:?}");
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut GatewayWorld, order_id: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let id = OrderId::from(order_id);
    let order = world.db().fetch_order_by_order_id(&id).await.expect("Error fetching order").expect("No such order");
    assert_eq!(order.status, expected);
}

#[then(expr = "the ledger holds {int} transaction(s)")]
async fn check_ledger(world: &mut GatewayWorld, count: usize) {
    let transactions = world.db().fetch_transactions().await.expect("Error fetching transactions");
    assert_eq!(transactions.len(), count);
}

#[then(expr = "the payment for order {word} is flagged as late")]
async fn check_late(world: &mut GatewayWorld, order_id: String) {
    let id = OrderId::from(order_id);
    let tx = world.db().fetch_transaction_for_order(&id).await.expect("Error fetching transaction").expect("No payment");
    assert!(tx.is_late_payment);
}

#[then(expr = "the payment for order {word} is from {string}")]
async fn check_payer(world: &mut GatewayWorld, order_id: String, payer: String) {
    let id = OrderId::from(order_id);
    let tx = world.db().fetch_transaction_for_order(&id).await.expect("Error fetching transaction").expect("No payment");
    assert_eq!(tx.payer_name, payer);
}

#[then(expr = "the unmapped sink holds {int} notification(s) with reason {string}")]
async fn check_unmapped(world: &mut GatewayWorld, count: usize, reason: String) {
    let unmapped = world.db().fetch_unmapped_notifications().await.expect("Error fetching unmapped notifications");
    assert_eq!(unmapped.iter().filter(|n| n.reason == reason).count(), count);
}
