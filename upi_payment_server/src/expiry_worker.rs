use std::time::Duration;

use chrono::Utc;
use log::*;
use tokio::task::JoinHandle;
use upi_payment_engine::{db_types::Order, OrderApi, SqliteDatabase};

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The worker only tidies up order statuses for the dashboard. Late payments are detected when the notification
/// arrives, whether or not the sweep has run.
pub fn start_expiry_worker(db: SqliteDatabase, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = OrderApi::new(db);
        info!("🕰️ Order expiry worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            trace!("🕰️ Running order expiry job");
            match api.expire_stale_orders(Utc::now()).await {
                Ok(result) => {
                    if result.count() > 0 {
                        info!("🕰️ {} orders expired", result.count());
                        debug!("🕰️ Expired orders: {}", order_list(&result.expired));
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] order_id: {} amount: {}", o.id, o.order_id, o.amount))
        .collect::<Vec<String>>()
        .join(", ")
}
