use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{DashboardStats, NewOrder, Order, OrderId, OrderStatusType, Paise, Settings},
    helpers::{new_order_id, UpiPaymentRequest},
    traits::{ExpiryResult, PaymentGatewayDatabase, PaymentGatewayError},
    upe_api::{
        errors::OrderApiError,
        order_objects::{CreateOrderRequest, CreatedOrder, OrderQueryFilter, OrderStatusView},
        timeout_policy::OrderTimeoutPolicy,
    },
};

/// Number of fresh random ids tried before giving up on an order id collision.
const MAX_ORDER_ID_ATTEMPTS: usize = 5;

/// `OrderApi` covers the merchant side of the order lifecycle: opening orders, reporting their status and deadline,
/// and the dashboard figures.
pub struct OrderApi<B> {
    db: B,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderApi<B>
where B: PaymentGatewayDatabase
{
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<CreatedOrder, OrderApiError> {
        self.create_order_at(request, Utc::now()).await
    }

    /// Opens a new `PENDING` order with a random 10-digit id.
    ///
    /// The receiver UPI id defaults to the merchant's. The returned UPI URI carries the order id in both the reference
    /// and the note fields, and the deadline is computed from the current order timeout.
    pub async fn create_order_at(
        &self,
        request: CreateOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<CreatedOrder, OrderApiError> {
        if request.amount <= 0 {
            return Err(OrderApiError::InvalidAmount(request.amount));
        }
        let settings = self.settings().await?;
        let receiver = request
            .receiver_upi_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| settings.merchant_upi_id.clone());
        for attempt in 1..=MAX_ORDER_ID_ATTEMPTS {
            let mut order = NewOrder::new(new_order_id(), Paise::from(request.amount), receiver.clone())
                .with_created_at(now);
            order.customer_name = request.customer_name.clone();
            order.customer_mobile = request.customer_mobile.clone();
            order.metadata = request.metadata.clone();
            match self.db.insert_order(order).await {
                Ok(order) => {
                    info!("🔄️📦️ Order {} created for {}", order.order_id, order.amount);
                    let upi_uri = upi_uri(&order, &settings);
                    let expires_at = OrderTimeoutPolicy::from_settings(&settings).deadline(&order);
                    return Ok(CreatedOrder { order, upi_uri, expires_at });
                },
                Err(PaymentGatewayError::OrderAlreadyExists(id)) => {
                    warn!("🔄️📦️ Order id {id} is taken. Retrying with a new id ({attempt}/{MAX_ORDER_ID_ATTEMPTS})");
                },
                Err(e) => return Err(e.into()),
            }
        }
        error!("🔄️📦️ Could not allocate an order id after {MAX_ORDER_ID_ATTEMPTS} attempts");
        Err(OrderApiError::OrderIdExhausted(MAX_ORDER_ID_ATTEMPTS))
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderApiError> {
        self.db.fetch_order_by_order_id(order_id).await?.ok_or_else(|| OrderApiError::OrderNotFound(order_id.clone()))
    }

    /// Orders matching the filter, newest first.
    pub async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        trace!("🔄️📦️ Searching orders. {filter}");
        let orders = self.db.search_orders(filter).await?;
        Ok(orders)
    }

    pub async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatusView, OrderApiError> {
        self.order_status_at(order_id, Utc::now()).await
    }

    /// The order together with its deadline. The deadline comes from the same timeout the reconciliation engine uses.
    pub async fn order_status_at(
        &self,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<OrderStatusView, OrderApiError> {
        let order = self.fetch_order(order_id).await?;
        let settings = self.settings().await?;
        let policy = OrderTimeoutPolicy::from_settings(&settings);
        let seconds_remaining =
            if order.status == OrderStatusType::Pending { policy.seconds_remaining(&order, now) } else { 0 };
        Ok(OrderStatusView {
            upi_uri: upi_uri(&order, &settings),
            expires_at: policy.deadline(&order),
            seconds_remaining,
            order_id: order.order_id,
            amount: order.amount,
            status: order.status,
            created_at: order.created_at,
        })
    }

    /// The `upi://pay` URI for an existing order, e.g. to render its QR code.
    pub async fn upi_uri(&self, order_id: &OrderId) -> Result<String, OrderApiError> {
        let order = self.fetch_order(order_id).await?;
        let settings = self.settings().await?;
        Ok(upi_uri(&order, &settings))
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, OrderApiError> {
        let stats = self.db.fetch_dashboard_stats().await?;
        Ok(stats)
    }

    /// Moves every `PENDING` order that is past its deadline into `EXPIRED`.
    pub async fn expire_stale_orders(&self, now: DateTime<Utc>) -> Result<ExpiryResult, OrderApiError> {
        let settings = self.settings().await?;
        let cutoff = OrderTimeoutPolicy::from_settings(&settings).stale_before(now);
        let result = self.db.expire_pending_orders(cutoff, now).await?;
        if result.count() > 0 {
            info!("🔄️⏰️ {} stale orders expired", result.count());
        }
        Ok(result)
    }

    async fn settings(&self) -> Result<Settings, OrderApiError> {
        self.db.fetch_settings().await?.ok_or(OrderApiError::SettingsNotInitialized)
    }
}

fn upi_uri(order: &Order, settings: &Settings) -> String {
    UpiPaymentRequest::new(&order.receiver_upi_id, &settings.merchant_name, order.amount, &order.order_id).to_uri()
}
