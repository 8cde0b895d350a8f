use chrono::{DateTime, Utc};

use crate::{
    db_types::{DashboardStats, NewOrder, Order, OrderId, OrderStatusType},
    order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order in `PENDING` status, with `pending_at` set to the order's creation time.
    ///
    /// If an order with the same order id already exists, [`PaymentGatewayError::OrderAlreadyExists`] is returned and
    /// nothing is written.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError>;

    /// Fetches orders matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Moves a `PENDING` order into `status`, stamping the matching timestamp (`completed_at` or `expired_at`) with
    /// `at`.
    ///
    /// The update is conditional on the order still being `PENDING`. If the order does not exist, or is already in a
    /// terminal status, nothing is changed and `None` is returned.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, PaymentGatewayError>;
}
