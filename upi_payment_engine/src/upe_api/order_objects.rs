use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{Order, OrderId, OrderStatusType, Paise};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub status: Option<Vec<OrderStatusType>>,
    pub customer_mobile: Option<String>,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn with_customer_mobile<S: Into<String>>(mut self, mobile: S) -> Self {
        self.customer_mobile = Some(mobile.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True if the filter has no `WHERE` criteria. The `limit` is not a criterion.
    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.customer_mobile.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters. ")?;
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(statuses) = self.status.as_ref().filter(|s| !s.is_empty()) {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(mobile) = &self.customer_mobile {
            write!(f, "customer_mobile: {mobile}. ")?;
        }
        if let Some(limit) = self.limit {
            write!(f, "limit: {limit}. ")?;
        }
        Ok(())
    }
}

/// A merchant's request to open a new payment order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Amount in paise
    pub amount: i64,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    /// Defaults to the merchant UPI id in the settings
    pub receiver_upi_id: Option<String>,
    pub metadata: Option<Value>,
}

impl CreateOrderRequest {
    pub fn new(amount: i64) -> Self {
        Self { amount, ..Default::default() }
    }
}

/// A freshly created order, together with the payment intent the customer should be shown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order: Order,
    pub upi_uri: String,
    pub expires_at: DateTime<Utc>,
}

/// An order along with its payment deadline, as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusView {
    pub order_id: OrderId,
    pub amount: Paise,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Seconds left before the order times out. Zero once the deadline has passed or the order is no longer pending.
    pub seconds_remaining: i64,
    pub upi_uri: String,
}
