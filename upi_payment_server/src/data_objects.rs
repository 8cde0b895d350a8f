use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use upi_payment_engine::{
    db_types::{OrderId, OrderStatusType, Paise},
    order_objects::CreatedOrder,
    ReconciliationOutcome,
    UnmappedReason,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Unmapped,
    Duplicate,
    Completed,
    Expired,
}

/// The reply sent to the listener app for every accepted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub status: NotificationStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl From<ReconciliationOutcome> for NotificationResponse {
    fn from(outcome: ReconciliationOutcome) -> Self {
        let (status, message, order_id) = match outcome {
            ReconciliationOutcome::Unmapped(UnmappedReason::NoOrderId) => {
                (NotificationStatus::Unmapped, "No order_id found in notification", None)
            },
            ReconciliationOutcome::Unmapped(UnmappedReason::OrderNotFound(_)) => {
                (NotificationStatus::Unmapped, "Order not found", None)
            },
            ReconciliationOutcome::Unmapped(UnmappedReason::OrderNotPayable(_)) => {
                (NotificationStatus::Unmapped, "Order not payable", None)
            },
            ReconciliationOutcome::Duplicate(_) => (NotificationStatus::Duplicate, "Order already completed", None),
            ReconciliationOutcome::Completed(id) => {
                (NotificationStatus::Completed, "Payment processed successfully", Some(id))
            },
            ReconciliationOutcome::ExpiredLate(id) => {
                (NotificationStatus::Expired, "Payment received but order expired", Some(id))
            },
        };
        Self { status, message: message.to_string(), order_id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    pub upi_uri: String,
    pub qr_image_url: String,
    pub qr_page_url: String,
    pub status: OrderStatusType,
    pub amount: Paise,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CreateOrderResponse {
    /// Builds the response for a new order. QR links are absolute, rooted at `public_url`.
    pub fn new(created: CreatedOrder, public_url: &str) -> Self {
        let order = created.order;
        let base = public_url.trim_end_matches('/');
        Self {
            qr_image_url: format!("{base}/api/orders/{}/qr", order.order_id.as_str()),
            qr_page_url: format!("{base}/pay/{}", order.order_id.as_str()),
            order_id: order.order_id,
            upi_uri: created.upi_uri,
            status: order.status,
            amount: order.amount,
            created_at: order.created_at,
            expires_at: created.expires_at,
        }
    }
}

/// Query string for the order list. `status` is matched case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainRequest {
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedDomainsResponse {
    pub allowed_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub static_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerTokenResponse {
    pub listener_token: String,
}
