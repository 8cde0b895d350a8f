use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
pub use sqlx::types::Json;
use sqlx::{FromRow, Type};
use thiserror::Error;
pub use upg_common::Paise;
use upg_common::Secret;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for a payment notification.
    Pending,
    /// A payment notification arrived within the order timeout.
    Completed,
    /// The order timed out. A late payment may still have been recorded against it in the ledger.
    Expired,
    /// The order could not be set up. Payments are never credited to failed orders.
    Failed,
}

impl OrderStatusType {
    /// Every status except `Pending` is terminal. No transitions out of a terminal status are permitted.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Pending)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Completed => write!(f, "COMPLETED"),
            OrderStatusType::Expired => write!(f, "EXPIRED"),
            OrderStatusType::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "EXPIRED" => Ok(Self::Expired),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        OrderId        ---------------------------------------------------------
/// The public identifier of an order. Generated orders always use a 10-digit numeric string, which is what the
/// customer sees in the UPI transaction note and what the notification parser looks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub amount: Paise,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    pub receiver_upi_id: String,
    pub status: OrderStatusType,
    pub metadata: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub pending_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// The 10-digit public order id
    pub order_id: OrderId,
    /// The order amount, in paise. Must be strictly positive.
    pub amount: Paise,
    pub customer_name: Option<String>,
    pub customer_mobile: Option<String>,
    /// The UPI id (VPA) that receives the payment
    pub receiver_upi_id: String,
    /// Free-form merchant data attached to the order
    pub metadata: Option<Value>,
    /// The order clock starts here. Late-payment decisions are measured from this timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, amount: Paise, receiver_upi_id: String) -> Self {
        Self {
            order_id,
            amount,
            customer_name: None,
            customer_mobile: None,
            receiver_upi_id,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_customer_name<S: Into<String>>(mut self, name: S) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_customer_mobile<S: Into<String>>(mut self, mobile: S) -> Self {
        self.customer_mobile = Some(mobile.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------      Transaction      ---------------------------------------------------------
/// A matched payment. There is at most one transaction per order. The ledger, rather than the order status, is the
/// authority on whether an order was ever paid.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub order_id: OrderId,
    pub payer_name: String,
    pub raw_payload: Json<Value>,
    pub is_late_payment: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub order_id: OrderId,
    pub payer_name: String,
    pub raw_payload: Value,
    pub is_late_payment: bool,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(order_id: OrderId, payer_name: String, raw_payload: Value) -> Self {
        Self { order_id, payer_name, raw_payload, is_late_payment: false, created_at: Utc::now() }
    }

    pub fn late(mut self, is_late: bool) -> Self {
        self.is_late_payment = is_late;
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//-----------------------------------   UnmappedNotification   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmappedNotification {
    pub id: i64,
    pub raw_payload: Json<Value>,
    pub reason: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUnmappedNotification {
    pub raw_payload: Value,
    pub reason: String,
    pub received_at: DateTime<Utc>,
}

impl NewUnmappedNotification {
    pub fn new<S: Display>(raw_payload: Value, reason: S) -> Self {
        Self { raw_payload, reason: reason.to_string(), received_at: Utc::now() }
    }

    pub fn at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = received_at;
        self
    }
}

//--------------------------------------       Settings        ---------------------------------------------------------
/// The merchant settings. There is exactly one settings record in the store.
#[derive(Debug, Clone, FromRow)]
pub struct Settings {
    #[sqlx(try_from = "String")]
    pub static_api_key: Secret<String>,
    #[sqlx(try_from = "String")]
    pub listener_token: Secret<String>,
    pub allowed_domains: Json<Vec<String>>,
    pub merchant_upi_id: String,
    pub merchant_name: String,
    pub order_timeout_secs: i64,
    pub updated_at: DateTime<Utc>,
}

impl Settings {
    pub fn order_timeout(&self) -> Duration {
        Duration::seconds(self.order_timeout_secs)
    }

    pub fn is_domain_allowed(&self, origin: &str) -> bool {
        self.allowed_domains.iter().any(|d| d == origin)
    }
}

/// Values used to seed the settings record the first time the gateway starts.
#[derive(Debug, Clone)]
pub struct NewSettings {
    pub static_api_key: Secret<String>,
    pub listener_token: Secret<String>,
    pub allowed_domains: Vec<String>,
    pub merchant_upi_id: String,
    pub merchant_name: String,
    pub order_timeout: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub merchant_upi_id: Option<String>,
    pub merchant_name: Option<String>,
    pub order_timeout_secs: Option<i64>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.merchant_upi_id.is_none() && self.merchant_name.is_none() && self.order_timeout_secs.is_none()
    }
}

//--------------------------------------    DashboardStats     ---------------------------------------------------------
/// Aggregate figures for the merchant dashboard.
///
/// `total_revenue` sums the amount of every order that has a ledger entry, on time or late. `completed_orders` only
/// counts orders in `COMPLETED` status, so late payments show up in revenue and in `late_payments`, but not as
/// completed orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: Paise,
    pub active_orders: i64,
    pub completed_orders: i64,
    pub late_payments: i64,
    pub total_orders: i64,
}
