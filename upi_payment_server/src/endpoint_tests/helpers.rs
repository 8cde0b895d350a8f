use actix_web::{
    body::to_bytes,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;
use upi_payment_engine::db_types::{Json, NewOrder, Order, OrderId, OrderStatusType, Paise, Settings, Transaction};

use crate::server::json_config;

pub const TEST_API_KEY: &str = "pk_live_0123456789abcdef01234567";
pub const TEST_LISTENER_TOKEN: &str = "lst_0123456789abcdef01234567";
pub const TEST_ORIGIN: &str = "https://shop.example.com";

pub fn settings() -> Settings {
    Settings {
        static_api_key: TEST_API_KEY.to_string().into(),
        listener_token: TEST_LISTENER_TOKEN.to_string().into(),
        allowed_domains: Json(vec![TEST_ORIGIN.to_string()]),
        merchant_upi_id: "merchant@upi".into(),
        merchant_name: "ChargePay Merchant".into(),
        order_timeout_secs: 120,
        updated_at: Utc::now(),
    }
}

pub fn order(order_id: &str, status: OrderStatusType, created_at: DateTime<Utc>) -> Order {
    Order {
        id: 1,
        order_id: OrderId::from(order_id),
        amount: Paise::from(50_000),
        customer_name: None,
        customer_mobile: None,
        receiver_upi_id: "merchant@upi".into(),
        status,
        metadata: None,
        created_at,
        pending_at: Some(created_at),
        completed_at: None,
        expired_at: None,
    }
}

/// The row the store would return for a freshly inserted order.
pub fn inserted(order: NewOrder) -> Order {
    Order {
        id: 1,
        order_id: order.order_id,
        amount: order.amount,
        customer_name: order.customer_name,
        customer_mobile: order.customer_mobile,
        receiver_upi_id: order.receiver_upi_id,
        status: OrderStatusType::Pending,
        metadata: order.metadata.map(Json),
        created_at: order.created_at,
        pending_at: Some(order.created_at),
        completed_at: None,
        expired_at: None,
    }
}

pub fn transaction(order_id: &str, payload: Value, is_late_payment: bool) -> Transaction {
    Transaction {
        id: 1,
        order_id: OrderId::from(order_id),
        payer_name: "Asha Verma".into(),
        raw_payload: Json(payload),
        is_late_payment,
        created_at: Utc::now(),
    }
}

/// Sends `req` to an app set up by `configure` and returns the status and body.
///
/// Errors raised by middleware are rendered into a response the same way the server would render them.
pub async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> (StatusCode, String) {
    let app = App::new().app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = to_bytes(res.into_body()).await.map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
