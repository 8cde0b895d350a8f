use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use serde_json::{json, Value};
use upi_payment_engine::{db_types::OrderStatusType, OrderApi, SettingsApi};

use super::{
    helpers::{bearer, inserted, order, send_request, settings, TEST_API_KEY, TEST_ORIGIN},
    mocks::MockDatabase,
};
use crate::{
    config::ServerOptions,
    routes::{CreateOrderRoute, OrderByIdRoute, OrderQrRoute, OrdersRoute},
};

fn register(cfg: &mut ServiceConfig, mut orders_db: MockDatabase, options: ServerOptions) {
    let mut settings_db = MockDatabase::new();
    settings_db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    orders_db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    cfg.app_data(web::Data::new(SettingsApi::new(settings_db)))
        .app_data(web::Data::new(OrderApi::new(orders_db)))
        .app_data(web::Data::new(options))
        .service(
            web::scope("/api")
                .service(CreateOrderRoute::<MockDatabase>::new())
                .service(OrdersRoute::<MockDatabase>::new())
                .service(OrderByIdRoute::<MockDatabase>::new())
                .service(OrderQrRoute::<MockDatabase>::new()),
        );
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_insert_order().returning(|o| Ok(inserted(o)));
    db.expect_fetch_order_by_order_id().returning(|id| {
        if id.as_str() == "1234567890" {
            Ok(Some(order(id.as_str(), OrderStatusType::Pending, Utc::now())))
        } else {
            Ok(None)
        }
    });
    db.expect_search_orders()
        .withf(|q| q.status == Some(vec![OrderStatusType::Pending]))
        .returning(|_| Ok(vec![order("1234567890", OrderStatusType::Pending, Utc::now())]));
    let options = ServerOptions { public_url: "https://pay.example.com".into(), ..Default::default() };
    register(cfg, db, options);
}

fn configure_require_api_key(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_insert_order().returning(|o| Ok(inserted(o)));
    register(cfg, db, ServerOptions { require_api_key: true, ..Default::default() });
}

fn new_order() -> TestRequest {
    TestRequest::post().uri("/api/orders").set_json(json!({ "amount": 50000, "customerName": "Asha Verma" }))
}

#[actix_web::test]
async fn create_order_with_api_key() {
    let _ = env_logger::try_init().ok();
    let req = new_order().insert_header(bearer(TEST_API_KEY)).insert_header(("Origin", "https://evil.example.com"));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_str(&body).unwrap();
    let order_id = body["orderId"].as_str().unwrap();
    assert_eq!(order_id.len(), 10);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["amount"], 50000);
    assert_eq!(body["qrImageUrl"], format!("https://pay.example.com/api/orders/{order_id}/qr"));
    assert_eq!(body["qrPageUrl"], format!("https://pay.example.com/pay/{order_id}"));
    let uri = body["upiUri"].as_str().unwrap();
    assert!(uri.starts_with("upi://pay?pa=merchant%40upi"), "{uri}");
    assert!(uri.contains(&format!("tr={order_id}")), "{uri}");
}

#[actix_web::test]
async fn create_order_from_allowed_origin() {
    let _ = env_logger::try_init().ok();
    let req = new_order().insert_header(("Origin", TEST_ORIGIN));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[actix_web::test]
async fn create_order_from_foreign_origin() {
    let _ = env_logger::try_init().ok();
    let req = new_order().insert_header(("Origin", "https://evil.example.com"));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Unauthorized: Invalid API key or domain not whitelisted"}"#);
}

#[actix_web::test]
async fn create_order_with_wrong_key() {
    let _ = env_logger::try_init().ok();
    let req = new_order().insert_header(bearer("pk_live_guessed"));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn dashboard_requests_need_a_key_when_required() {
    let _ = env_logger::try_init().ok();
    let (status, _) = send_request(new_order(), configure).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send_request(new_order(), configure_require_api_key).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let req = new_order().insert_header(bearer(TEST_API_KEY));
    let (status, _) = send_request(req, configure_require_api_key).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[actix_web::test]
async fn create_order_rejects_bad_amounts() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/orders").set_json(json!({ "amount": 0 }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("positive"), "{body}");

    let req = TestRequest::post().uri("/api/orders").set_json(json!({ "amount": "lots" }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid request body"}"#);
}

#[actix_web::test]
async fn fetch_order_status() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/api/orders/1234567890"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["orderId"], "1234567890");
    assert_eq!(body["status"], "PENDING");
    let remaining = body["secondsRemaining"].as_i64().unwrap();
    assert!(remaining > 100 && remaining <= 120, "{remaining}");
}

#[actix_web::test]
async fn fetch_unknown_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/api/orders/9999999999"), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Order not found"}"#);
}

#[actix_web::test]
async fn list_orders_by_status() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/api/orders?status=pending"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body.as_array().map(|a| a.len()), Some(1));
    assert_eq!(body[0]["orderId"], "1234567890");

    let (status, _) = send_request(TestRequest::get().uri("/api/orders?status=paid"), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn qr_code_is_svg() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/api/orders/1234567890/qr"), configure).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<svg"), "{body}");
    let (status, _) = send_request(TestRequest::get().uri("/api/orders/9999999999/qr"), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
