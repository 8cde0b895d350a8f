use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use upi_payment_engine::{
    db_types::{Json, OrderStatusType, UnmappedNotification},
    events::EventProducers,
    traits::{PaymentClaim, PaymentGatewayError},
    ReconciliationApi,
    SettingsApi,
};

use super::{
    helpers::{bearer, order, send_request, settings, transaction, TEST_API_KEY, TEST_LISTENER_TOKEN},
    mocks::MockDatabase,
};
use crate::{config::ServerOptions, routes::NotificationRoute};

fn notification() -> TestRequest {
    TestRequest::post().uri("/api/notifications").set_json(json!({
        "android.title": "Asha Verma paid you ₹500.00",
        "android.text": "Payment for order 1234567890",
    }))
}

fn register(cfg: &mut ServiceConfig, mut settings_db: MockDatabase, db: MockDatabase) {
    settings_db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    cfg.app_data(web::Data::new(SettingsApi::new(settings_db)))
        .app_data(web::Data::new(ReconciliationApi::new(db, EventProducers::default())))
        .app_data(web::Data::new(ServerOptions::default()))
        .service(web::scope("/api").service(NotificationRoute::<MockDatabase>::new()));
}

// The reconciliation engine must not run at all. Any call on its backend would panic.
fn configure_untouched(cfg: &mut ServiceConfig) {
    register(cfg, MockDatabase::new(), MockDatabase::new());
}

fn configure_on_time(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_order_id()
        .returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Pending, Utc::now() - Duration::seconds(30)))));
    db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    db.expect_claim_order_payment()
        .withf(|status, tx| *status == OrderStatusType::Completed && !tx.is_late_payment && tx.payer_name == "Asha Verma")
        .times(1)
        .returning(|status, tx| {
            let order = order(tx.order_id.as_str(), status, tx.created_at);
            let transaction = transaction(tx.order_id.as_str(), tx.raw_payload, false);
            Ok(PaymentClaim::Claimed { order, transaction })
        });
    register(cfg, MockDatabase::new(), db);
}

fn configure_late(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_order_id()
        .returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Pending, Utc::now() - Duration::seconds(600)))));
    db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    db.expect_claim_order_payment().withf(|status, tx| *status == OrderStatusType::Expired && tx.is_late_payment).returning(
        |status, tx| {
            let order = order(tx.order_id.as_str(), status, tx.created_at);
            let transaction = transaction(tx.order_id.as_str(), tx.raw_payload, true);
            Ok(PaymentClaim::Claimed { order, transaction })
        },
    );
    register(cfg, MockDatabase::new(), db);
}

fn configure_duplicate(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_order_id()
        .returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Pending, Utc::now()))));
    db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    db.expect_claim_order_payment().times(1).returning(|_, _| Ok(PaymentClaim::AlreadyClaimed));
    db.expect_fetch_transaction_for_order()
        .returning(|id| Ok(Some(transaction(id.as_str(), json!({"android.text": "1234567890"}), false))));
    register(cfg, MockDatabase::new(), db);
}

fn configure_unmapped(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_order_id().returning(|_| Ok(None));
    db.expect_record_unmapped_notification().times(1).returning(|n| {
        Ok(UnmappedNotification { id: 7, raw_payload: Json(n.raw_payload), reason: n.reason, received_at: n.received_at })
    });
    register(cfg, MockDatabase::new(), db);
}

fn configure_storage_failure(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_order_by_order_id()
        .returning(|id| Ok(Some(order(id.as_str(), OrderStatusType::Pending, Utc::now()))));
    db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    db.expect_claim_order_payment()
        .returning(|_, _| Err(PaymentGatewayError::DatabaseError("database is locked".into())));
    register(cfg, MockDatabase::new(), db);
}

fn configure_no_settings(cfg: &mut ServiceConfig) {
    let mut settings_db = MockDatabase::new();
    settings_db.expect_fetch_settings().returning(|| Ok(None));
    cfg.app_data(web::Data::new(SettingsApi::new(settings_db)))
        .app_data(web::Data::new(ReconciliationApi::new(MockDatabase::new(), EventProducers::default())))
        .service(web::scope("/api").service(NotificationRoute::<MockDatabase>::new()));
}

#[actix_web::test]
async fn missing_listener_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(notification(), configure_untouched).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Unauthorized: Invalid listener token"}"#);
}

#[actix_web::test]
async fn api_key_is_not_a_listener_token() {
    let _ = env_logger::try_init().ok();
    let req = notification().insert_header(bearer(TEST_API_KEY));
    let (status, _) = send_request(req, configure_untouched).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn payment_on_time() {
    let _ = env_logger::try_init().ok();
    let req = notification().insert_header(bearer(TEST_LISTENER_TOKEN));
    let (status, body) = send_request(req, configure_on_time).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"completed","message":"Payment processed successfully","orderId":"1234567890"}"#);
}

#[actix_web::test]
async fn late_payment() {
    let _ = env_logger::try_init().ok();
    let req = notification().insert_header(bearer(TEST_LISTENER_TOKEN));
    let (status, body) = send_request(req, configure_late).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "expired");
    assert_eq!(body["message"], "Payment received but order expired");
    assert_eq!(body["orderId"], "1234567890");
}

#[actix_web::test]
async fn duplicate_payment() {
    let _ = env_logger::try_init().ok();
    let req = notification().insert_header(bearer(TEST_LISTENER_TOKEN));
    let (status, body) = send_request(req, configure_duplicate).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"duplicate","message":"Order already completed"}"#);
}

#[actix_web::test]
async fn unknown_order() {
    let _ = env_logger::try_init().ok();
    let req = notification().insert_header(bearer(TEST_LISTENER_TOKEN));
    let (status, body) = send_request(req, configure_unmapped).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"unmapped","message":"Order not found"}"#);
}

#[actix_web::test]
async fn storage_failure_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let req = notification().insert_header(bearer(TEST_LISTENER_TOKEN));
    let (status, body) = send_request(req, configure_storage_failure).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("database is locked"), "{body}");
}

#[actix_web::test]
async fn uninitialized_system() {
    let _ = env_logger::try_init().ok();
    let req = notification().insert_header(bearer(TEST_LISTENER_TOKEN));
    let (status, body) = send_request(req, configure_no_settings).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"System not initialized"}"#);
}

#[actix_web::test]
async fn body_must_be_json() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/notifications")
        .insert_header(bearer(TEST_LISTENER_TOKEN))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("not json");
    let (status, body) = send_request(req, configure_untouched).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid request body"}"#);
}
