use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::{json, Value};
use upi_payment_engine::{db_types::Json, SettingsApi};

use super::{
    helpers::{send_request, settings, TEST_ORIGIN},
    mocks::MockDatabase,
};
use crate::routes::{
    AddDomainRoute,
    RegenerateApiKeyRoute,
    RegenerateListenerTokenRoute,
    RemoveDomainRoute,
    SettingsRoute,
    UpdateSettingsRoute,
};

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockDatabase::new();
    db.expect_fetch_settings().returning(|| Ok(Some(settings())));
    db.expect_set_listener_token().returning(|token| {
        let mut s = settings();
        s.listener_token = token;
        Ok(s)
    });
    db.expect_set_api_key().returning(|key| {
        let mut s = settings();
        s.static_api_key = key;
        Ok(s)
    });
    db.expect_add_allowed_domain().returning(|domain| {
        let mut s = settings();
        s.allowed_domains = Json(vec![TEST_ORIGIN.to_string(), domain.to_string()]);
        Ok(s)
    });
    db.expect_remove_allowed_domain().returning(|domain| {
        let mut s = settings();
        s.allowed_domains.0.retain(|d| d != domain);
        Ok(s)
    });
    db.expect_update_settings().returning(|update| {
        let mut s = settings();
        if let Some(name) = update.merchant_name {
            s.merchant_name = name;
        }
        if let Some(timeout) = update.order_timeout_secs {
            s.order_timeout_secs = timeout;
        }
        Ok(s)
    });
    cfg.app_data(web::Data::new(SettingsApi::new(db))).service(
        web::scope("/api")
            .service(SettingsRoute::<MockDatabase>::new())
            .service(UpdateSettingsRoute::<MockDatabase>::new())
            .service(RegenerateApiKeyRoute::<MockDatabase>::new())
            .service(RegenerateListenerTokenRoute::<MockDatabase>::new())
            .service(AddDomainRoute::<MockDatabase>::new())
            .service(RemoveDomainRoute::<MockDatabase>::new()),
    );
}

#[actix_web::test]
async fn secrets_are_masked() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/api/settings"), configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["staticApiKey"], "pk_live_0123...4567");
    assert_eq!(body["listenerToken"], "lst_0123...4567");
    assert_eq!(body["allowedDomains"], json!([TEST_ORIGIN]));
    assert_eq!(body["merchantUpiId"], "merchant@upi");
    assert_eq!(body["orderTimeoutSecs"], 120);
}

#[actix_web::test]
async fn regenerate_secrets() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/settings/regenerate-listener-token");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    let token = body["listenerToken"].as_str().unwrap();
    assert!(token.starts_with("lst_") && token.len() == 28, "{token}");

    let req = TestRequest::post().uri("/api/settings/regenerate-api-key");
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    let key = body["staticApiKey"].as_str().unwrap();
    assert!(key.starts_with("pk_live_") && key.len() == 32, "{key}");
}

#[actix_web::test]
async fn update_settings() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::patch().uri("/api/settings").set_json(json!({ "merchantName": " Chai Point ", "orderTimeoutSecs": 300 }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["merchantName"], "Chai Point");
    assert_eq!(body["orderTimeoutSecs"], 300);

    let req = TestRequest::patch().uri("/api/settings").set_json(json!({ "orderTimeoutSecs": 0 }));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::patch().uri("/api/settings").set_json(json!({ "merchantUpiId": "not-a-upi-id" }));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn domains() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/settings/domains").set_json(json!({ "domain": "https://kiosk.example.com/" }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"allowedDomains":["https://shop.example.com","https://kiosk.example.com"]}"#);

    let req = TestRequest::delete().uri("/api/settings/domains").set_json(json!({ "domain": TEST_ORIGIN }));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"allowedDomains":[]}"#);
}

#[actix_web::test]
async fn domain_is_required() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/settings/domains").set_json(json!({}));
    let (status, body) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Domain is required"}"#);

    let req = TestRequest::delete().uri("/api/settings/domains").set_json(json!({ "domain": "  " }));
    let (status, _) = send_request(req, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
