use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{
    dev::Server,
    error::JsonPayloadError,
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpRequest,
    HttpServer,
};
use log::*;
use upi_payment_engine::{
    events::{EventHandlers, EventHooks, EventProducers, NotificationUnmappedEvent, PaymentReceivedEvent},
    LedgerApi,
    OrderApi,
    ReconciliationApi,
    SettingsApi,
    SettingsView,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    routes::{
        health,
        AddDomainRoute,
        CreateOrderRoute,
        DashboardStatsRoute,
        NotificationRoute,
        OrderByIdRoute,
        OrderQrRoute,
        OrdersRoute,
        RegenerateApiKeyRoute,
        RegenerateListenerTokenRoute,
        RemoveDomainRoute,
        SettingsRoute,
        TransactionsRoute,
        UnmappedNotificationsRoute,
        UpdateSettingsRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let settings = SettingsApi::new(db.clone()).initialize(config.default_settings()).await?;
    let view = SettingsView::from(&settings);
    info!(
        "🚀️ Payments go to {} ({}). Orders time out after {}s.",
        view.merchant_name, view.merchant_upi_id, view.order_timeout_secs
    );
    info!("🚀️ Listener token {} and API key {} are active", view.listener_token, view.static_api_key);

    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;

    if let Some(interval) = config.expiry_sweep_interval {
        let _handle = start_expiry_worker(db.clone(), interval);
    }
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::BackendError(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let options = config.server_options();
    let srv = HttpServer::new(move || {
        let reconciliation_api = ReconciliationApi::new(db.clone(), producers.clone());
        let orders_api = OrderApi::new(db.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let settings_api = SettingsApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(NotificationRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(OrderQrRoute::<SqliteDatabase>::new())
            .service(DashboardStatsRoute::<SqliteDatabase>::new())
            .service(TransactionsRoute::<SqliteDatabase>::new())
            .service(UnmappedNotificationsRoute::<SqliteDatabase>::new())
            .service(SettingsRoute::<SqliteDatabase>::new())
            .service(UpdateSettingsRoute::<SqliteDatabase>::new())
            .service(RegenerateApiKeyRoute::<SqliteDatabase>::new())
            .service(RegenerateListenerTokenRoute::<SqliteDatabase>::new())
            .service(AddDomainRoute::<SqliteDatabase>::new())
            .service(RemoveDomainRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("upg::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(options.clone()))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(settings_api))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are rejected with a 400 and a JSON error body, like every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        debug!("💻️ Could not read request body. {err}");
        ServerError::InvalidRequestBody("Invalid request body".into()).into()
    })
}

fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_payment_received(|ev: PaymentReceivedEvent| {
            Box::pin(async move {
                if ev.is_late() {
                    warn!(
                        "🪝️ Late payment of {} from {} for order {}",
                        ev.order.amount, ev.transaction.payer_name, ev.order.order_id
                    );
                } else {
                    info!(
                        "🪝️ Payment of {} from {} for order {}",
                        ev.order.amount, ev.transaction.payer_name, ev.order.order_id
                    );
                }
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
        .on_notification_unmapped(|ev: NotificationUnmappedEvent| {
            Box::pin(async move {
                warn!(
                    "🪝️ Notification {} could not be matched to an order: {}",
                    ev.notification.id, ev.notification.reason
                );
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
    hooks
}
