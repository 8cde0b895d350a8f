//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database through the engine APIs,
//! so keep it that way: no blocking I/O in handlers.
use std::str::FromStr;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use qrcode::{render::svg, QrCode};
use serde_json::Value;
use upi_payment_engine::{
    db_types::{OrderId, OrderStatusType, SettingsUpdate},
    order_objects::{CreateOrderRequest, OrderQueryFilter},
    traits::{LedgerManagement, PaymentGatewayDatabase, SettingsManagement},
    LedgerApi,
    OrderApi,
    ReconciliationApi,
    SettingsApi,
};

use crate::{
    config::ServerOptions,
    data_objects::{
        AllowedDomainsResponse,
        ApiKeyResponse,
        CreateOrderResponse,
        DomainRequest,
        ListenerTokenResponse,
        NotificationResponse,
        OrderListQuery,
    },
    errors::ServerError,
    helpers::get_remote_ip,
    middleware::AccessPolicy,
};

const QR_MIN_DIMENSION: u32 = 256;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where access $policy:expr) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AccessControlFactory::<A>::new($policy));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//-------------------------------------------   Notifications  ------------------------------------------------
route!(notification => Post "/notifications" impl PaymentGatewayDatabase where access AccessPolicy::ListenerToken);
/// Route handler for the listener app.
///
/// The body is the raw notification payload, forwarded as-is. The listener token has already been checked by the
/// access control middleware when this handler runs. Every notification that the engine could persist gets a 200,
/// including unmapped and duplicate ones, so that the listener does not retry them. A storage failure gives a 500,
/// and since nothing was committed, the listener may safely deliver the notification again.
pub async fn notification<B: PaymentGatewayDatabase>(
    req: HttpRequest,
    body: web::Json<Value>,
    api: web::Data<ReconciliationApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".into());
    debug!("💻️ Payment notification received from {peer}");
    let outcome = api.reconcile(body.into_inner()).await?;
    info!("💻️ Notification outcome: {outcome:?}");
    Ok(HttpResponse::Ok().json(NotificationResponse::from(outcome)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl PaymentGatewayDatabase where access AccessPolicy::MerchantApi);
pub async fn create_order<B: PaymentGatewayDatabase>(
    body: web::Json<CreateOrderRequest>,
    api: web::Data<OrderApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST create order for {} paise", request.amount);
    let created = api.create_order(request).await?;
    Ok(HttpResponse::Created().json(CreateOrderResponse::new(created, &options.public_url)))
}

route!(orders => Get "/orders" impl PaymentGatewayDatabase);
/// Lists orders, newest first. An optional `status` query parameter restricts the list to that status.
pub async fn orders<B: PaymentGatewayDatabase>(
    query: web::Query<OrderListQuery>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    let mut filter = OrderQueryFilter::default();
    if let Some(status) = query.status {
        let status = OrderStatusType::from_str(&status)
            .map_err(|e| ServerError::InvalidRequestBody(format!("{e}. Use PENDING, COMPLETED, EXPIRED or FAILED")))?;
        filter = filter.with_status(status);
    }
    if let Some(limit) = query.limit.filter(|l| *l > 0) {
        filter = filter.with_limit(limit);
    }
    debug!("💻️ GET orders. {filter}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl PaymentGatewayDatabase);
/// The order status, with its deadline and the number of seconds left to pay.
pub async fn order_by_id<B: PaymentGatewayDatabase>(
    path: web::Path<OrderId>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order {order_id}");
    let status = api.order_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

route!(order_qr => Get "/orders/{order_id}/qr" impl PaymentGatewayDatabase);
/// Renders the order's `upi://pay` URI as an SVG QR code.
pub async fn order_qr<B: PaymentGatewayDatabase>(
    path: web::Path<OrderId>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET QR code for order {order_id}");
    let uri = api.upi_uri(&order_id).await?;
    let code = QrCode::new(uri.as_bytes()).map_err(|e| ServerError::QrCodeError(e.to_string()))?;
    let image = code.render::<svg::Color>().min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION).build();
    Ok(HttpResponse::Ok().content_type("image/svg+xml").body(image))
}

route!(dashboard_stats => Get "/dashboard/stats" impl PaymentGatewayDatabase);
pub async fn dashboard_stats<B: PaymentGatewayDatabase>(
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET dashboard stats");
    let stats = api.dashboard_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

//----------------------------------------------   Ledger  ----------------------------------------------------
route!(transactions => Get "/transactions" impl LedgerManagement);
pub async fn transactions<B: LedgerManagement>(api: web::Data<LedgerApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET transactions");
    let transactions = api.transactions().await?;
    Ok(HttpResponse::Ok().json(transactions))
}

route!(unmapped_notifications => Get "/unmapped-notifications" impl LedgerManagement);
pub async fn unmapped_notifications<B: LedgerManagement>(
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET unmapped notifications");
    let notifications = api.unmapped_notifications().await?;
    Ok(HttpResponse::Ok().json(notifications))
}

//----------------------------------------------   Settings  --------------------------------------------------
route!(settings => Get "/settings" impl SettingsManagement);
/// The merchant settings. The API key and listener token are masked.
pub async fn settings<B: SettingsManagement>(api: web::Data<SettingsApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET settings");
    let view = api.settings_view().await?;
    Ok(HttpResponse::Ok().json(view))
}

route!(update_settings => Patch "/settings" impl SettingsManagement);
pub async fn update_settings<B: SettingsManagement>(
    body: web::Json<SettingsUpdate>,
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PATCH settings");
    let view = api.update_settings(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

route!(regenerate_api_key => Post "/settings/regenerate-api-key" impl SettingsManagement);
/// Issues a new static API key. The response is the only place the full key is ever shown.
pub async fn regenerate_api_key<B: SettingsManagement>(
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ Regenerating the static API key");
    let static_api_key = api.regenerate_api_key().await?;
    Ok(HttpResponse::Ok().json(ApiKeyResponse { static_api_key }))
}

route!(regenerate_listener_token => Post "/settings/regenerate-listener-token" impl SettingsManagement);
/// Issues a new listener token. The listener app must be reconfigured with the new token.
pub async fn regenerate_listener_token<B: SettingsManagement>(
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ Regenerating the listener token");
    let listener_token = api.regenerate_listener_token().await?;
    Ok(HttpResponse::Ok().json(ListenerTokenResponse { listener_token }))
}

route!(add_domain => Post "/settings/domains" impl SettingsManagement);
pub async fn add_domain<B: SettingsManagement>(
    body: web::Json<DomainRequest>,
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let domain = required_domain(body.into_inner())?;
    debug!("💻️ Adding {domain} to the allowed domains");
    let allowed_domains = api.add_allowed_domain(&domain).await?;
    Ok(HttpResponse::Ok().json(AllowedDomainsResponse { allowed_domains }))
}

route!(remove_domain => Delete "/settings/domains" impl SettingsManagement);
pub async fn remove_domain<B: SettingsManagement>(
    body: web::Json<DomainRequest>,
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let domain = required_domain(body.into_inner())?;
    debug!("💻️ Removing {domain} from the allowed domains");
    let allowed_domains = api.remove_allowed_domain(&domain).await?;
    Ok(HttpResponse::Ok().json(AllowedDomainsResponse { allowed_domains }))
}

fn required_domain(req: DomainRequest) -> Result<String, ServerError> {
    req.domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ServerError::InvalidRequestBody("Domain is required".into()))
}
