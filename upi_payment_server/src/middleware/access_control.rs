//! Access control middleware for the UPI payment server.
//!
//! This middleware can be placed on any route. It loads the current merchant settings on every request, so a
//! regenerated key or token takes effect immediately, and checks the request headers against the route's
//! [`AccessPolicy`]:
//! * [`AccessPolicy::ListenerToken`]: the listener app must present `Authorization: Bearer <listener token>`.
//! * [`AccessPolicy::MerchantApi`]: see [`merchant_access_allowed`].
//!
//! Rejected requests get a 403 and never reach the handler. If the settings have not been created yet, the request
//! fails with a 500.

use std::{
    future::{ready, Ready},
    marker::PhantomData,
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use upi_payment_engine::{traits::SettingsManagement, SettingsApi};

use crate::{
    config::ServerOptions,
    errors::ServerError,
    helpers::{listener_access_allowed, merchant_access_allowed},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    ListenerToken,
    MerchantApi,
}

impl AccessPolicy {
    fn denial_reason(&self) -> &'static str {
        match self {
            AccessPolicy::ListenerToken => "Invalid listener token",
            AccessPolicy::MerchantApi => "Invalid API key or domain not whitelisted",
        }
    }
}

pub struct AccessControlFactory<A> {
    policy: AccessPolicy,
    _backend: PhantomData<fn() -> A>,
}

impl<A> AccessControlFactory<A> {
    pub fn new(policy: AccessPolicy) -> Self {
        AccessControlFactory { policy, _backend: PhantomData }
    }
}

impl<S, B, A> Transform<S, ServiceRequest> for AccessControlFactory<A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: SettingsManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AccessControlService<S, A>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessControlService { policy: self.policy, service: Rc::new(service), _backend: PhantomData }))
    }
}

pub struct AccessControlService<S, A> {
    policy: AccessPolicy,
    service: Rc<S>,
    _backend: PhantomData<fn() -> A>,
}

impl<S, B, A> Service<ServiceRequest> for AccessControlService<S, A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: SettingsManagement + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let policy = self.policy;
        Box::pin(async move {
            let api = req.app_data::<web::Data<SettingsApi<A>>>().cloned().ok_or_else(|| {
                warn!("💻️ No settings API has been registered with the server. Access control cannot run.");
                ServerError::InitializeError("Settings API is not available".into())
            })?;
            let require_api_key =
                req.app_data::<web::Data<ServerOptions>>().map(|o| o.require_api_key).unwrap_or(false);
            let settings = api.settings().await.map_err(ServerError::from)?;
            let allowed = match policy {
                AccessPolicy::ListenerToken => listener_access_allowed(&settings, req.headers()),
                AccessPolicy::MerchantApi => merchant_access_allowed(&settings, req.headers(), require_api_key),
            };
            if allowed {
                trace!("💻️ {policy:?} check passed for {}", req.path());
                service.call(req).await
            } else {
                warn!("💻️ {policy:?} check failed for {}", req.path());
                Err(ServerError::Unauthorized(policy.denial_reason().into()).into())
            }
        })
    }
}
