use std::env;

use chrono::Duration;
use log::*;
use upg_common::{parse_boolean_flag, Secret};
use upi_payment_engine::{
    db_types::NewSettings,
    helpers::{new_api_key, new_listener_token},
};

const DEFAULT_UPG_HOST: &str = "0.0.0.0";
const DEFAULT_UPG_PORT: u16 = 5000;
const DEFAULT_ORDER_TIMEOUT: Duration = Duration::seconds(120);
const DEFAULT_MERCHANT_UPI_ID: &str = "merchant@upi";
const DEFAULT_MERCHANT_NAME: &str = "ChargePay Merchant";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Seeds the order timeout in the merchant settings on first start. Afterwards, the stored value wins.
    pub order_timeout: Duration,
    pub merchant_upi_id: String,
    pub merchant_name: String,
    /// Origins that may create orders without an API key. Only used to seed the settings.
    pub allowed_domains: Vec<String>,
    /// If true, order creation always needs a valid API key or a whitelisted origin. Requests that carry neither an
    /// `Origin` nor an `Authorization` header are rejected.
    pub require_api_key: bool,
    /// The externally visible base URL of the server, used to build QR code links.
    pub public_url: String,
    /// How often PENDING orders past their deadline are swept into EXPIRED. `None` disables the sweep, in which case
    /// expiry is only ever evaluated when a notification arrives.
    pub expiry_sweep_interval: Option<std::time::Duration>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_UPG_HOST.to_string(),
            port: DEFAULT_UPG_PORT,
            database_url: String::default(),
            order_timeout: DEFAULT_ORDER_TIMEOUT,
            merchant_upi_id: DEFAULT_MERCHANT_UPI_ID.to_string(),
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            allowed_domains: vec![],
            require_api_key: false,
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            expiry_sweep_interval: None,
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("UPG_HOST").ok().unwrap_or_else(|| DEFAULT_UPG_HOST.into());
        let port = env::var("UPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for UPG_PORT. {e} Using the default, {DEFAULT_UPG_PORT}, instead."
                    );
                    DEFAULT_UPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_UPG_PORT);
        let database_url = env::var("UPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ UPG_DATABASE_URL is not set. Please set it to the URL for the gateway database.");
            String::default()
        });
        let order_timeout = configure_order_timeout();
        let merchant_upi_id = env::var("UPG_MERCHANT_UPI_ID").ok().unwrap_or_else(|| {
            warn!("🪛️ UPG_MERCHANT_UPI_ID is not set. Using the placeholder {DEFAULT_MERCHANT_UPI_ID}.");
            DEFAULT_MERCHANT_UPI_ID.into()
        });
        let merchant_name = env::var("UPG_MERCHANT_NAME").ok().unwrap_or_else(|| DEFAULT_MERCHANT_NAME.into());
        let allowed_domains = env::var("UPG_ALLOWED_DOMAINS").map(|s| parse_domain_list(&s)).unwrap_or_default();
        let require_api_key = parse_boolean_flag(env::var("UPG_REQUIRE_API_KEY").ok(), false);
        let public_url = env::var("UPG_PUBLIC_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .ok()
            .unwrap_or_else(|| {
                info!("🪛️ UPG_PUBLIC_URL is not set. QR code links will point to {DEFAULT_PUBLIC_URL}.");
                DEFAULT_PUBLIC_URL.into()
            });
        let expiry_sweep_interval = configure_sweep_interval();
        let use_x_forwarded_for = parse_boolean_flag(env::var("UPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("UPG_USE_FORWARDED").ok(), false);
        Self {
            host,
            port,
            database_url,
            order_timeout,
            merchant_upi_id,
            merchant_name,
            allowed_domains,
            require_api_key,
            public_url,
            expiry_sweep_interval,
            use_x_forwarded_for,
            use_forwarded,
        }
    }

    /// The values used to create the merchant settings on first start. A fresh API key and listener token are
    /// generated each time, but are only stored if no settings exist yet.
    pub fn default_settings(&self) -> NewSettings {
        NewSettings {
            static_api_key: Secret::new(new_api_key()),
            listener_token: Secret::new(new_listener_token()),
            allowed_domains: self.allowed_domains.clone(),
            merchant_upi_id: self.merchant_upi_id.clone(),
            merchant_name: self.merchant_name.clone(),
            order_timeout: self.order_timeout,
        }
    }

    pub fn server_options(&self) -> ServerOptions {
        ServerOptions {
            require_api_key: self.require_api_key,
            public_url: self.public_url.clone(),
            use_x_forwarded_for: self.use_x_forwarded_for,
            use_forwarded: self.use_forwarded,
        }
    }
}

/// The subset of the configuration that request handlers and middleware need. It is shared as `web::Data`.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub require_api_key: bool,
    pub public_url: String,
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerConfig::default().server_options()
    }
}

fn configure_order_timeout() -> Duration {
    env::var("UPG_ORDER_TIMEOUT")
        .ok()
        .and_then(|s| match s.parse::<i64>() {
            Ok(secs) if secs > 0 => Some(Duration::seconds(secs)),
            _ => {
                error!(
                    "🪛️ Invalid configuration value for UPG_ORDER_TIMEOUT: {s}. Using the default, {}s, instead.",
                    DEFAULT_ORDER_TIMEOUT.num_seconds()
                );
                None
            },
        })
        .unwrap_or(DEFAULT_ORDER_TIMEOUT)
}

fn configure_sweep_interval() -> Option<std::time::Duration> {
    let s = env::var("UPG_EXPIRY_SWEEP_INTERVAL").ok()?;
    match s.parse::<u64>() {
        Ok(0) => {
            info!("🪛️ UPG_EXPIRY_SWEEP_INTERVAL is 0. The expiry sweep is disabled.");
            None
        },
        Ok(secs) => Some(std::time::Duration::from_secs(secs)),
        Err(e) => {
            error!("🪛️ Invalid configuration value for UPG_EXPIRY_SWEEP_INTERVAL: {s}. {e}. The expiry sweep is disabled.");
            None
        },
    }
}

fn parse_domain_list(s: &str) -> Vec<String> {
    s.split(',').map(|d| d.trim().trim_end_matches('/')).filter(|d| !d.is_empty()).map(String::from).collect()
}
