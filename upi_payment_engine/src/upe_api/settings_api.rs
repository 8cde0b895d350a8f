use std::fmt::Debug;

use log::*;
use serde::Serialize;
use upg_common::Secret;

use crate::{
    db_types::{NewSettings, Settings, SettingsUpdate},
    helpers::{mask_secret, new_api_key, new_listener_token},
    traits::SettingsManagement,
    upe_api::errors::SettingsApiError,
};

const API_KEY_VISIBLE_PREFIX: usize = 12;
const LISTENER_TOKEN_VISIBLE_PREFIX: usize = 8;

/// The merchant settings as shown on the dashboard. Secrets are masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub static_api_key: String,
    pub listener_token: String,
    pub allowed_domains: Vec<String>,
    pub merchant_upi_id: String,
    pub merchant_name: String,
    pub order_timeout_secs: i64,
}

impl From<&Settings> for SettingsView {
    fn from(settings: &Settings) -> Self {
        Self {
            static_api_key: mask_secret(settings.static_api_key.reveal(), API_KEY_VISIBLE_PREFIX),
            listener_token: mask_secret(settings.listener_token.reveal(), LISTENER_TOKEN_VISIBLE_PREFIX),
            allowed_domains: settings.allowed_domains.0.clone(),
            merchant_upi_id: settings.merchant_upi_id.clone(),
            merchant_name: settings.merchant_name.clone(),
            order_timeout_secs: settings.order_timeout_secs,
        }
    }
}

/// `SettingsApi` manages the merchant settings record. The authorization layer and the reconciliation engine both
/// read their configuration through it, so an update is visible to the very next request.
pub struct SettingsApi<B> {
    db: B,
}

impl<B> Debug for SettingsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettingsApi")
    }
}

impl<B> SettingsApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> SettingsApi<B>
where B: SettingsManagement
{
    /// Creates the settings record from `defaults` if it does not exist yet, and returns the stored settings.
    /// Existing settings are never overwritten.
    pub async fn initialize(&self, defaults: NewSettings) -> Result<Settings, SettingsApiError> {
        if defaults.order_timeout.num_seconds() <= 0 {
            return Err(SettingsApiError::InvalidValue("The order timeout must be at least one second".into()));
        }
        let settings = self.db.initialize_settings(defaults).await?;
        Ok(settings)
    }

    pub async fn settings(&self) -> Result<Settings, SettingsApiError> {
        self.db.fetch_settings().await?.ok_or(SettingsApiError::SettingsNotInitialized)
    }

    pub async fn settings_view(&self) -> Result<SettingsView, SettingsApiError> {
        let settings = self.settings().await?;
        Ok(SettingsView::from(&settings))
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<SettingsView, SettingsApiError> {
        validate_update(&update)?;
        let update = SettingsUpdate {
            merchant_upi_id: update.merchant_upi_id.map(|s| s.trim().to_string()),
            merchant_name: update.merchant_name.map(|s| s.trim().to_string()),
            order_timeout_secs: update.order_timeout_secs,
        };
        let settings = self.db.update_settings(update).await?;
        info!("🔄️⚙️ Merchant settings updated");
        Ok(SettingsView::from(&settings))
    }

    /// Replaces the static API key. The new key is returned in the clear. This is the only time it is revealed.
    pub async fn regenerate_api_key(&self) -> Result<String, SettingsApiError> {
        let key = new_api_key();
        self.db.set_api_key(Secret::new(key.clone())).await?;
        info!("🔄️⚙️ Static API key regenerated");
        Ok(key)
    }

    /// Replaces the listener token. Listener apps using the old token are rejected from now on.
    pub async fn regenerate_listener_token(&self) -> Result<String, SettingsApiError> {
        let token = new_listener_token();
        self.db.set_listener_token(Secret::new(token.clone())).await?;
        info!("🔄️⚙️ Listener token regenerated");
        Ok(token)
    }

    pub async fn add_allowed_domain(&self, domain: &str) -> Result<Vec<String>, SettingsApiError> {
        let domain = normalize_domain(domain)?;
        let settings = self.db.add_allowed_domain(&domain).await?;
        debug!("🔄️⚙️ {domain} added to the allowed domains");
        Ok(settings.allowed_domains.0)
    }

    pub async fn remove_allowed_domain(&self, domain: &str) -> Result<Vec<String>, SettingsApiError> {
        let domain = normalize_domain(domain)?;
        let settings = self.db.remove_allowed_domain(&domain).await?;
        debug!("🔄️⚙️ {domain} removed from the allowed domains");
        Ok(settings.allowed_domains.0)
    }
}

fn validate_update(update: &SettingsUpdate) -> Result<(), SettingsApiError> {
    if update.is_empty() {
        return Err(SettingsApiError::InvalidValue("No settings were provided".into()));
    }
    if let Some(upi_id) = &update.merchant_upi_id {
        let upi_id = upi_id.trim();
        if upi_id.is_empty() || !upi_id.contains('@') {
            return Err(SettingsApiError::InvalidValue(format!("'{upi_id}' is not a valid UPI id")));
        }
    }
    if update.merchant_name.as_ref().map(|s| s.trim().is_empty()).unwrap_or(false) {
        return Err(SettingsApiError::InvalidValue("The merchant name cannot be empty".into()));
    }
    if update.order_timeout_secs.map(|t| t <= 0).unwrap_or(false) {
        return Err(SettingsApiError::InvalidValue("The order timeout must be at least one second".into()));
    }
    Ok(())
}

/// Origins are compared verbatim with the `Origin` header, which never has a trailing slash.
fn normalize_domain(domain: &str) -> Result<String, SettingsApiError> {
    let domain = domain.trim().trim_end_matches('/');
    if domain.is_empty() {
        return Err(SettingsApiError::InvalidValue("Domain is required".into()));
    }
    Ok(domain.to_string())
}
