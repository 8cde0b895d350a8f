use upg_common::Secret;

use crate::{
    db_types::{NewSettings, Settings, SettingsUpdate},
    traits::PaymentGatewayError,
};

/// Manages the single merchant settings record.
#[allow(async_fn_in_trait)]
pub trait SettingsManagement {
    /// Returns `None` if the settings have not been initialised yet.
    async fn fetch_settings(&self) -> Result<Option<Settings>, PaymentGatewayError>;

    /// Creates the settings record from `defaults` if it does not exist yet. Existing settings are left untouched and
    /// returned as-is.
    async fn initialize_settings(&self, defaults: NewSettings) -> Result<Settings, PaymentGatewayError>;

    async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, PaymentGatewayError>;

    async fn set_api_key(&self, key: Secret<String>) -> Result<Settings, PaymentGatewayError>;

    async fn set_listener_token(&self, token: Secret<String>) -> Result<Settings, PaymentGatewayError>;

    /// Adds `domain` to the allowed origins. Adding a domain that is already present is a no-op.
    async fn add_allowed_domain(&self, domain: &str) -> Result<Settings, PaymentGatewayError>;

    /// Removes `domain` from the allowed origins. Removing a domain that is not present is a no-op.
    async fn remove_allowed_domain(&self, domain: &str) -> Result<Settings, PaymentGatewayError>;
}
