use thiserror::Error;

use crate::{db_types::OrderId, traits::PaymentGatewayError};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    /// A storage failure. Nothing was committed, so the notification can safely be delivered again.
    #[error("Could not persist the notification outcome. {0}")]
    PersistenceError(String),
    #[error("The merchant settings have not been initialised")]
    SettingsNotInitialized,
}

impl From<PaymentGatewayError> for ReconciliationError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::SettingsNotInitialized => Self::SettingsNotInitialized,
            e => Self::PersistenceError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order amount must be a positive number of paise. Got {0}")]
    InvalidAmount(i64),
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error("Could not allocate a unique order id after {0} attempts")]
    OrderIdExhausted(usize),
    #[error("The merchant settings have not been initialised")]
    SettingsNotInitialized,
}

impl From<PaymentGatewayError> for OrderApiError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::SettingsNotInitialized => Self::SettingsNotInitialized,
            PaymentGatewayError::OrderNotFound(id) => Self::OrderNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SettingsApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The merchant settings have not been initialised")]
    SettingsNotInitialized,
    #[error("Invalid settings value. {0}")]
    InvalidValue(String),
}

impl From<PaymentGatewayError> for SettingsApiError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::SettingsNotInitialized => Self::SettingsNotInitialized,
            PaymentGatewayError::InvalidSettings(s) => Self::InvalidValue(s),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum LedgerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PaymentGatewayError> for LedgerApiError {
    fn from(e: PaymentGatewayError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
