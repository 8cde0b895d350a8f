use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use thiserror::Error;
use upi_payment_engine::{LedgerApiError, OrderApiError, ReconciliationError, SettingsApiError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("System not initialized")]
    SystemNotInitialized,
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not render the QR code. {0}")]
    QrCodeError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SystemNotInitialized => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::QrCodeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::SettingsNotInitialized => Self::SystemNotInitialized,
            ReconciliationError::PersistenceError(s) => {
                error!("💻️ Notification could not be persisted. {s}");
                Self::BackendError(format!("Could not record the notification. {s}"))
            },
        }
    }
}

impl From<OrderApiError> for ServerError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::InvalidAmount(_) => Self::InvalidRequestBody(e.to_string()),
            OrderApiError::OrderNotFound(_) => Self::NoRecordFound("Order not found".into()),
            OrderApiError::SettingsNotInitialized => Self::SystemNotInitialized,
            OrderApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            OrderApiError::OrderIdExhausted(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<SettingsApiError> for ServerError {
    fn from(e: SettingsApiError) -> Self {
        match e {
            SettingsApiError::InvalidValue(s) => Self::InvalidRequestBody(s),
            SettingsApiError::SettingsNotInitialized => Self::SystemNotInitialized,
            SettingsApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}

impl From<LedgerApiError> for ServerError {
    fn from(e: LedgerApiError) -> Self {
        match e {
            LedgerApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}
