use chrono::Utc;
use log::debug;
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewSettings, Settings, SettingsUpdate},
    traits::PaymentGatewayError,
};

pub async fn fetch_settings(conn: &mut SqliteConnection) -> Result<Option<Settings>, sqlx::Error> {
    let settings = sqlx::query_as("SELECT * FROM settings WHERE id = 1").fetch_all(conn).await?.pop();
    Ok(settings)
}

/// Inserts the settings record. Does nothing if it already exists.
pub async fn insert_settings_if_missing(
    settings: NewSettings,
    conn: &mut SqliteConnection,
) -> Result<bool, PaymentGatewayError> {
    let result = sqlx::query(
        r#"
            INSERT INTO settings (
                id,
                static_api_key,
                listener_token,
                allowed_domains,
                merchant_upi_id,
                merchant_name,
                order_timeout_secs,
                updated_at
            ) VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(settings.static_api_key.reveal().clone())
    .bind(settings.listener_token.reveal().clone())
    .bind(Json(settings.allowed_domains))
    .bind(settings.merchant_upi_id)
    .bind(settings.merchant_name)
    .bind(settings.order_timeout.num_seconds())
    .bind(Utc::now())
    .execute(conn)
    .await?;
    let inserted = result.rows_affected() > 0;
    if inserted {
        debug!("🗃️ Merchant settings initialised");
    }
    Ok(inserted)
}

pub async fn update_settings(
    update: SettingsUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Settings>, PaymentGatewayError> {
    let mut builder = QueryBuilder::new("UPDATE settings SET updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(upi_id) = update.merchant_upi_id {
        builder.push(", merchant_upi_id = ");
        builder.push_bind(upi_id);
    }
    if let Some(name) = update.merchant_name {
        builder.push(", merchant_name = ");
        builder.push_bind(name);
    }
    if let Some(timeout) = update.order_timeout_secs {
        builder.push(", order_timeout_secs = ");
        builder.push_bind(timeout);
    }
    builder.push(" WHERE id = 1 RETURNING *");
    let settings = builder.build_query_as::<Settings>().fetch_all(conn).await?.pop();
    Ok(settings)
}

pub async fn set_api_key(key: &str, conn: &mut SqliteConnection) -> Result<Option<Settings>, PaymentGatewayError> {
    let settings = sqlx::query_as("UPDATE settings SET static_api_key = $1, updated_at = $2 WHERE id = 1 RETURNING *")
        .bind(key)
        .bind(Utc::now())
        .fetch_all(conn)
        .await?
        .pop();
    Ok(settings)
}

pub async fn set_listener_token(
    token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Settings>, PaymentGatewayError> {
    let settings = sqlx::query_as("UPDATE settings SET listener_token = $1, updated_at = $2 WHERE id = 1 RETURNING *")
        .bind(token)
        .bind(Utc::now())
        .fetch_all(conn)
        .await?
        .pop();
    Ok(settings)
}

pub async fn set_allowed_domains(
    domains: Vec<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Settings>, PaymentGatewayError> {
    let settings = sqlx::query_as("UPDATE settings SET allowed_domains = $1, updated_at = $2 WHERE id = 1 RETURNING *")
        .bind(Json(domains))
        .bind(Utc::now())
        .fetch_all(conn)
        .await?
        .pop();
    Ok(settings)
}
