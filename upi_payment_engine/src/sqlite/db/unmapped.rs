use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewUnmappedNotification, UnmappedNotification},
    traits::PaymentGatewayError,
};

pub async fn insert_unmapped_notification(
    notification: NewUnmappedNotification,
    conn: &mut SqliteConnection,
) -> Result<UnmappedNotification, PaymentGatewayError> {
    let record: UnmappedNotification = sqlx::query_as(
        r#"
            INSERT INTO unmapped_notifications (raw_payload, reason, received_at)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(Json(notification.raw_payload))
    .bind(notification.reason)
    .bind(notification.received_at)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or_else(|| PaymentGatewayError::DatabaseError("Insert of unmapped notification returned no row".into()))?;
    debug!("🗃️ Unmapped notification {} stored ({})", record.id, record.reason);
    Ok(record)
}

pub async fn fetch_unmapped_notifications(
    conn: &mut SqliteConnection,
) -> Result<Vec<UnmappedNotification>, PaymentGatewayError> {
    let records = sqlx::query_as("SELECT * FROM unmapped_notifications ORDER BY id DESC").fetch_all(conn).await?;
    Ok(records)
}
