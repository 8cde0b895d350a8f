use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewTransaction, OrderId, Transaction},
    traits::PaymentGatewayError,
};

/// Appends a transaction to the ledger. There can only be one transaction per order; a second insert for the same
/// order fails with a unique violation, which callers embed in a database transaction and roll back.
pub async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, sqlx::Error> {
    let tx: Transaction = sqlx::query_as(
        r#"
            INSERT INTO transactions (order_id, payer_name, raw_payload, is_late_payment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(transaction.order_id)
    .bind(transaction.payer_name)
    .bind(Json(transaction.raw_payload))
    .bind(transaction.is_late_payment)
    .bind(transaction.created_at)
    .fetch_all(conn)
    .await?
    .pop()
    .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Transaction {} recorded for order {} (late: {})", tx.id, tx.order_id, tx.is_late_payment);
    Ok(tx)
}

pub async fn fetch_transactions(conn: &mut SqliteConnection) -> Result<Vec<Transaction>, PaymentGatewayError> {
    let txs = sqlx::query_as("SELECT * FROM transactions ORDER BY id DESC").fetch_all(conn).await?;
    Ok(txs)
}

pub async fn fetch_transaction_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, PaymentGatewayError> {
    let tx = sqlx::query_as("SELECT * FROM transactions WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?
        .pop();
    Ok(tx)
}
