use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, QueryBuilder, SqliteConnection};

use super::map_unique_violation;
use crate::{
    db_types::{DashboardStats, NewOrder, Order, OrderId, OrderStatusType},
    order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// The order starts in `PENDING` status. A clash on `order_id` is reported as
/// [`PaymentGatewayError::OrderAlreadyExists`].
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let order_id = order.order_id.clone();
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                amount,
                customer_name,
                customer_mobile,
                receiver_upi_id,
                status,
                metadata,
                created_at,
                pending_at
            ) VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $7, $7)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.amount)
    .bind(order.customer_name)
    .bind(order.customer_mobile)
    .bind(order.receiver_upi_id)
    .bind(order.metadata.map(Json))
    .bind(order.created_at)
    .fetch_all(conn)
    .await;
    let order: Order = result
        .map_err(|e| map_unique_violation(e, || PaymentGatewayError::OrderAlreadyExists(order_id.clone())))?
        .pop()
        .ok_or_else(|| PaymentGatewayError::DatabaseError(format!("Insert of order {order_id} returned no row")))?;
    debug!("🗃️ Order {} inserted with id {}", order.order_id, order.id);
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_all(conn).await?.pop();
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered newest first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id.0);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        // Status values come from the enum, so they are safe to inline
        let status_clause = statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(mobile) = query.customer_mobile {
        where_clause.push("customer_mobile = ");
        where_clause.push_bind_unseparated(mobile);
    }
    builder.push(" ORDER BY id DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Conditionally moves a `PENDING` order into `status`, stamping the timestamp column that belongs to the new status.
///
/// Returns `None` if the order does not exist or is no longer `PENDING`.
pub(crate) async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentGatewayError> {
    let order: Option<Order> = match status {
        OrderStatusType::Completed => {
            sqlx::query_as(
                "UPDATE orders SET status = 'COMPLETED', completed_at = $1 WHERE order_id = $2 AND status = 'PENDING' \
                 RETURNING *",
            )
            .bind(at)
            .bind(order_id.as_str())
            .fetch_all(conn)
            .await?
            .pop()
        },
        OrderStatusType::Expired => {
            sqlx::query_as(
                "UPDATE orders SET status = 'EXPIRED', expired_at = $1 WHERE order_id = $2 AND status = 'PENDING' \
                 RETURNING *",
            )
            .bind(at)
            .bind(order_id.as_str())
            .fetch_all(conn)
            .await?
            .pop()
        },
        OrderStatusType::Failed => {
            sqlx::query_as("UPDATE orders SET status = 'FAILED' WHERE order_id = $1 AND status = 'PENDING' RETURNING *")
                .bind(order_id.as_str())
                .fetch_all(conn)
                .await?
                .pop()
        },
        OrderStatusType::Pending => return Err(PaymentGatewayError::IllegalStatusTransition(status)),
    };
    match &order {
        Some(o) => debug!("🗃️ Order {order_id} moved to {}", o.status),
        None => debug!("🗃️ Order {order_id} is not pending. Status change to {status} skipped"),
    }
    Ok(order)
}

/// The conditional update used when recording a payment.
///
/// For `COMPLETED`, this is identical to [`update_order_status`]. For `EXPIRED`, it additionally matches an order that
/// was already swept into `EXPIRED` and has no ledger entry yet. Such an order keeps its original `expired_at`.
pub(crate) async fn claim_order_for_payment(
    order_id: &OrderId,
    status: OrderStatusType,
    at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentGatewayError> {
    match status {
        OrderStatusType::Completed => update_order_status(order_id, status, at, conn).await,
        OrderStatusType::Expired => {
            let order = sqlx::query_as(
                r#"
                UPDATE orders SET status = 'EXPIRED', expired_at = COALESCE(expired_at, $1)
                WHERE order_id = $2 AND (
                    status = 'PENDING' OR (
                        status = 'EXPIRED' AND
                        NOT EXISTS (SELECT 1 FROM transactions t WHERE t.order_id = orders.order_id)
                    )
                )
                RETURNING *
                "#,
            )
            .bind(at)
            .bind(order_id.as_str())
            .fetch_all(conn)
            .await?
            .pop();
            Ok(order)
        },
        s => Err(PaymentGatewayError::IllegalStatusTransition(s)),
    }
}

/// All orders still in `PENDING` status, oldest first.
pub async fn fetch_pending_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE status = 'PENDING' ORDER BY id ASC").fetch_all(conn).await?;
    Ok(orders)
}

/// Revenue counts every order with a ledger entry, whether it was paid on time or late.
pub async fn dashboard_stats(conn: &mut SqliteConnection) -> Result<DashboardStats, sqlx::Error> {
    let stats = sqlx::query_as(
        r#"
        SELECT
            COALESCE((SELECT SUM(o.amount) FROM orders o JOIN transactions t ON t.order_id = o.order_id), 0)
                AS total_revenue,
            (SELECT COUNT(*) FROM orders WHERE status = 'PENDING') AS active_orders,
            (SELECT COUNT(*) FROM orders WHERE status = 'COMPLETED') AS completed_orders,
            (SELECT COUNT(*) FROM transactions WHERE is_late_payment) AS late_payments,
            (SELECT COUNT(*) FROM orders) AS total_orders
        "#,
    )
    .fetch_all(conn)
    .await?
    .pop()
    .unwrap_or_default();
    Ok(stats)
}
