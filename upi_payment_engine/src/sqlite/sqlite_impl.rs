//! `SqliteDatabase` is a concrete implementation of a UPI payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};
use upg_common::Secret;

use super::db::{db_url, new_pool, orders, settings, transactions, unmapped};
use crate::{
    db_types::{
        DashboardStats,
        NewOrder,
        NewSettings,
        NewTransaction,
        NewUnmappedNotification,
        Order,
        OrderId,
        OrderStatusType,
        Settings,
        SettingsUpdate,
        Transaction,
        UnmappedNotification,
    },
    order_objects::OrderQueryFilter,
    traits::{
        ExpiryResult,
        LedgerManagement,
        OrderManagement,
        PaymentClaim,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SettingsManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `UPG_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), PaymentGatewayError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PaymentGatewayError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn require_settings(settings: Option<Settings>) -> Result<Settings, PaymentGatewayError> {
        settings.ok_or(PaymentGatewayError::SettingsNotInitialized)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order_by_order_id(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(query, &mut conn).await?;
        Ok(result)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        at: DateTime<Utc>,
    ) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, status, at, &mut conn).await
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let stats = orders::dashboard_stats(&mut conn).await?;
        Ok(stats)
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn fetch_transactions(&self) -> Result<Vec<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transactions(&mut conn).await
    }

    async fn fetch_transaction_for_order(&self, order_id: &OrderId) -> Result<Option<Transaction>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        transactions::fetch_transaction_for_order(order_id, &mut conn).await
    }

    async fn fetch_unmapped_notifications(&self) -> Result<Vec<UnmappedNotification>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        unmapped::fetch_unmapped_notifications(&mut conn).await
    }
}

impl SettingsManagement for SqliteDatabase {
    async fn fetch_settings(&self) -> Result<Option<Settings>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let settings = settings::fetch_settings(&mut conn).await?;
        Ok(settings)
    }

    async fn initialize_settings(&self, defaults: NewSettings) -> Result<Settings, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if settings::insert_settings_if_missing(defaults, &mut tx).await? {
            info!("🗃️ Merchant settings created with default values");
        }
        let result = settings::fetch_settings(&mut tx).await?;
        tx.commit().await?;
        Self::require_settings(result)
    }

    async fn update_settings(&self, update: SettingsUpdate) -> Result<Settings, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = settings::update_settings(update, &mut conn).await?;
        Self::require_settings(result)
    }

    async fn set_api_key(&self, key: Secret<String>) -> Result<Settings, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = settings::set_api_key(key.reveal(), &mut conn).await?;
        Self::require_settings(result)
    }

    async fn set_listener_token(&self, token: Secret<String>) -> Result<Settings, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = settings::set_listener_token(token.reveal(), &mut conn).await?;
        Self::require_settings(result)
    }

    async fn add_allowed_domain(&self, domain: &str) -> Result<Settings, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // Take the write lock before reading the domain list
        sqlx::query("UPDATE settings SET updated_at = updated_at WHERE id = 1").execute(&mut *tx).await?;
        let current = Self::require_settings(settings::fetch_settings(&mut tx).await?)?;
        if current.is_domain_allowed(domain) {
            tx.commit().await?;
            return Ok(current);
        }
        let mut domains = current.allowed_domains.0;
        domains.push(domain.to_string());
        let result = settings::set_allowed_domains(domains, &mut tx).await?;
        tx.commit().await?;
        Self::require_settings(result)
    }

    async fn remove_allowed_domain(&self, domain: &str) -> Result<Settings, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE settings SET updated_at = updated_at WHERE id = 1").execute(&mut *tx).await?;
        let current = Self::require_settings(settings::fetch_settings(&mut tx).await?)?;
        let domains = current.allowed_domains.0.into_iter().filter(|d| d != domain).collect();
        let result = settings::set_allowed_domains(domains, &mut tx).await?;
        tx.commit().await?;
        Self::require_settings(result)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    async fn claim_order_payment(
        &self,
        new_status: OrderStatusType,
        transaction: NewTransaction,
    ) -> Result<PaymentClaim, PaymentGatewayError> {
        let order_id = transaction.order_id.clone();
        let at = transaction.created_at;
        // The conditional update goes first. It takes the write lock, so concurrent claims for the same order queue up
        // behind it and then see the terminal status.
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::claim_order_for_payment(&order_id, new_status, at, &mut tx).await? else {
            debug!("🗃️ Order {order_id} has already been claimed. Rolling back.");
            tx.rollback().await?;
            return Ok(PaymentClaim::AlreadyClaimed);
        };
        let transaction = match transactions::insert_transaction(transaction, &mut tx).await {
            Ok(t) => t,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("🗃️ A transaction for order {order_id} already exists. Rolling back.");
                tx.rollback().await?;
                return Ok(PaymentClaim::AlreadyClaimed);
            },
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            },
        };
        tx.commit().await?;
        debug!("🗃️ Payment for order {order_id} committed. Order is now {}", order.status);
        Ok(PaymentClaim::Claimed { order, transaction })
    }

    async fn record_unmapped_notification(
        &self,
        notification: NewUnmappedNotification,
    ) -> Result<UnmappedNotification, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        unmapped::insert_unmapped_notification(notification, &mut conn).await
    }

    async fn expire_pending_orders(
        &self,
        created_before: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<ExpiryResult, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let stale = orders::fetch_pending_orders(&mut conn)
            .await?
            .into_iter()
            .filter(|o| o.created_at < created_before)
            .collect::<Vec<Order>>();
        trace!("🗃️ {} pending orders are past their deadline", stale.len());
        let mut expired = Vec::with_capacity(stale.len());
        for order in stale {
            let updated = orders::update_order_status(&order.order_id, OrderStatusType::Expired, at, &mut conn).await?;
            if let Some(o) = updated {
                expired.push(o);
            }
        }
        Ok(ExpiryResult::new(expired))
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}
