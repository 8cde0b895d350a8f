use chrono::{DateTime, Duration, TimeZone, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use upi_payment_engine::{
    db_types::{NewOrder, NewSettings, Order, OrderId, Paise},
    OrderManagement,
    PaymentGatewayDatabase,
    SettingsManagement,
    SqliteDatabase,
};

pub const TEST_API_KEY: &str = "pk_live_0123456789abcdef01234567";
pub const TEST_LISTENER_TOKEN: &str = "lst_0123456789abcdef01234567";
pub const TEST_MERCHANT_UPI_ID: &str = "merchant@upi";
pub const TEST_ORDER_TIMEOUT_SECS: i64 = 120;

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/upg_test_store_{}.db", dir.display(), rand::random::<u64>())
}

/// A fixed point in time that tests measure order ages from.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn secs(n: i64) -> Duration {
    Duration::seconds(n)
}

pub fn test_settings() -> NewSettings {
    NewSettings {
        static_api_key: TEST_API_KEY.to_string().into(),
        listener_token: TEST_LISTENER_TOKEN.to_string().into(),
        allowed_domains: vec!["https://shop.example.com".to_string()],
        merchant_upi_id: TEST_MERCHANT_UPI_ID.to_string(),
        merchant_name: "ChargePay Merchant".to_string(),
        order_timeout: Duration::seconds(TEST_ORDER_TIMEOUT_SECS),
    }
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("🚀️ Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    debug!("🚀️ Created Sqlite database {url}");
}

/// Creates a throwaway database with the schema and the test merchant settings in place.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    create_database(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    db.initialize_settings(test_settings()).await.expect("Error initialising settings");
    debug!("🚀️ Test environment ready at {url}");
    db
}

/// A second handle on the same database file, with its own single-connection pool. Anything it reads was committed
/// by the original handle, not merely written on one of its connections.
pub async fn second_handle(db: &SqliteDatabase) -> SqliteDatabase {
    SqliteDatabase::new_with_url(db.url(), 1).await.expect("Error opening second connection pool")
}

pub async fn close_handle(mut db: SqliteDatabase) {
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Failed to drop database {url}: {e}");
    }
}

pub async fn insert_order_at(db: &SqliteDatabase, order_id: &str, paise: i64, created_at: DateTime<Utc>) -> Order {
    let order = NewOrder::new(OrderId::from(order_id), Paise::from(paise), TEST_MERCHANT_UPI_ID.into())
        .with_customer_name("Asha Verma")
        .with_created_at(created_at);
    db.insert_order(order).await.expect("Error inserting order")
}

pub fn notification(title: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "android.title": title,
        "android.text": text,
    })
}
