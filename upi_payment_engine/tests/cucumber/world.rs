use cucumber::World;
use upi_payment_engine::{events::EventProducers, ReconciliationApi, ReconciliationOutcome, SqliteDatabase};

use crate::support::prepare_env::prepare_test_env;

#[derive(Default, Debug, World)]
pub struct GatewayWorld {
    pub system: Option<GatewaySystem>,
    pub last_outcome: Option<ReconciliationOutcome>,
}

#[derive(Debug)]
pub struct GatewaySystem {
    pub db: SqliteDatabase,
    pub api: ReconciliationApi<SqliteDatabase>,
}

impl GatewayWorld {
    pub fn system(&self) -> &GatewaySystem {
        self.system.as_ref().expect("Gateway not initialised")
    }

    pub fn db(&self) -> &SqliteDatabase {
        &self.system().db
    }

    pub fn api(&self) -> &ReconciliationApi<SqliteDatabase> {
        &self.system().api
    }
}

impl GatewaySystem {
    pub async fn new() -> Self {
        let db = prepare_test_env().await;
        let api = ReconciliationApi::new(db.clone(), EventProducers::default());
        Self { db, api }
    }
}
