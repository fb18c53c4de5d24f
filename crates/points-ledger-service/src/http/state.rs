//! 应用状态

use engagement_shared::database::Database;

use crate::service::LedgerServices;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub services: LedgerServices,
}

impl AppState {
    pub fn new(db: Database, services: LedgerServices) -> Self {
        Self { db, services }
    }
}
