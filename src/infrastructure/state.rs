//! Application state shared across handlers

use sea_orm::DatabaseConnection;

use super::transaction::TransactionRunner;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Runs handler work inside a transaction
    pub runner: TransactionRunner<DatabaseConnection>,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            runner: TransactionRunner::new(db.clone()),
            db,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
