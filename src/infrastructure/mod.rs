//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Configuration loading (config)
//! - Database connection (db)
//! - Transactional execution (transaction)
//! - HTTP server setup (server)
//! - Application state (state)

pub mod config;
pub mod db;
pub mod server;
pub mod state;
pub mod transaction;

pub use config::Config;
pub use state::AppState;
pub use transaction::{
    TransactionError, TransactionHandle, TransactionRunner, TransactionSource, TxOptions,
};
