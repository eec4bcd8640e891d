//! Transactional execution
//!
//! `TransactionRunner::atomic` runs a unit of work inside a database
//! transaction and resolves it exactly once: commit when the work succeeds,
//! rollback when it fails or panics.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel, RuntimeErr,
    TransactionTrait,
};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::domain::{Error, Kind};

/// Options applied when the transaction is opened. `None` keeps the
/// backend's default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TxOptions {
    pub isolation_level: Option<IsolationLevel>,
    pub access_mode: Option<AccessMode>,
}

impl TxOptions {
    pub fn read_only() -> Self {
        Self {
            isolation_level: None,
            access_mode: Some(AccessMode::ReadOnly),
        }
    }

    pub fn with_isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }
}

/// Something that can open transactions, usually a connection pool.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    type Handle: TransactionHandle;

    async fn begin(&self, options: &TxOptions) -> Result<Self::Handle, DbErr>;
}

/// An open transaction. Both operations consume the handle, so it can
/// never be used again once it is committed or rolled back.
#[async_trait]
pub trait TransactionHandle: Send + Sync + Sized {
    async fn commit(self) -> Result<(), DbErr>;

    async fn rollback(self) -> Result<(), DbErr>;
}

#[async_trait]
impl TransactionSource for DatabaseConnection {
    type Handle = DatabaseTransaction;

    async fn begin(&self, options: &TxOptions) -> Result<DatabaseTransaction, DbErr> {
        self.begin_with_config(options.isolation_level, options.access_mode)
            .await
    }
}

#[async_trait]
impl TransactionHandle for DatabaseTransaction {
    async fn commit(self) -> Result<(), DbErr> {
        DatabaseTransaction::commit(self).await
    }

    async fn rollback(self) -> Result<(), DbErr> {
        DatabaseTransaction::rollback(self).await
    }
}

/// Failure modes of [`TransactionRunner::atomic`].
#[derive(Debug, thiserror::Error)]
pub enum TransactionError<E> {
    /// The transaction could not be opened; the work never ran.
    #[error("begin transaction failure: {0}")]
    Begin(#[source] DbErr),

    /// The work succeeded but the commit did not.
    #[error("transaction commit failed: {0}")]
    Commit(#[source] DbErr),

    /// Rolling back failed. `cause` is the text of the error that triggered
    /// the rollback.
    #[error("transaction rollback failed: {source} (rolling back after: {cause})")]
    Rollback {
        #[source]
        source: DbErr,
        cause: String,
    },

    /// The work panicked; the transaction was rolled back.
    #[error("panic occurred, cause: {0}")]
    Panicked(String),

    /// The work returned an error; the transaction was rolled back.
    #[error(transparent)]
    Operation(E),
}

impl<E> TransactionError<E> {
    pub fn operation(&self) -> Option<&E> {
        match self {
            TransactionError::Operation(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_rollback_failure(&self) -> bool {
        matches!(self, TransactionError::Rollback { .. })
    }
}

impl<E: Into<Error>> From<TransactionError<E>> for Error {
    fn from(err: TransactionError<E>) -> Self {
        let message = match err {
            TransactionError::Operation(e) => return e.into(),
            TransactionError::Begin(e) => format!("begin transaction failure: {}", e),
            TransactionError::Commit(e) => format!("transaction commit failed: {}", e),
            TransactionError::Rollback { source, cause } => {
                format!("transaction rollback failed: {} (rolling back after: {})", source, cause)
            }
            TransactionError::Panicked(cause) => format!("panic occurred, cause: {}", cause),
        };
        Error::new(Kind::Internal, message)
    }
}

/// Runs units of work atomically against a [`TransactionSource`].
#[derive(Debug, Clone)]
pub struct TransactionRunner<S> {
    source: S,
}

impl<S: TransactionSource> TransactionRunner<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Executes `work` inside a transaction.
    ///
    /// - work succeeds: commit, surfacing a commit failure.
    /// - work fails: rollback, returning the work's error.
    /// - work panics: rollback, returning [`TransactionError::Panicked`].
    ///
    /// A failed rollback always wins over the error that triggered it.
    pub async fn atomic<T, E, F>(&self, options: &TxOptions, work: F) -> Result<T, TransactionError<E>>
    where
        F: for<'a> FnOnce(&'a S::Handle) -> BoxFuture<'a, Result<T, E>> + Send,
        T: Send,
        E: std::error::Error + Send + 'static,
    {
        let txn = self.source.begin(options).await.map_err(|e| {
            tracing::error!("begin transaction error: {}", e);
            TransactionError::Begin(e)
        })?;

        // Panics while building the future and while polling it both land here.
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| work(&txn))) {
            Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        match outcome {
            Ok(Ok(value)) => {
                txn.commit().await.map_err(|e| {
                    tracing::error!("transaction commit failed: {}", e);
                    TransactionError::Commit(e)
                })?;
                Ok(value)
            }
            Ok(Err(err)) => Err(roll_back(txn, TransactionError::Operation(err)).await),
            Err(payload) => {
                let cause = panic_message(payload.as_ref());
                Err(roll_back(txn, TransactionError::Panicked(cause)).await)
            }
        }
    }
}

async fn roll_back<H, E>(txn: H, cause: TransactionError<E>) -> TransactionError<E>
where
    H: TransactionHandle,
    E: std::error::Error + 'static,
{
    if let Err(e) = txn.rollback().await {
        tracing::error!("transaction rollback failed: {} (cause: {})", e, cause);
        return TransactionError::Rollback {
            source: e,
            cause: cause.to_string(),
        };
    }

    let benign = match &cause {
        TransactionError::Operation(e) => is_no_rows(e),
        _ => false,
    };
    if !benign {
        tracing::error!("transaction operation failed: {}", cause);
    }

    cause
}

/// True when the error chain contains an empty-result lookup.
///
/// A canonical `NotFound` counts too: `?` turns `DbErr::RecordNotFound` into
/// one before the runner sees it, and the origin is gone by then. Work that
/// reports `NotFound` for other reasons is not logged either.
pub(crate) fn is_no_rows(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(db) = e.downcast_ref::<DbErr>() {
            match db {
                DbErr::RecordNotFound(_) => return true,
                DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::RowNotFound))
                | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::RowNotFound)) => return true,
                _ => {}
            }
        }
        if matches!(e.downcast_ref::<sqlx::Error>(), Some(sqlx::Error::RowNotFound)) {
            return true;
        }
        if crate::domain::is(e, Kind::NotFound) {
            return true;
        }
        current = e.source();
    }
    false
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
