//! PostgreSQL-backed access store.
//!
//! Every unit of work runs at `SERIALIZABLE` isolation. Serialization failures
//! surface as conflicts the caller may retry.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use planner_application::{AccessStore, AccessTransaction};
use planner_core::{AppError, AppResult};

mod capabilities;
mod directory;
mod invitations;
mod rows;


const UNIQUE_VIOLATION: &str = "23505";
const SERIALIZATION_FAILURE: &str = "40001";

/// PostgreSQL implementation of the access store port.
#[derive(Clone)]
pub struct PostgresAccessStore {
    pool: PgPool,
}

impl PostgresAccessStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessStore for PostgresAccessStore {
    async fn begin(&self) -> AppResult<Box<dyn AccessTransaction>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start access transaction: {error}"))
        })?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to set transaction isolation: {error}"))
            })?;

        Ok(Box::new(PostgresAccessTransaction { transaction }))
    }
}

/// Serializable unit of work over [`PostgresAccessStore`].
pub struct PostgresAccessTransaction {
    transaction: Transaction<'static, Postgres>,
}

#[async_trait]
impl AccessTransaction for PostgresAccessTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.transaction
            .commit()
            .await
            .map_err(|error| database_error("commit access transaction", error))
    }
}

fn sqlstate(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(database_error) => {
            database_error.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

fn is_serialization_failure(error: &sqlx::Error) -> bool {
    sqlstate(error).as_deref() == Some(SERIALIZATION_FAILURE)
}

/// Maps a sqlx error, keeping unique violations and serialization failures apart.
fn database_error(action: &str, error: sqlx::Error) -> AppError {
    match sqlstate(&error).as_deref() {
        Some(UNIQUE_VIOLATION) => AppError::Conflict(format!("failed to {action}: {error}")),
        Some(SERIALIZATION_FAILURE) => AppError::Conflict(format!(
            "failed to {action}: concurrent update, retry the operation"
        )),
        _ => AppError::Internal(format!("failed to {action}: {error}")),
    }
}
