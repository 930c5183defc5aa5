use hoops_core::{AppError, RecordKind};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::DatabaseConfig;
use crate::repository::SalaryRepository;

/// Central database facade. Owns the connection pool, runs migrations
/// and vends repository instances.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Remove every stored row of `kind` and restart its id sequence.
    pub async fn reset(&self, kind: RecordKind) -> Result<u64, AppError> {
        let repo = self.salary_repo(kind);
        let removed = repo.count().await?;
        repo.truncate().await?;
        tracing::info!(table = kind.table_name(), removed, "Table reset");
        Ok(removed as u64)
    }

    /// Get a [`SalaryRepository`] for the table of `kind`.
    pub fn salary_repo(&self, kind: RecordKind) -> SalaryRepository {
        SalaryRepository::new(self.pool.clone(), kind)
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
