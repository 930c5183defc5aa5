use chrono::{DateTime, Utc};
use hoops_core::error::AppError;
use hoops_core::models::{RecordKind, SalaryRecord, StoredSalary};
use hoops_core::traits::RecordStore;
use sqlx::{PgPool, Pool, Postgres};

/// Repository for one salary table in PostgreSQL.
///
/// The table is chosen by [`RecordKind`]; both tables share the same columns.
#[derive(Clone)]
pub struct SalaryRepository {
    pool: Pool<Postgres>,
    kind: RecordKind,
}

impl SalaryRepository {
    pub fn new(pool: PgPool, kind: RecordKind) -> Self {
        Self { pool, kind }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Insert one record as a new row. Returns the generated id.
    pub async fn insert(&self, record: &SalaryRecord) -> Result<i32, AppError> {
        let [s2025, s2026, s2027, s2028, s2029] = record.amounts();
        let sql = format!(
            r#"
            INSERT INTO {} (name, salary2025, salary2026, salary2027, salary2028, salary2029)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
            self.kind.table_name()
        );

        let row: (i32,) = sqlx::query_as(&sql)
            .bind(record.name())
            .bind(s2025)
            .bind(s2026)
            .bind(s2027)
            .bind(s2028)
            .bind(s2029)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.0)
    }

    /// Stored rows in insertion order, up to `limit`.
    pub async fn list(&self, limit: usize) -> Result<Vec<StoredSalary>, AppError> {
        let sql = format!(
            r#"
            SELECT id, name, salary2025, salary2026, salary2027, salary2028, salary2029, created_at
            FROM {}
            ORDER BY id
            LIMIT $1
            "#,
            self.kind.table_name()
        );

        let rows = sqlx::query_as::<_, SalaryRow>(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every row stored under `name`, oldest first. Duplicates are expected.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<StoredSalary>, AppError> {
        let sql = format!(
            r#"
            SELECT id, name, salary2025, salary2026, salary2027, salary2028, salary2029, created_at
            FROM {}
            WHERE name = $1
            ORDER BY id
            "#,
            self.kind.table_name()
        );

        let rows = sqlx::query_as::<_, SalaryRow>(&sql)
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.kind.table_name());
        let row: (i64,) = sqlx::query_as(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(row.0)
    }

    /// Delete all rows and restart the id sequence.
    pub async fn truncate(&self) -> Result<(), AppError> {
        let sql = format!(
            "TRUNCATE TABLE {} RESTART IDENTITY",
            self.kind.table_name()
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct SalaryRow {
    id: i32,
    name: String,
    salary2025: Option<String>,
    salary2026: Option<String>,
    salary2027: Option<String>,
    salary2028: Option<String>,
    salary2029: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SalaryRow> for StoredSalary {
    fn from(row: SalaryRow) -> Self {
        StoredSalary {
            id: row.id,
            name: row.name,
            amounts: [
                row.salary2025,
                row.salary2026,
                row.salary2027,
                row.salary2028,
                row.salary2029,
            ],
            created_at: row.created_at,
        }
    }
}

// -- Trait implementation --

impl RecordStore for SalaryRepository {
    async fn persist(&self, record: &SalaryRecord) -> Result<(), AppError> {
        let id = self.insert(record).await?;
        tracing::trace!(table = self.kind.table_name(), id, name = %record.name(), "Inserted");
        Ok(())
    }
}
