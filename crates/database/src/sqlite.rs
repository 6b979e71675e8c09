//! SQLite-backed farm database.
//!
//! Opening the database creates the `Crops` and `Wages` tables when they are
//! missing. Queries arrive as free text from the model, so [`clean_query`]
//! strips the punctuation models tend to wrap them in before execution.

use crate::csv_import::{self, CropRecord, WageRecord};
use async_trait::async_trait;
use fieldhand_core::capability::{QueryOutcome, SqlExecutor, SqlValue};
use fieldhand_core::error::DatabaseError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

const MEMORY_PATH: &str = "sqlite::memory:";

/// Row counts of the two farm tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub crops: i64,
    pub wages: i64,
}

/// The farm's Crops/Wages database.
pub struct FarmDatabase {
    pool: SqlitePool,
}

impl FarmDatabase {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(path: &str, max_connections: u32) -> Result<Self, DatabaseError> {
        let in_memory = path == MEMORY_PATH || path == ":memory:";

        let pool = if in_memory {
            // Every connection to :memory: is a separate database; pin one.
            let options = SqliteConnectOptions::from_str(MEMORY_PATH)
                .map_err(|e| DatabaseError::Storage(format!("Invalid SQLite path: {e}")))?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await
        }
        .map_err(|e| DatabaseError::Storage(format!("Failed to open SQLite: {e}")))?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!("Farm database ready at {path}");
        Ok(db)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, DatabaseError> {
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS Crops (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                crop_name    TEXT NOT NULL,
                month        TEXT NOT NULL,
                year         INTEGER NOT NULL,
                yield_amount REAL NOT NULL,
                target       REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(format!("Crops table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS Wages (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                employee_name TEXT NOT NULL,
                wage          REAL NOT NULL,
                month         TEXT NOT NULL,
                year          INTEGER NOT NULL,
                time_worked   REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(format!("Wages table: {e}")))?;

        debug!("Farm database migrations complete");
        Ok(())
    }

    /// Insert crop rows in one transaction. Rows with an existing `id` are replaced.
    pub async fn import_crops(&self, records: &[CropRecord]) -> Result<usize, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Storage(e.to_string()))?;

        for r in records {
            sqlx::query(
                "INSERT OR REPLACE INTO Crops (id, crop_name, month, year, yield_amount, target)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(r.id)
            .bind(&r.crop_name)
            .bind(&r.month)
            .bind(r.year)
            .bind(r.yield_amount)
            .bind(r.target)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::Import(format!("Crops insert: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Storage(e.to_string()))?;
        Ok(records.len())
    }

    /// Insert wage rows in one transaction. Rows with an existing `id` are replaced.
    pub async fn import_wages(&self, records: &[WageRecord]) -> Result<usize, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Storage(e.to_string()))?;

        for r in records {
            sqlx::query(
                "INSERT OR REPLACE INTO Wages (id, employee_name, wage, month, year, time_worked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(r.id)
            .bind(&r.employee_name)
            .bind(r.wage)
            .bind(&r.month)
            .bind(r.year)
            .bind(r.time_worked)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::Import(format!("Wages insert: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Storage(e.to_string()))?;
        Ok(records.len())
    }

    /// Load a crops CSV file. Returns the number of rows written.
    pub async fn import_crops_csv(&self, path: &Path) -> Result<usize, DatabaseError> {
        let text = read_csv(path).await?;
        let records = csv_import::parse_crops(&text)?;
        let n = self.import_crops(&records).await?;
        info!(rows = n, file = %path.display(), "Imported crops");
        Ok(n)
    }

    /// Load a wages CSV file. Returns the number of rows written.
    pub async fn import_wages_csv(&self, path: &Path) -> Result<usize, DatabaseError> {
        let text = read_csv(path).await?;
        let records = csv_import::parse_wages(&text)?;
        let n = self.import_wages(&records).await?;
        info!(rows = n, file = %path.display(), "Imported wages");
        Ok(n)
    }

    /// Current number of rows in each table.
    pub async fn row_counts(&self) -> Result<RowCounts, DatabaseError> {
        let crops: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Crops")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        let wages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Wages")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        Ok(RowCounts { crops, wages })
    }
}

async fn read_csv(path: &Path) -> Result<String, DatabaseError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DatabaseError::Import(format!("{}: {e}", path.display())))
}

/// Strip surrounding whitespace and semicolons from model-written SQL, and
/// unwrap it when one quote character encloses the whole query.
pub fn clean_query(query: &str) -> String {
    let mut sql = query.trim().trim_matches(';').trim();
    while let Some(inner) = unwrap_quotes(sql) {
        sql = inner.trim().trim_matches(';').trim();
    }
    sql.to_string()
}

fn unwrap_quotes(sql: &str) -> Option<&str> {
    ['"', '\'', '`'].into_iter().find_map(|quote| {
        let inner = sql.strip_prefix(quote)?.strip_suffix(quote)?;
        // `'a' = 'a'` starts and ends with a quote but is not wrapped.
        (!inner.contains(quote)).then_some(inner)
    })
}

fn returns_rows(sql: &str) -> bool {
    let first = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(first.as_str(), "select" | "with" | "pragma" | "values" | "explain")
}

fn decode_cell(row: &SqliteRow, idx: usize) -> Result<SqlValue, DatabaseError> {
    let type_name = {
        let raw = row
            .try_get_raw(idx)
            .map_err(|e| DatabaseError::QueryFailed(format!("column {idx}: {e}")))?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }
        raw.type_info().name().to_ascii_uppercase()
    };

    let decoded = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => row.try_get::<i64, _>(idx).map(SqlValue::Integer),
        "REAL" | "FLOAT" | "DOUBLE" => row.try_get::<f64, _>(idx).map(SqlValue::Real),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(idx)
            .map(|b| SqlValue::Text(String::from_utf8_lossy(&b).into_owned())),
        _ => row.try_get::<String, _>(idx).map(SqlValue::Text),
    };

    decoded.map_err(|e| DatabaseError::QueryFailed(format!("column {idx} ({type_name}): {e}")))
}

#[async_trait]
impl SqlExecutor for FarmDatabase {
    async fn execute(&self, query: &str) -> Result<QueryOutcome, DatabaseError> {
        let sql = clean_query(query);
        if sql.is_empty() {
            return Err(DatabaseError::QueryFailed("empty query".into()));
        }
        debug!(query = %sql, "Executing farm query");

        if returns_rows(&sql) {
            let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(|e| {
                warn!(error = %e, "Farm query failed");
                DatabaseError::QueryFailed(e.to_string())
            })?;

            let columns = rows
                .first()
                .map(|r| r.columns().iter().map(|c| c.name().to_string()).collect())
                .unwrap_or_default();
            let rows = rows
                .iter()
                .map(|row| (0..row.len()).map(|i| decode_cell(row, i)).collect())
                .collect::<Result<Vec<Vec<SqlValue>>, _>>()?;

            Ok(QueryOutcome::Rows { columns, rows })
        } else {
            let done = sqlx::query(&sql).execute(&self.pool).await.map_err(|e| {
                warn!(error = %e, "Farm statement failed");
                DatabaseError::QueryFailed(e.to_string())
            })?;
            Ok(QueryOutcome::Affected {
                rows_affected: done.rows_affected(),
            })
        }
    }
}
