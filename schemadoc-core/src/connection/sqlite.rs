//! SQLite transport.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or a bare `./relative.db` path
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! In-memory databases live inside a single connection, so the pool is
//! capped at one connection for them.

use super::{Connection, MetaRow, classify_sqlx_error, meta_row};
use crate::Result;
use crate::config::ConnectionConfig;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use std::str::FromStr;

const TABLES_SQL: &str = "SELECT name AS TABLE_NAME, NULL AS REMARKS \
     FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
     ORDER BY name";

const COLUMNS_SQL: &str = "SELECT cid + 1 AS ORDINAL_POSITION, name AS COLUMN_NAME, \
     type AS TYPE_NAME, \
     CASE WHEN \"notnull\" = 0 THEN 'YES' ELSE 'NO' END AS IS_NULLABLE, \
     dflt_value AS COLUMN_DEF, NULL AS REMARKS \
     FROM pragma_table_info(?1) ORDER BY cid";

const PRIMARY_KEYS_SQL: &str = "SELECT name AS COLUMN_NAME, pk AS KEY_SEQ \
     FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk";

/// SQLite connection handle.
pub struct SqliteConnection {
    pool: SqlitePool,
    database: String,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl SqliteConnection {
    /// Opens a SQLite database.
    ///
    /// # Errors
    /// Returns error if the connection string is invalid or the database
    /// cannot be opened
    pub async fn connect(connection_string: &str, config: &ConnectionConfig) -> Result<Self> {
        let normalized = normalize_connection_string(connection_string);
        let in_memory = is_in_memory(&normalized);

        let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
            crate::error::SchemaDocError::configuration(format!(
                "Invalid SQLite connection string: {}",
                e
            ))
        })?;
        if config.read_only && !in_memory {
            options = options.read_only(true);
        }

        let max_connections = if in_memory {
            1
        } else {
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| classify_sqlx_error("Failed to open SQLite database", e))?;

        Ok(Self::from_pool(pool, database_name(&normalized)))
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool, database: impl Into<String>) -> Self {
        Self {
            pool,
            database: database.into(),
        }
    }

    async fn fetch(&self, sql: &str, params: &[&str]) -> Result<Vec<MetaRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("SQLite introspection query failed", e))?;

        Ok(rows
            .iter()
            .map(|row| meta_row(row, |row: &SqliteRow, index| decode_cell!(row, index; i64, f64)))
            .collect())
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn signature(&self) -> &str {
        "sqlite"
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| crate::error::SchemaDocError::connection_lost("SQLite ping failed", e))?;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<MetaRow>> {
        self.fetch(sql, params).await
    }

    async fn catalog(&self) -> Result<Option<String>> {
        Ok(Some(self.database.clone()))
    }

    async fn schema(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn tables(&self, _catalog: Option<&str>, _schema: Option<&str>) -> Result<Vec<MetaRow>> {
        self.fetch(TABLES_SQL, &[]).await
    }

    async fn columns(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.fetch(COLUMNS_SQL, &[table]).await
    }

    async fn primary_keys(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.fetch(PRIMARY_KEYS_SQL, &[table]).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Normalizes a bare path or `:memory:` to a `sqlite:` URL.
fn normalize_connection_string(connection_string: &str) -> String {
    let connection_string = connection_string.trim();
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }
    if let Some(rest) = connection_string.strip_prefix("sqlite3:") {
        return format!("sqlite:{}", rest);
    }
    format!("sqlite://{}", connection_string)
}

/// File stem of the database path, `main` for in-memory databases.
fn database_name(connection_string: &str) -> String {
    if is_in_memory(connection_string) {
        return "main".to_string();
    }

    let path = connection_string
        .trim_start_matches("sqlite:")
        .trim_start_matches("//")
        .split('?')
        .next()
        .unwrap_or_default();

    std::path::Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("main")
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_connection_string() {
        assert_eq!(normalize_connection_string(":memory:"), "sqlite::memory:");
        assert_eq!(normalize_connection_string("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_connection_string("./shop.db"), "sqlite://./shop.db");
        assert_eq!(
            normalize_connection_string("sqlite3:///var/lib/shop.sqlite3"),
            "sqlite:///var/lib/shop.sqlite3"
        );
    }

    #[test]
    fn test_database_name() {
        assert_eq!(database_name("sqlite::memory:"), "main");
        assert_eq!(database_name("sqlite:///var/lib/shop.sqlite3"), "shop");
        assert_eq!(database_name("sqlite://./data/orders.db?mode=ro"), "orders");
        assert_eq!(database_name("sqlite://"), "main");
    }

    #[tokio::test]
    async fn test_sqlite_standard_calls() {
        let connection = SqliteConnection::connect(":memory:", &ConnectionConfig::default())
            .await
            .unwrap();
        connection
            .query(
                "CREATE TABLE orders (id INTEGER PRIMARY KEY, total DECIMAL(10,2) NOT NULL, note TEXT DEFAULT 'none')",
                &[],
            )
            .await
            .unwrap();

        connection.ping().await.unwrap();
        assert_eq!(connection.catalog().await.unwrap().as_deref(), Some("main"));

        let tables = connection.tables(None, None).await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].get("table_name"), Some("orders"));
        assert_eq!(tables[0].get("REMARKS"), None);

        let columns = connection.columns(None, None, "orders").await.unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[1].get("COLUMN_NAME"), Some("total"));
        assert_eq!(columns[1].get("TYPE_NAME"), Some("DECIMAL(10,2)"));
        assert_eq!(columns[1].number("ORDINAL_POSITION"), Some(2));
        assert_eq!(columns[1].flag("IS_NULLABLE"), Some(false));
        assert_eq!(columns[2].get("COLUMN_DEF"), Some("'none'"));

        let keys = connection.primary_keys(None, None, "orders").await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].get("COLUMN_NAME"), Some("id"));
        assert_eq!(keys[0].number("KEY_SEQ"), Some(1));

        connection.close().await;
        assert!(connection.ping().await.unwrap_err().is_fatal());
    }
}
