//! MySQL and MariaDB transport.
//!
//! MySQL has no schema level below the database, so the current database is
//! reported as the catalog and the schema is always absent. MariaDB servers
//! are detected from `VERSION()` and report the `mariadb` signature.

use super::{Connection, MetaRow, classify_sqlx_error, meta_row};
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::SchemaDocError;
use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};

const TABLES_SQL: &str = "SELECT TABLE_NAME, TABLE_COMMENT AS REMARKS \
     FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_TYPE = 'BASE TABLE' \
     ORDER BY TABLE_NAME";

const COLUMNS_SQL: &str = "SELECT COLUMN_NAME, \
     CAST(ORDINAL_POSITION AS CHAR) AS ORDINAL_POSITION, \
     DATA_TYPE AS TYPE_NAME, \
     CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION) AS CHAR) AS COLUMN_SIZE, \
     CAST(NUMERIC_SCALE AS CHAR) AS DECIMAL_DIGITS, \
     IS_NULLABLE, COLUMN_DEFAULT AS COLUMN_DEF, COLUMN_COMMENT AS REMARKS \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
     ORDER BY ORDINAL_POSITION";

const PRIMARY_KEYS_SQL: &str = "SELECT COLUMN_NAME, CAST(ORDINAL_POSITION AS CHAR) AS KEY_SEQ \
     FROM information_schema.KEY_COLUMN_USAGE \
     WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
       AND CONSTRAINT_NAME = 'PRIMARY' \
     ORDER BY ORDINAL_POSITION";

/// MySQL or MariaDB connection handle.
#[derive(Debug)]
pub struct MySqlConnection {
    pool: MySqlPool,
    signature: &'static str,
}

impl MySqlConnection {
    /// Opens a pool and detects the server flavor.
    ///
    /// # Errors
    /// Returns error if the connection string is invalid or the server
    /// cannot be reached
    pub async fn connect(connection_string: &str, config: &ConnectionConfig) -> Result<Self> {
        use sqlx::Executor;

        let read_only = config.read_only;
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if read_only {
                        conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                    }
                    Ok(())
                })
            })
            .connect(connection_string)
            .await
            .map_err(|e| classify_sqlx_error("Failed to connect to MySQL", e))?;

        let mut connection = Self {
            pool,
            signature: "mysql",
        };
        let version = connection.scalar("SELECT VERSION()").await?;
        connection.signature = flavor_signature(version.as_deref());
        tracing::debug!(
            "Connected to {} server version {}",
            connection.signature,
            version.as_deref().unwrap_or("unknown")
        );

        Ok(connection)
    }

    async fn fetch(&self, sql: &str, params: &[Option<&str>]) -> Result<Vec<MetaRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("MySQL introspection query failed", e))?;

        Ok(rows
            .iter()
            .map(|row| {
                meta_row(row, |row: &MySqlRow, index| {
                    decode_cell!(row, index; i64, i32, i16, i8, u64, u32, u16, u8, f64, f32, bool)
                })
            })
            .collect())
    }

    async fn scalar(&self, sql: &str) -> Result<Option<String>> {
        let rows = self.fetch(sql, &[]).await?;
        Ok(rows.first().and_then(MetaRow::first).map(str::to_string))
    }
}

/// `mariadb` when the server version names MariaDB, `mysql` otherwise.
fn flavor_signature(version: Option<&str>) -> &'static str {
    match version {
        Some(version) if version.to_ascii_lowercase().contains("mariadb") => "mariadb",
        _ => "mysql",
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    fn signature(&self) -> &str {
        self.signature
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| SchemaDocError::connection_lost("MySQL ping failed", e))?;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<MetaRow>> {
        let params: Vec<Option<&str>> = params.iter().copied().map(Some).collect();
        self.fetch(sql, &params).await
    }

    async fn catalog(&self) -> Result<Option<String>> {
        self.scalar("SELECT DATABASE()").await
    }

    async fn schema(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn tables(&self, catalog: Option<&str>, _schema: Option<&str>) -> Result<Vec<MetaRow>> {
        self.fetch(TABLES_SQL, &[catalog]).await
    }

    async fn columns(
        &self,
        catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.fetch(COLUMNS_SQL, &[catalog, Some(table)]).await
    }

    async fn primary_keys(
        &self,
        catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.fetch(PRIMARY_KEYS_SQL, &[catalog, Some(table)]).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flavor_signature() {
        assert_eq!(flavor_signature(Some("8.0.36")), "mysql");
        assert_eq!(flavor_signature(Some("10.11.6-MariaDB-1:10.11.6+maria~ubu2204")), "mariadb");
        assert_eq!(flavor_signature(None), "mysql");
    }
}
