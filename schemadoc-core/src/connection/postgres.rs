//! PostgreSQL transport.
//!
//! Standard introspection calls read `information_schema`. Every projected
//! value is cast to `text` so rows decode uniformly.

use super::{Connection, MetaRow, classify_sqlx_error, meta_row};
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::{SchemaDocError, redact_database_url};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgPoolOptions, PgRow};

const TABLES_SQL: &str = "SELECT c.relname::text AS table_name, \
     obj_description(c.oid, 'pg_class')::text AS remarks \
     FROM pg_catalog.pg_class c \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     WHERE n.nspname::text = COALESCE($1::text, current_schema()) AND c.relkind IN ('r', 'p') \
     ORDER BY c.relname";

const COLUMNS_SQL: &str = "SELECT column_name::text AS column_name, \
     ordinal_position::text AS ordinal_position, \
     udt_name::text AS type_name, \
     (CASE WHEN data_type = 'numeric' THEN numeric_precision \
           ELSE character_maximum_length END)::text AS column_size, \
     (CASE WHEN data_type = 'numeric' THEN numeric_scale END)::text AS decimal_digits, \
     is_nullable::text AS is_nullable, \
     column_default::text AS column_def, \
     NULL::text AS remarks \
     FROM information_schema.columns \
     WHERE table_schema::text = COALESCE($1::text, current_schema()) AND table_name::text = $2 \
     ORDER BY ordinal_position";

const PRIMARY_KEYS_SQL: &str = "SELECT kcu.column_name::text AS column_name, \
     kcu.ordinal_position::text AS key_seq \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON kcu.constraint_name = tc.constraint_name \
      AND kcu.table_schema = tc.table_schema \
      AND kcu.table_name = tc.table_name \
     WHERE tc.constraint_type = 'PRIMARY KEY' \
       AND tc.table_schema::text = COALESCE($1::text, current_schema()) \
       AND tc.table_name::text = $2 \
     ORDER BY kcu.ordinal_position";

/// PostgreSQL connection handle.
#[derive(Debug)]
pub struct PostgresConnection {
    pool: PgPool,
}

impl PostgresConnection {
    /// Creates a lazily connecting pool; reachability is checked by `ping`.
    ///
    /// # Errors
    /// Returns error if the connection string is invalid
    #[allow(clippy::unused_async)]
    pub async fn connect(connection_string: &str, config: &ConnectionConfig) -> Result<Self> {
        use sqlx::Executor;

        let read_only = config.read_only;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    let app_name = format!("schemadoc-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                        .await?;
                    if read_only {
                        conn.execute("SET default_transaction_read_only = on")
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                SchemaDocError::configuration(format!(
                    "Invalid PostgreSQL connection string {}: {}",
                    redact_database_url(connection_string),
                    e
                ))
            })?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, sql: &str, params: &[Option<&str>]) -> Result<Vec<MetaRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(*param);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("PostgreSQL introspection query failed", e))?;

        Ok(rows
            .iter()
            .map(|row| {
                meta_row(row, |row: &PgRow, index| {
                    decode_cell!(row, index; i64, i32, i16, f64, f32, bool)
                })
            })
            .collect())
    }

    async fn scalar(&self, sql: &str) -> Result<Option<String>> {
        let rows = self.fetch(sql, &[]).await?;
        Ok(rows.first().and_then(MetaRow::first).map(str::to_string))
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    fn signature(&self) -> &str {
        "postgresql"
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| SchemaDocError::connection_lost("PostgreSQL ping failed", e))?;
        Ok(())
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<MetaRow>> {
        let params: Vec<Option<&str>> = params.iter().copied().map(Some).collect();
        self.fetch(sql, &params).await
    }

    async fn catalog(&self) -> Result<Option<String>> {
        self.scalar("SELECT current_database()::text").await
    }

    async fn schema(&self) -> Result<Option<String>> {
        self.scalar("SELECT current_schema()::text").await
    }

    async fn tables(&self, _catalog: Option<&str>, schema: Option<&str>) -> Result<Vec<MetaRow>> {
        self.fetch(TABLES_SQL, &[schema]).await
    }

    async fn columns(
        &self,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.fetch(COLUMNS_SQL, &[schema, Some(table)]).await
    }

    async fn primary_keys(
        &self,
        _catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.fetch(PRIMARY_KEYS_SQL, &[schema, Some(table)]).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
