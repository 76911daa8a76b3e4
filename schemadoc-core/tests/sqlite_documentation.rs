//! SQLite end-to-end documentation tests.
//!
//! This test suite covers:
//! - Engine resolution and dialect statements over a live SQLite database
//! - Column ordering, type sizes, nullability and defaults
//! - Composite primary keys in key order
//! - Table filters and output format passes
//! - File-backed databases opened read-only through `connect`
//!
//! Note: SQLite tests use in-memory databases or temporary files, so no
//! external services are needed.

#![cfg(feature = "sqlite")]
#![allow(clippy::unwrap_used)]

use schemadoc_core::connection::sqlite::SqliteConnection;
use schemadoc_core::{
    Configuration, Connection, ConnectionConfig, DataModelProcess, OutputFormat, ProcessConfig,
    QueryKind, Result, connect, create_query,
};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

const SHOP_SCHEMA: &[&str] = &[
    "CREATE TABLE customers (
        id INTEGER PRIMARY KEY,
        email VARCHAR(120) NOT NULL,
        nickname TEXT
    )",
    "CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer_id INTEGER NOT NULL REFERENCES customers(id),
        total DECIMAL(10,2) NOT NULL DEFAULT 0,
        status TEXT DEFAULT 'pending',
        note TEXT DEFAULT '<none>'
    )",
    "CREATE TABLE order_lines (
        order_id INTEGER NOT NULL,
        line_no INTEGER NOT NULL,
        sku TEXT NOT NULL,
        PRIMARY KEY (order_id, line_no)
    )",
    "CREATE TABLE tmp_import (payload BLOB)",
];

async fn create_schema(pool: &SqlitePool) {
    for statement in SHOP_SCHEMA {
        sqlx::query(statement).execute(pool).await.unwrap();
    }
}

/// In-memory shop database behind a single-connection pool.
async fn shop_connection() -> Arc<dyn Connection> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    create_schema(&pool).await;
    Arc::new(SqliteConnection::from_pool(pool, "main"))
}

// =============================================================================
// Query Layer Tests
// =============================================================================

#[tokio::test]
async fn test_sqlite_resolves_to_dialect_query() -> Result<()> {
    let connection = shop_connection().await;
    let query = create_query(connection).await?;

    assert_eq!(query.engine().code, "sqlite");
    assert_eq!(query.engine().query, QueryKind::Sqlite);
    assert_eq!(query.database().await?.name, "main");
    Ok(())
}

#[tokio::test]
async fn test_sqlite_tables_in_catalog_order() -> Result<()> {
    let connection = shop_connection().await;
    let query = create_query(connection).await?;

    let tables = query.tables(&ProcessConfig::default()).await?;
    let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "order_lines", "orders", "tmp_import"]);
    assert!(tables.iter().all(|t| t.remarks.is_none()));
    Ok(())
}

// =============================================================================
// Assembly Process Tests
// =============================================================================

#[tokio::test]
async fn test_sqlite_document_model() -> Result<()> {
    let connection = shop_connection().await;
    let config = Configuration::new("Shop", "3.0.0").with_output_format(OutputFormat::Html);

    let model = DataModelProcess::new(config)
        .process(Arc::clone(&connection))
        .await?;

    assert_eq!(model.title, "Shop");
    assert_eq!(model.database.name, "main");
    assert_eq!(model.tables.len(), 4);
    assert!(model.degraded_tables().is_empty());

    let orders = model.table("orders").unwrap();
    let columns: Vec<&str> = orders.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "customer_id", "total", "status", "note"]);
    assert_eq!(orders.primary_keys, vec!["id"]);

    let id = orders.column("id").unwrap();
    assert!(id.primary_key);
    assert!(!id.nullable);
    assert_eq!(id.ordinal_position, 1);

    let total = orders.column("total").unwrap();
    assert_eq!(total.data_type, "DECIMAL(10,2)");
    assert_eq!(total.column_size, Some(10));
    assert_eq!(total.decimal_digits, Some(2));
    assert_eq!(total.simplified_type, None);
    assert_eq!(total.effective_type(), "DECIMAL(10,2)");
    assert_eq!(total.default_value.as_deref(), Some("0"));

    let status = orders.column("status").unwrap();
    assert!(status.nullable);
    assert_eq!(status.default_value.as_deref(), Some("'pending'"));
    assert_eq!(status.remarks, None);

    let email = model.table("customers").unwrap().column("email").unwrap();
    assert_eq!(email.column_size, Some(120));
    assert!(!email.nullable);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_composite_primary_key_order() -> Result<()> {
    let connection = shop_connection().await;
    let model = DataModelProcess::new(Configuration::default())
        .process(connection)
        .await?;

    let lines = model.table("order_lines").unwrap();
    assert_eq!(lines.primary_keys, vec!["order_id", "line_no"]);
    assert!(lines.column("sku").is_some_and(|c| !c.primary_key));
    Ok(())
}

#[tokio::test]
async fn test_sqlite_table_filters() -> Result<()> {
    let connection = shop_connection().await;
    let process = ProcessConfig::default()
        .designate_prefix("order")
        .ignore_table("order_lines");
    let config = Configuration::default().with_process(process);

    let model = DataModelProcess::new(config).process(connection).await?;

    let names: Vec<&str> = model.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["orders"]);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_word_escapes_defaults() -> Result<()> {
    let connection = shop_connection().await;
    let config = Configuration::default().with_output_format(OutputFormat::Word);

    let model = DataModelProcess::new(config).process(connection).await?;

    let note = model.table("orders").unwrap().column("note").unwrap();
    assert_eq!(
        note.default_value.as_deref(),
        Some("&apos;&lt;none&gt;&apos;")
    );
    Ok(())
}

#[tokio::test]
async fn test_sqlite_connection_released_after_run() -> Result<()> {
    let connection = shop_connection().await;
    DataModelProcess::new(Configuration::default())
        .process(Arc::clone(&connection))
        .await?;

    let error = connection.ping().await.unwrap_err();
    assert!(error.is_fatal());
    Ok(())
}

#[tokio::test]
async fn test_sqlite_concurrent_table_fetch_keeps_order() -> Result<()> {
    let connection = shop_connection().await;
    let config = Configuration::default()
        .with_process(ProcessConfig::default().with_table_concurrency(4));

    let model = DataModelProcess::new(config).process(connection).await?;

    let names: Vec<&str> = model.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["customers", "order_lines", "orders", "tmp_import"]);
    Ok(())
}

// =============================================================================
// File-Backed Database Tests
// =============================================================================

#[tokio::test]
async fn test_sqlite_file_database_through_connect() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.db");

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
    create_schema(&pool).await;
    pool.close().await;

    let url = format!("sqlite://{}", path.display());
    let connection = connect(&url, &ConnectionConfig::default()).await?;
    assert_eq!(connection.signature(), "sqlite");

    let model = DataModelProcess::new(Configuration::new("Inventory", "1.0.0"))
        .process(connection)
        .await?;

    assert_eq!(model.database.name, "inventory");
    assert_eq!(model.tables.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_connection_is_read_only() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
    create_schema(&pool).await;
    pool.close().await;

    let connection = connect(&path.display().to_string(), &ConnectionConfig::default()).await?;
    let result = connection
        .query("INSERT INTO tmp_import (payload) VALUES (NULL)", &[])
        .await;
    assert!(result.is_err());
    connection.close().await;
    Ok(())
}
