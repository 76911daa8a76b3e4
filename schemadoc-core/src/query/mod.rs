//! Metadata queries per engine family.
//!
//! A [`MetadataQuery`] turns one engine's introspection idioms into
//! [`DatabaseFacts`] and [`TableFacts`]. [`create_query`] picks the
//! implementation from the engine registry:
//! - `DialectQuery` runs per-engine statements and falls back to the standard
//!   calls for anything an engine does not define
//! - `OtherQuery` only uses the standard calls
//!
//! Table assembly degrades per table: a non-fatal failure while fetching one
//! table's columns or keys leaves that table with an empty column list and
//! `degraded = true`, and the run continues.

use crate::config::ProcessConfig;
use crate::connection::{Connection, MetaRow, labels};
use crate::error::SchemaDocError;
use crate::models::{ColumnFacts, DatabaseFacts, TableFacts};
use crate::registry::EngineIdentity;
use crate::type_dialect::{self, TypeDialect};
use crate::Result;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use regex::Regex;
use std::sync::{Arc, OnceLock};

mod dialect;
mod factory;
mod other;
mod statements;

pub use dialect::DialectQuery;
pub use factory::create_query;
pub use other::OtherQuery;
pub use statements::{DialectStatements, IdentifierCase, Param, Statement, statements_for};

/// Introspection capability of one engine family.
#[async_trait]
pub trait MetadataQuery: Send + Sync {
    /// Engine this query was resolved for.
    fn engine(&self) -> &'static EngineIdentity;

    /// Fetches the database facts.
    async fn database(&self) -> Result<DatabaseFacts>;

    /// Lists table headers in discovery order, without columns.
    async fn discover_tables(&self) -> Result<Vec<TableFacts>>;

    /// Fetches the columns of one table in native ordinal order.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnFacts>>;

    /// Fetches the primary-key column names of one table in key order.
    async fn primary_keys(&self, table: &str) -> Result<Vec<String>>;

    /// Discovers, filters and populates all tables.
    async fn tables(&self, config: &ProcessConfig) -> Result<Vec<TableFacts>> {
        collect_tables(self, config).await
    }
}

/// Discovers tables, applies the process filters and fetches each table's
/// columns and keys.
///
/// Fetches run up to `table_concurrency` at a time. Results keep discovery
/// order regardless of completion order.
///
/// # Errors
/// Returns error if discovery fails or a fatal error occurs for any table
pub async fn collect_tables<Q>(query: &Q, config: &ProcessConfig) -> Result<Vec<TableFacts>>
where
    Q: MetadataQuery + ?Sized,
{
    let discovered = query.discover_tables().await?;
    let discovered_count = discovered.len();
    let selected: Vec<TableFacts> = discovered
        .into_iter()
        .filter(|table| config.selects(&table.name))
        .collect();

    tracing::debug!(
        "Selected {} of {} discovered tables",
        selected.len(),
        discovered_count
    );

    stream::iter(selected.into_iter().map(|table| populate_table(query, table)))
        .buffered(config.table_concurrency.max(1))
        .try_collect()
        .await
}

async fn populate_table<Q>(query: &Q, mut table: TableFacts) -> Result<TableFacts>
where
    Q: MetadataQuery + ?Sized,
{
    let fetched = async {
        let mut columns = query.columns(&table.name).await?;
        let keys = query.primary_keys(&table.name).await?;
        mark_primary_keys(&mut columns, &keys);
        Ok::<_, SchemaDocError>((columns, keys))
    }
    .await;

    match fetched {
        Ok((columns, keys)) => {
            table.columns = columns;
            table.primary_keys = keys;
        }
        Err(error) if error.is_fatal() => return Err(error),
        Err(error) => {
            tracing::warn!(
                "Introspection degraded for table '{}': {}",
                table.name,
                error
            );
            table.columns.clear();
            table.primary_keys.clear();
            table.degraded = true;
        }
    }

    Ok(table)
}

fn mark_primary_keys(columns: &mut [ColumnFacts], keys: &[String]) {
    for column in columns {
        column.primary_key = keys.iter().any(|key| *key == column.name);
    }
}

/// State shared by every query implementation.
pub(crate) struct QueryBase {
    pub(crate) connection: Arc<dyn Connection>,
    pub(crate) engine: &'static EngineIdentity,
    pub(crate) catalog: Option<String>,
    pub(crate) schema: Option<String>,
    dialect: Option<Box<dyn TypeDialect>>,
}

impl QueryBase {
    /// Reads the current namespace from the connection.
    ///
    /// Non-fatal namespace failures leave the namespace absent.
    pub(crate) async fn new(
        connection: Arc<dyn Connection>,
        engine: &'static EngineIdentity,
    ) -> Result<Self> {
        let catalog = optional_namespace(connection.catalog().await, "catalog")?;
        let schema = optional_namespace(connection.schema().await, "schema")?;

        Ok(Self {
            connection,
            engine,
            catalog,
            schema,
            dialect: engine.type_dialect.map(type_dialect::for_kind),
        })
    }

    /// Name reported when the engine has no database statement.
    pub(crate) fn database_name(&self) -> String {
        self.catalog
            .as_deref()
            .or(self.schema.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.engine.code)
            .to_string()
    }

    pub(crate) fn dialect(&self) -> Option<&dyn TypeDialect> {
        self.dialect.as_deref()
    }

    pub(crate) async fn standard_tables(&self) -> Result<Vec<TableFacts>> {
        let rows = self
            .connection
            .tables(self.catalog.as_deref(), self.schema.as_deref())
            .await?;
        Ok(tables_from_rows(&rows))
    }

    pub(crate) async fn standard_columns(&self, table: &str) -> Result<Vec<ColumnFacts>> {
        let rows = self
            .connection
            .columns(self.catalog.as_deref(), self.schema.as_deref(), table)
            .await?;
        Ok(columns_from_rows(&rows, self.dialect()))
    }

    pub(crate) async fn standard_primary_keys(&self, table: &str) -> Result<Vec<String>> {
        let rows = self
            .connection
            .primary_keys(self.catalog.as_deref(), self.schema.as_deref(), table)
            .await?;
        Ok(keys_from_rows(&rows))
    }
}

fn optional_namespace(result: Result<Option<String>>, kind: &str) -> Result<Option<String>> {
    match result {
        Ok(namespace) => Ok(namespace.filter(|name| !name.is_empty())),
        Err(error) if error.is_fatal() => Err(error),
        Err(error) => {
            tracing::debug!("Current {} unavailable: {}", kind, error);
            Ok(None)
        }
    }
}

/// Table headers from standard table rows; rows without a name are skipped.
pub(crate) fn tables_from_rows(rows: &[MetaRow]) -> Vec<TableFacts> {
    rows.iter()
        .filter_map(|row| {
            let name = row.text(labels::TABLE_NAME)?;
            Some(TableFacts::new(name, row.text(labels::REMARKS)))
        })
        .collect()
}

/// Columns from standard column rows, stable-sorted by ordinal position.
pub(crate) fn columns_from_rows(
    rows: &[MetaRow],
    dialect: Option<&dyn TypeDialect>,
) -> Vec<ColumnFacts> {
    let mut columns: Vec<ColumnFacts> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| column_from_row(row, index, dialect))
        .collect();
    columns.sort_by_key(|column| column.ordinal_position);
    columns
}

/// Maps one standard column row.
///
/// `data_type` is the reported full type when present, otherwise
/// `type(size[,digits])` composed from the bare type name.
pub(crate) fn column_from_row(
    row: &MetaRow,
    index: usize,
    dialect: Option<&dyn TypeDialect>,
) -> Option<ColumnFacts> {
    let name = row.text(labels::COLUMN_NAME)?;
    let fallback_position = u32::try_from(index + 1).unwrap_or(u32::MAX);
    let ordinal = row
        .number(labels::ORDINAL_POSITION)
        .unwrap_or(fallback_position);

    let mut column_size = row.number(labels::COLUMN_SIZE);
    let mut decimal_digits = row.number(labels::DECIMAL_DIGITS);

    let data_type = match row.get(labels::DATA_TYPE).filter(|t| !t.trim().is_empty()) {
        Some(full) => full.to_string(),
        None => compose_type(
            row.get(labels::TYPE_NAME).unwrap_or_default(),
            column_size,
            decimal_digits,
        ),
    };

    if column_size.is_none()
        && let Some((size, digits)) = parse_type_size(&data_type)
    {
        column_size = Some(size);
        decimal_digits = decimal_digits.or(digits);
    }

    let mut column = ColumnFacts::new(ordinal, name, data_type);
    column.column_size = column_size;
    column.decimal_digits = decimal_digits;
    column.nullable = row.flag(labels::IS_NULLABLE).unwrap_or(true);
    column.default_value = row.text(labels::COLUMN_DEF);
    column.remarks = row.text(labels::REMARKS);
    column.simplified_type = dialect.and_then(|d| d.simplify(&column.data_type));
    Some(column)
}

/// Primary-key column names ordered by key sequence.
pub(crate) fn keys_from_rows(rows: &[MetaRow]) -> Vec<String> {
    let mut keys: Vec<(u32, String)> = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let name = row.text(labels::COLUMN_NAME)?;
            let fallback = u32::try_from(index + 1).unwrap_or(u32::MAX);
            Some((row.number(labels::KEY_SEQ).unwrap_or(fallback), name))
        })
        .collect();
    keys.sort_by_key(|(sequence, _)| *sequence);
    keys.into_iter().map(|(_, name)| name).collect()
}

fn compose_type(type_name: &str, size: Option<u32>, digits: Option<u32>) -> String {
    let type_name = type_name.trim();
    if type_name.contains('(') {
        return type_name.to_string();
    }
    match (size, digits) {
        (Some(size), Some(digits)) if digits > 0 => format!("{}({},{})", type_name, size, digits),
        (Some(size), _) if size > 0 => format!("{}({})", type_name, size),
        _ => type_name.to_string(),
    }
}

#[allow(clippy::expect_used)]
fn type_size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\)").expect("Invalid type size pattern")
    })
}

/// Extracts `(size, digits)` from type text such as `decimal(10, 2)`.
fn parse_type_size(data_type: &str) -> Option<(u32, Option<u32>)> {
    let captures = type_size_pattern().captures(data_type)?;
    let size = captures.get(1)?.as_str().parse().ok()?;
    let digits = captures.get(2).and_then(|m| m.as_str().parse().ok());
    Some((size, digits))
}
