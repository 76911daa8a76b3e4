//! Connection handle abstraction and sqlx-backed transports.
//!
//! The metadata layer only sees [`Connection`]: a dialect signature, an
//! engine-specific statement runner and the standard introspection calls.
//! Rows come back as [`MetaRow`]s, ordered label/value pairs with every value
//! decoded to text.
//!
//! # Module Structure
//! - `sqlite`, `postgres`, `mysql`: transports, each behind its cargo feature
//! - `fixture`: scripted in-memory handle for unit tests

use crate::config::ConnectionConfig;
use crate::error::{SchemaDocError, redact_database_url};
use crate::{Result, registry};
use async_trait::async_trait;
use std::sync::Arc;

/// Decodes one cell to text, trying `String` first and then the listed types.
///
/// Byte columns are decoded as lossy UTF-8. Undecodable values read as NULL.
#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
macro_rules! decode_cell {
    ($row:expr, $index:expr; $($ty:ty),+ $(,)?) => {{
        use sqlx::Row as _;
        let row = $row;
        let index = $index;
        match row.try_get::<Option<String>, _>(index) {
            Ok(value) => value,
            Err(_) => {
                let mut decoded: Option<Option<String>> = None;
                $(
                    if decoded.is_none()
                        && let Ok(value) = row.try_get::<Option<$ty>, _>(index)
                    {
                        decoded = Some(value.map(|v| v.to_string()));
                    }
                )+
                if decoded.is_none()
                    && let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(index)
                {
                    decoded = Some(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()));
                }
                decoded.flatten()
            }
        }
    }};
}

#[cfg(test)]
pub(crate) mod fixture;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgresql")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Standard introspection result labels.
pub mod labels {
    pub const TABLE_NAME: &str = "TABLE_NAME";
    pub const REMARKS: &str = "REMARKS";
    pub const COLUMN_NAME: &str = "COLUMN_NAME";
    /// Full native type including length, e.g. `varchar(255)`
    pub const DATA_TYPE: &str = "DATA_TYPE";
    /// Bare native type name, e.g. `varchar`
    pub const TYPE_NAME: &str = "TYPE_NAME";
    pub const COLUMN_SIZE: &str = "COLUMN_SIZE";
    pub const DECIMAL_DIGITS: &str = "DECIMAL_DIGITS";
    pub const IS_NULLABLE: &str = "IS_NULLABLE";
    pub const COLUMN_DEF: &str = "COLUMN_DEF";
    pub const ORDINAL_POSITION: &str = "ORDINAL_POSITION";
    pub const KEY_SEQ: &str = "KEY_SEQ";
}

/// One result row with text-decoded cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaRow {
    cells: Vec<(String, Option<String>)>,
}

impl MetaRow {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from label/value pairs.
    pub fn from_pairs(pairs: &[(&str, Option<&str>)]) -> Self {
        Self {
            cells: pairs
                .iter()
                .map(|(label, value)| ((*label).to_string(), value.map(str::to_string)))
                .collect(),
        }
    }

    /// Appends a cell.
    pub fn push(&mut self, label: impl Into<String>, value: Option<String>) {
        self.cells.push((label.into(), value));
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell labels in result order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(label, _)| label.as_str())
    }

    /// Value of the first cell with a matching label, ignoring ASCII case.
    ///
    /// SQL NULL and a missing label both read as `None`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .and_then(|(_, value)| value.as_deref())
    }

    /// Owned value of a labelled cell.
    pub fn text(&self, label: &str) -> Option<String> {
        self.get(label).map(str::to_string)
    }

    /// Value of the first cell regardless of label.
    pub fn first(&self) -> Option<&str> {
        self.cells.first().and_then(|(_, value)| value.as_deref())
    }

    /// Non-negative integer value of a labelled cell.
    ///
    /// Accepts integral decimal text such as `10.0` reported by engines with
    /// numeric-only catalogs.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn number(&self, label: &str) -> Option<u32> {
        let value = self.get(label)?.trim();
        if let Ok(number) = value.parse::<u32>() {
            return Some(number);
        }
        let decimal = value.parse::<f64>().ok()?;
        let integral = decimal.is_finite() && decimal.fract() == 0.0;
        if integral && (0.0..=f64::from(u32::MAX)).contains(&decimal) {
            Some(decimal as u32)
        } else {
            None
        }
    }

    /// Boolean flag of a labelled cell, see [`parse_flag`].
    pub fn flag(&self, label: &str) -> Option<bool> {
        self.get(label).map(parse_flag)
    }
}

/// Interprets catalog flag text: `YES`, `Y`, `1` and `TRUE` are true.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_uppercase().as_str(),
        "YES" | "Y" | "1" | "TRUE"
    )
}

/// A live database connection as seen by the metadata layer.
///
/// # Object Safety
/// This trait is object-safe; the assembly process holds it as
/// `Arc<dyn Connection>` and releases it exactly once through [`close`].
///
/// [`close`]: Connection::close
#[async_trait]
pub trait Connection: Send + Sync {
    /// Dialect signature matched against the engine registry, e.g. `mysql`.
    fn signature(&self) -> &str;

    /// Checks that the handle is reachable.
    ///
    /// # Errors
    /// Returns a fatal `Connection` error if the database cannot be reached
    async fn ping(&self) -> Result<()>;

    /// Runs an engine-specific statement with positional text parameters.
    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<MetaRow>>;

    /// Current catalog, if the engine has that notion.
    async fn catalog(&self) -> Result<Option<String>>;

    /// Current schema, if the engine has that notion.
    async fn schema(&self) -> Result<Option<String>>;

    /// Standard table listing with `TABLE_NAME` and `REMARKS`.
    async fn tables(&self, catalog: Option<&str>, schema: Option<&str>) -> Result<Vec<MetaRow>>;

    /// Standard column listing for one table.
    async fn columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>>;

    /// Standard primary-key listing with `COLUMN_NAME` and `KEY_SEQ`.
    async fn primary_keys(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>>;

    /// Releases the underlying resources.
    async fn close(&self);
}

/// Derives a dialect signature from a connection URL.
///
/// A leading `jdbc:` is ignored. Bare SQLite file paths and `:memory:` map to
/// `sqlite`. Returns `None` when no scheme can be found.
///
/// # Example
/// ```rust
/// use schemadoc_core::connection::signature_from_url;
///
/// assert_eq!(signature_from_url("postgres://localhost/shop").as_deref(), Some("postgresql"));
/// assert_eq!(signature_from_url("jdbc:mysql://db:3306/shop").as_deref(), Some("mysql"));
/// assert_eq!(signature_from_url("./data/shop.sqlite3").as_deref(), Some("sqlite"));
/// ```
pub fn signature_from_url(url: &str) -> Option<String> {
    let url = strip_jdbc(url.trim());
    let lower = url.to_ascii_lowercase();
    if lower == ":memory:"
        || [".db", ".sqlite", ".sqlite3"]
            .iter()
            .any(|ext| lower.ends_with(ext) && !lower.contains("://"))
    {
        return Some("sqlite".to_string());
    }

    let scheme = lower.split(':').next().filter(|s| !s.is_empty() && *s != lower)?;
    let signature = match scheme {
        "postgres" | "postgresql" | "pgsql" => "postgresql",
        "mssql" | "sqlserver" | "jtds" => "sqlserver",
        "sqlite" | "sqlite3" => "sqlite",
        other => other,
    };
    Some(signature.to_string())
}

fn strip_jdbc(url: &str) -> &str {
    url.get(..5)
        .filter(|prefix| prefix.eq_ignore_ascii_case("jdbc:"))
        .map_or(url, |_| &url[5..])
}

/// Opens a transport for `url` and returns it as a connection handle.
///
/// # Errors
/// Returns error if:
/// - The URL has no recognizable scheme, or no transport exists for it
/// - The transport for a known engine is not compiled into this build
/// - The database cannot be reached
pub async fn connect(url: &str, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
    config.validate()?;

    let signature = signature_from_url(url).ok_or_else(|| {
        SchemaDocError::configuration(format!(
            "Cannot determine database type from '{}'",
            redact_database_url(url)
        ))
    })?;
    let url = strip_jdbc(url.trim());

    tracing::info!(
        "Connecting to {} ({})",
        redact_database_url(url),
        signature
    );

    match signature.as_str() {
        #[cfg(feature = "postgresql")]
        "postgresql" => Ok(Arc::new(
            postgres::PostgresConnection::connect(url, config).await?,
        )),
        #[cfg(feature = "mysql")]
        "mysql" | "mariadb" => Ok(Arc::new(mysql::MySqlConnection::connect(url, config).await?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(sqlite::SqliteConnection::connect(url, config).await?)),
        other => {
            let engine = registry::resolve(other);
            if engine.is_fallback() {
                Err(SchemaDocError::configuration(format!(
                    "No transport available for '{}' connections",
                    other
                )))
            } else {
                Err(SchemaDocError::unsupported_feature(
                    format!("{} transport", other),
                    engine.display_name,
                ))
            }
        }
    }
}

/// Maps a sqlx error onto the crate taxonomy.
///
/// Transport failures are fatal `Connection` errors; permission failures are
/// `InsufficientPrivileges`; everything else is a per-statement `Collection`.
#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
pub(crate) fn classify_sqlx_error(context: &str, error: sqlx::Error) -> SchemaDocError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => SchemaDocError::connection_lost(context, error),
        sqlx::Error::Database(db) if is_permission_denied(db.as_ref()) => {
            SchemaDocError::insufficient_privileges(format!("{}: {}", context, db.message()))
        }
        _ => SchemaDocError::collection_failed(context, error),
    }
}

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
fn is_permission_denied(error: &dyn sqlx::error::DatabaseError) -> bool {
    error.code().as_deref() == Some("42501") || is_mysql_access_denied(error)
}

#[cfg(feature = "mysql")]
fn is_mysql_access_denied(error: &dyn sqlx::error::DatabaseError) -> bool {
    // ER_TABLEACCESS_DENIED_ERROR, ER_DBACCESS_DENIED_ERROR
    error
        .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
        .is_some_and(|mysql| matches!(mysql.number(), 1142 | 1044))
}

#[cfg(all(not(feature = "mysql"), any(feature = "postgresql", feature = "sqlite")))]
fn is_mysql_access_denied(_error: &dyn sqlx::error::DatabaseError) -> bool {
    false
}

/// Converts a decoded sqlx row into a [`MetaRow`].
#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
pub(crate) fn meta_row<R, F>(row: &R, decode: F) -> MetaRow
where
    R: sqlx::Row,
    F: Fn(&R, usize) -> Option<String>,
{
    use sqlx::Column as _;

    let mut meta = MetaRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        meta.push(column.name(), decode(row, index));
    }
    meta
}
