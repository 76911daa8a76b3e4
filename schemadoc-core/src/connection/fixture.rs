//! Scripted connection handle for unit tests.

use super::{Connection, MetaRow, labels};
use crate::Result;
use crate::error::SchemaDocError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// How a scripted call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    /// Permission denied on the object
    Privileges,
    /// Object vanished between discovery and introspection
    Missing,
    /// Handle became unusable
    ConnectionLost,
}

impl Failure {
    fn raise(self, context: &str) -> SchemaDocError {
        match self {
            Self::Privileges => {
                SchemaDocError::insufficient_privileges(format!("SELECT on {}", context))
            }
            Self::Missing => SchemaDocError::collection_failed(
                format!("introspecting {}", context),
                std::io::Error::new(std::io::ErrorKind::NotFound, "relation does not exist"),
            ),
            Self::ConnectionLost => SchemaDocError::connection_lost(
                format!("introspecting {}", context),
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            ),
        }
    }
}

type Scripted = std::result::Result<Vec<MetaRow>, Failure>;

struct Response {
    needle: String,
    param: Option<String>,
    outcome: Scripted,
}

/// Connection handle answering from scripted rows.
///
/// Engine-specific statements are matched by a substring of their SQL and,
/// optionally, one bound parameter. Standard calls answer from the table,
/// column and key scripts.
pub(crate) struct FixtureConnection {
    signature: String,
    reachable: bool,
    catalog: Option<String>,
    schema: Option<String>,
    tables: Vec<MetaRow>,
    columns: HashMap<String, Scripted>,
    primary_keys: HashMap<String, Scripted>,
    responses: Vec<Response>,
    closed: AtomicUsize,
    is_closed: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FixtureConnection {
    pub(crate) fn new(signature: &str) -> Self {
        Self {
            signature: signature.to_string(),
            reachable: true,
            catalog: None,
            schema: None,
            tables: Vec::new(),
            columns: HashMap::new(),
            primary_keys: HashMap::new(),
            responses: Vec::new(),
            closed: AtomicUsize::new(0),
            is_closed: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub(crate) fn with_catalog(mut self, catalog: &str) -> Self {
        self.catalog = Some(catalog.to_string());
        self
    }

    pub(crate) fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// Adds a table to the standard listing with its standard column rows.
    pub(crate) fn with_table(mut self, name: &str, remarks: Option<&str>, columns: Vec<MetaRow>) -> Self {
        self.tables.push(table_row(name, remarks));
        self.columns.insert(name.to_string(), Ok(columns));
        self
    }

    pub(crate) fn with_primary_keys(mut self, table: &str, keys: &[&str]) -> Self {
        let rows = keys
            .iter()
            .enumerate()
            .map(|(index, key)| key_row(key, index + 1))
            .collect();
        self.primary_keys.insert(table.to_string(), Ok(rows));
        self
    }

    /// Makes the standard column call fail for `table`.
    pub(crate) fn failing_columns(mut self, table: &str, failure: Failure) -> Self {
        self.columns.insert(table.to_string(), Err(failure));
        self
    }

    /// Answers statements containing `needle` (and binding `param`) with `rows`.
    pub(crate) fn respond(mut self, needle: &str, param: Option<&str>, rows: Vec<MetaRow>) -> Self {
        self.responses.push(Response {
            needle: needle.to_string(),
            param: param.map(str::to_string),
            outcome: Ok(rows),
        });
        self
    }

    /// Fails statements containing `needle` (and binding `param`).
    pub(crate) fn fail_on(mut self, needle: &str, param: Option<&str>, failure: Failure) -> Self {
        self.responses.push(Response {
            needle: needle.to_string(),
            param: param.map(str::to_string),
            outcome: Err(failure),
        });
        self
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Recorded calls, e.g. `columns:orders` or `query:information_schema.COLUMNS`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_open(&self) -> Result<()> {
        if !self.reachable || self.is_closed.load(Ordering::SeqCst) {
            return Err(Failure::ConnectionLost.raise("connection"));
        }
        Ok(())
    }

    fn scripted(outcome: Option<&Scripted>, context: &str) -> Result<Vec<MetaRow>> {
        match outcome {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(failure)) => Err(failure.raise(context)),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl Connection for FixtureConnection {
    fn signature(&self) -> &str {
        &self.signature
    }

    async fn ping(&self) -> Result<()> {
        self.record("ping".to_string());
        self.check_open()
    }

    async fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<MetaRow>> {
        self.check_open()?;
        let response = self.responses.iter().find(|response| {
            sql.contains(response.needle.as_str())
                && response
                    .param
                    .as_deref()
                    .is_none_or(|param| params.contains(&param))
        });
        match response {
            Some(response) => {
                self.record(format!("query:{}", response.needle));
                Self::scripted(Some(&response.outcome), &response.needle)
            }
            None => {
                self.record("query:unscripted".to_string());
                Err(SchemaDocError::query_failed(format!(
                    "no scripted response for statement: {}",
                    sql
                )))
            }
        }
    }

    async fn catalog(&self) -> Result<Option<String>> {
        self.check_open()?;
        Ok(self.catalog.clone())
    }

    async fn schema(&self) -> Result<Option<String>> {
        self.check_open()?;
        Ok(self.schema.clone())
    }

    async fn tables(&self, _catalog: Option<&str>, _schema: Option<&str>) -> Result<Vec<MetaRow>> {
        self.check_open()?;
        self.record("tables".to_string());
        Ok(self.tables.clone())
    }

    async fn columns(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.check_open()?;
        self.record(format!("columns:{}", table));
        Self::scripted(self.columns.get(table), table)
    }

    async fn primary_keys(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<MetaRow>> {
        self.check_open()?;
        self.record(format!("primary_keys:{}", table));
        Self::scripted(self.primary_keys.get(table), table)
    }

    async fn close(&self) {
        self.is_closed.store(true, Ordering::SeqCst);
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Standard table row.
pub(crate) fn table_row(name: &str, remarks: Option<&str>) -> MetaRow {
    MetaRow::from_pairs(&[(labels::TABLE_NAME, Some(name)), (labels::REMARKS, remarks)])
}

/// Standard column row with a bare type name.
pub(crate) fn column_row(ordinal: u32, name: &str, type_name: &str, nullable: bool) -> MetaRow {
    let ordinal = ordinal.to_string();
    MetaRow::from_pairs(&[
        (labels::COLUMN_NAME, Some(name)),
        (labels::ORDINAL_POSITION, Some(ordinal.as_str())),
        (labels::TYPE_NAME, Some(type_name)),
        (labels::IS_NULLABLE, Some(if nullable { "YES" } else { "NO" })),
        (labels::COLUMN_DEF, None),
        (labels::REMARKS, None),
    ])
}

/// Standard primary-key row.
pub(crate) fn key_row(column: &str, sequence: usize) -> MetaRow {
    let sequence = sequence.to_string();
    MetaRow::from_pairs(&[
        (labels::COLUMN_NAME, Some(column)),
        (labels::KEY_SEQ, Some(sequence.as_str())),
    ])
}
