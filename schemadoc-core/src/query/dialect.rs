//! Statement-table driven metadata query.

use super::statements::{DialectStatements, Param, Statement};
use super::{
    MetadataQuery, QueryBase, columns_from_rows, keys_from_rows, tables_from_rows,
};
use crate::Result;
use crate::connection::MetaRow;
use crate::models::{ColumnFacts, DatabaseFacts, TableFacts};
use crate::registry::EngineIdentity;
use async_trait::async_trait;

/// Metadata query for an engine family with its own statements.
///
/// Steps without a statement, or whose statement needs a namespace the
/// connection does not report, use the standard introspection call.
pub struct DialectQuery {
    base: QueryBase,
    statements: &'static DialectStatements,
}

impl DialectQuery {
    pub(crate) fn new(base: QueryBase, statements: &'static DialectStatements) -> Self {
        Self { base, statements }
    }

    /// Binds the statement parameters, or `None` if a namespace is missing.
    fn bind(&self, statement: &Statement, table: Option<&str>) -> Option<Vec<String>> {
        let case = self.statements.identifier_case;
        statement
            .params
            .iter()
            .map(|param| match param {
                Param::Table => table.map(str::to_string),
                Param::Schema => self.base.schema.as_deref().map(|s| case.apply(s)),
                Param::Catalog => self.base.catalog.as_deref().map(|c| case.apply(c)),
            })
            .collect()
    }

    /// Runs `statement` if it is defined and bindable.
    async fn run(
        &self,
        statement: Option<&Statement>,
        table: Option<&str>,
    ) -> Result<Option<Vec<MetaRow>>> {
        let Some(statement) = statement else {
            return Ok(None);
        };
        let Some(params) = self.bind(statement, table) else {
            tracing::debug!(
                "Missing namespace for {} statement, using standard introspection",
                self.base.engine.code
            );
            return Ok(None);
        };

        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        let rows = self.base.connection.query(statement.sql, &params).await?;
        Ok(Some(rows))
    }

    /// Like [`run`](Self::run) for database-wide steps: a non-fatal failure
    /// falls back to standard introspection instead of degrading a table.
    async fn run_or_standard(
        &self,
        statement: Option<&Statement>,
        step: &str,
    ) -> Result<Option<Vec<MetaRow>>> {
        match self.run(statement, None).await {
            Err(error) if !error.is_fatal() => {
                tracing::warn!(
                    "{} {} statement failed, using standard introspection: {}",
                    self.base.engine.code,
                    step,
                    error
                );
                Ok(None)
            }
            result => result,
        }
    }
}

impl std::fmt::Debug for DialectQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectQuery")
            .field("engine", &self.base.engine.code)
            .field("catalog", &self.base.catalog)
            .field("schema", &self.base.schema)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetadataQuery for DialectQuery {
    fn engine(&self) -> &'static EngineIdentity {
        self.base.engine
    }

    async fn database(&self) -> Result<DatabaseFacts> {
        let rows = self
            .run_or_standard(self.statements.database.as_ref(), "database")
            .await?;
        let name = rows
            .as_deref()
            .and_then(<[MetaRow]>::first)
            .and_then(MetaRow::first)
            .filter(|name| !name.trim().is_empty())
            .map_or_else(|| self.base.database_name(), str::to_string);
        Ok(DatabaseFacts::new(name))
    }

    async fn discover_tables(&self) -> Result<Vec<TableFacts>> {
        match self
            .run_or_standard(self.statements.tables.as_ref(), "tables")
            .await?
        {
            Some(rows) => Ok(tables_from_rows(&rows)),
            None => self.base.standard_tables().await,
        }
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnFacts>> {
        match self.run(self.statements.columns.as_ref(), Some(table)).await? {
            Some(rows) => Ok(columns_from_rows(&rows, self.base.dialect())),
            None => self.base.standard_columns(table).await,
        }
    }

    async fn primary_keys(&self, table: &str) -> Result<Vec<String>> {
        match self
            .run(self.statements.primary_keys.as_ref(), Some(table))
            .await?
        {
            Some(rows) => Ok(keys_from_rows(&rows)),
            None => self.base.standard_primary_keys(table).await,
        }
    }
}
