//! Fallback metadata query for unrecognized engines.

use super::{MetadataQuery, QueryBase};
use crate::Result;
use crate::models::{ColumnFacts, DatabaseFacts, TableFacts};
use crate::registry::EngineIdentity;
use async_trait::async_trait;

/// Best-effort query built only on the standard introspection calls.
pub struct OtherQuery {
    base: QueryBase,
}

impl OtherQuery {
    pub(crate) fn new(base: QueryBase) -> Self {
        Self { base }
    }
}

impl std::fmt::Debug for OtherQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtherQuery")
            .field("engine", &self.base.engine.code)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetadataQuery for OtherQuery {
    fn engine(&self) -> &'static EngineIdentity {
        self.base.engine
    }

    async fn database(&self) -> Result<DatabaseFacts> {
        Ok(DatabaseFacts::new(self.base.database_name()))
    }

    async fn discover_tables(&self) -> Result<Vec<TableFacts>> {
        self.base.standard_tables().await
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnFacts>> {
        self.base.standard_columns(table).await
    }

    async fn primary_keys(&self, table: &str) -> Result<Vec<String>> {
        self.base.standard_primary_keys(table).await
    }
}
