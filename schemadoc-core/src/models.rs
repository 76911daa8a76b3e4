//! Normalized document model.
//!
//! These records are populated the same way for every source dialect and are
//! handed read-only to external renderers once sanitization has completed.
//! Every record derives [`Sanitize`](crate::sanitize::Sanitize) so the
//! sanitization passes reach all textual attributes without per-type code.

use crate::sanitize::Sanitize;
use serde::{Deserialize, Serialize};

/// Database level facts, produced once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Sanitize)]
pub struct DatabaseFacts {
    pub name: String,
}

impl DatabaseFacts {
    /// Creates database facts for the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Column facts in native ordinal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Sanitize)]
pub struct ColumnFacts {
    /// 1-based position of the column in its table
    pub ordinal_position: u32,
    pub name: String,
    /// Native type as reported by the engine, e.g. `varchar(255)`
    pub data_type: String,
    /// Common type label from the engine's type dialect, when one is registered
    pub simplified_type: Option<String>,
    pub column_size: Option<u32>,
    pub decimal_digits: Option<u32>,
    pub nullable: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
    pub remarks: Option<String>,
}

impl ColumnFacts {
    /// Creates a nullable column with no optional metadata.
    pub fn new(ordinal_position: u32, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            ordinal_position,
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            ..Default::default()
        }
    }

    /// The simplified type when known, the native type otherwise.
    pub fn effective_type(&self) -> &str {
        self.simplified_type.as_deref().unwrap_or(&self.data_type)
    }

    /// Remarks with absence rendered as the empty string.
    pub fn remarks_or_empty(&self) -> &str {
        self.remarks.as_deref().unwrap_or_default()
    }
}

/// Table facts with nested columns and the primary-key column names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Sanitize)]
pub struct TableFacts {
    pub name: String,
    pub remarks: Option<String>,
    #[sanitizer(nested)]
    pub columns: Vec<ColumnFacts>,
    pub primary_keys: Vec<String>,
    /// Set when column or key introspection failed for this table
    #[serde(default)]
    pub degraded: bool,
}

impl TableFacts {
    /// Creates a table header without columns.
    pub fn new(name: impl Into<String>, remarks: Option<String>) -> Self {
        Self {
            name: name.into(),
            remarks,
            ..Default::default()
        }
    }

    /// Remarks with absence rendered as the empty string.
    pub fn remarks_or_empty(&self) -> &str {
        self.remarks.as_deref().unwrap_or_default()
    }

    /// Finds a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnFacts> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Root object handed to renderers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Sanitize)]
pub struct DocumentModel {
    pub title: String,
    pub organization: Option<String>,
    pub organization_url: Option<String>,
    pub version: String,
    pub description: Option<String>,
    #[sanitizer(nested)]
    pub database: DatabaseFacts,
    #[sanitizer(nested)]
    pub tables: Vec<TableFacts>,
}

impl DocumentModel {
    /// Finds a table by exact name.
    pub fn table(&self, name: &str) -> Option<&TableFacts> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.columns.len()).sum()
    }

    /// Names of tables whose introspection was degraded.
    pub fn degraded_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|table| table.degraded)
            .map(|table| table.name.as_str())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[path = "models_tests.rs"]
mod tests;
