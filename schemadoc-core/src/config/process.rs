//! Table selection and fetch settings for the assembly process.

use serde::{Deserialize, Serialize};

const MAX_TABLE_CONCURRENCY: usize = 32;

/// Which tables are documented and how their columns are fetched.
///
/// Designated lists narrow the run to matching tables whenever any of them is
/// non-empty. Ignored lists always exclude. Matching is exact and
/// case-sensitive, the way the engine reports the names.
///
/// # Example
/// ```rust
/// use schemadoc_core::config::ProcessConfig;
///
/// let config = ProcessConfig::default()
///     .designate_prefix("order")
///     .ignore_suffix("_bak");
///
/// assert!(config.selects("order_items"));
/// assert!(!config.selects("order_items_bak"));
/// assert!(!config.selects("customers"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub designated_table_names: Vec<String>,
    pub designated_table_prefixes: Vec<String>,
    pub designated_table_suffixes: Vec<String>,
    pub ignored_table_names: Vec<String>,
    pub ignored_table_prefixes: Vec<String>,
    pub ignored_table_suffixes: Vec<String>,
    /// Number of tables whose columns and keys are fetched concurrently
    pub table_concurrency: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            designated_table_names: Vec::new(),
            designated_table_prefixes: Vec::new(),
            designated_table_suffixes: Vec::new(),
            ignored_table_names: Vec::new(),
            ignored_table_prefixes: Vec::new(),
            ignored_table_suffixes: Vec::new(),
            table_concurrency: 1,
        }
    }
}

impl ProcessConfig {
    /// Validates process settings.
    ///
    /// # Errors
    /// Returns error if the table concurrency is outside `1..=32`
    pub fn validate(&self) -> crate::Result<()> {
        if !(1..=MAX_TABLE_CONCURRENCY).contains(&self.table_concurrency) {
            return Err(crate::error::SchemaDocError::configuration(format!(
                "table_concurrency must be between 1 and {}",
                MAX_TABLE_CONCURRENCY
            )));
        }
        Ok(())
    }

    /// Whether any designated list is set.
    pub fn has_designations(&self) -> bool {
        !self.designated_table_names.is_empty()
            || !self.designated_table_prefixes.is_empty()
            || !self.designated_table_suffixes.is_empty()
    }

    /// Whether the table named `name` is documented.
    pub fn selects(&self, name: &str) -> bool {
        if self.is_ignored(name) {
            return false;
        }
        !self.has_designations() || self.is_designated(name)
    }

    fn is_designated(&self, name: &str) -> bool {
        self.designated_table_names.iter().any(|n| n == name)
            || self
                .designated_table_prefixes
                .iter()
                .any(|p| name.starts_with(p.as_str()))
            || self
                .designated_table_suffixes
                .iter()
                .any(|s| name.ends_with(s.as_str()))
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored_table_names.iter().any(|n| n == name)
            || self
                .ignored_table_prefixes
                .iter()
                .any(|p| name.starts_with(p.as_str()))
            || self
                .ignored_table_suffixes
                .iter()
                .any(|s| name.ends_with(s.as_str()))
    }

    /// Builder method to document a table by exact name.
    pub fn designate_table(mut self, name: impl Into<String>) -> Self {
        self.designated_table_names.push(name.into());
        self
    }

    /// Builder method to document tables starting with `prefix`.
    pub fn designate_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.designated_table_prefixes.push(prefix.into());
        self
    }

    /// Builder method to document tables ending with `suffix`.
    pub fn designate_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.designated_table_suffixes.push(suffix.into());
        self
    }

    /// Builder method to skip a table by exact name.
    pub fn ignore_table(mut self, name: impl Into<String>) -> Self {
        self.ignored_table_names.push(name.into());
        self
    }

    /// Builder method to skip tables starting with `prefix`.
    pub fn ignore_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_table_prefixes.push(prefix.into());
        self
    }

    /// Builder method to skip tables ending with `suffix`.
    pub fn ignore_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.ignored_table_suffixes.push(suffix.into());
        self
    }

    /// Builder method to set the table fetch concurrency.
    pub fn with_table_concurrency(mut self, table_concurrency: usize) -> Self {
        self.table_concurrency = table_concurrency;
        self
    }
}
