//! Document model assembly process.
//!
//! [`DataModelProcess`] drives one run as an explicit state machine:
//!
//! ```text
//! Init -> QueryAcquired -> DatabaseFetched -> TablesFetched -> Sanitized -> Done
//! ```
//!
//! Every transition is one-way. A failing transition aborts the run with the
//! error annotated by its [`Stage`]. The connection handle is closed exactly
//! once on every exit path.

use crate::Result;
use crate::config::Configuration;
use crate::connection::Connection;
use crate::error::Stage;
use crate::models::{DatabaseFacts, DocumentModel, TableFacts};
use crate::query::{MetadataQuery, create_query};
use crate::sanitize::sanitize_model;
use std::sync::Arc;
use std::time::Instant;

/// Assembles a sanitized [`DocumentModel`] from a database connection.
///
/// # Example
/// ```rust,no_run
/// use schemadoc_core::{Configuration, ConnectionConfig, DataModelProcess, OutputFormat, connect};
///
/// # async fn example() -> schemadoc_core::Result<()> {
/// let connection = connect("sqlite::memory:", &ConnectionConfig::default()).await?;
/// let config = Configuration::new("Inventory", "1.0.0").with_output_format(OutputFormat::Markdown);
/// let model = DataModelProcess::new(config).process(connection).await?;
/// println!("{} tables", model.tables.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DataModelProcess {
    config: Configuration,
}

enum ProcessState {
    Init,
    QueryAcquired(Box<dyn MetadataQuery>),
    DatabaseFetched {
        query: Box<dyn MetadataQuery>,
        database: DatabaseFacts,
    },
    TablesFetched(DocumentModel),
    Sanitized(DocumentModel),
    Done(DocumentModel),
}

impl ProcessState {
    /// Stage executed when leaving this state.
    const fn next_stage(&self) -> Option<Stage> {
        match self {
            Self::Init => Some(Stage::QueryAcquisition),
            Self::QueryAcquired(_) => Some(Stage::DatabaseFetch),
            Self::DatabaseFetched { .. } => Some(Stage::TableFetch),
            Self::TablesFetched(_) => Some(Stage::Sanitization),
            Self::Sanitized(_) | Self::Done(_) => None,
        }
    }
}

impl DataModelProcess {
    /// Creates a process for the given document configuration.
    pub const fn new(config: Configuration) -> Self {
        Self { config }
    }

    /// Document configuration of this process.
    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    /// Runs the process against `connection` and releases it.
    ///
    /// Tables whose introspection fails without invalidating the connection
    /// are kept with an empty column list and `degraded` set.
    ///
    /// # Errors
    /// Returns a `Configuration` error if the configuration is invalid, or a
    /// `Stage` error naming the step that failed
    pub async fn process(&self, connection: Arc<dyn Connection>) -> Result<DocumentModel> {
        let outcome = match self.config.validate() {
            Ok(()) => self.run(Arc::clone(&connection)).await,
            Err(error) => Err(error),
        };

        connection.close().await;

        if let Err(error) = &outcome {
            tracing::error!("Document model assembly failed: {}", error);
        }
        outcome
    }

    async fn run(&self, connection: Arc<dyn Connection>) -> Result<DocumentModel> {
        let started = Instant::now();
        let mut state = ProcessState::Init;

        loop {
            if let ProcessState::Done(model) = state {
                tracing::info!(
                    "Documented {} tables ({} degraded) in {:.2}s",
                    model.tables.len(),
                    model.degraded_tables().len(),
                    started.elapsed().as_secs_f64()
                );
                return Ok(model);
            }

            let stage = state.next_stage();
            let stage_started = Instant::now();

            state = self
                .advance(state, &connection)
                .await
                .map_err(|error| match stage {
                    Some(stage) => error.at_stage(stage),
                    None => error,
                })?;

            if let Some(stage) = stage {
                tracing::debug!(
                    stage = %stage,
                    elapsed_ms = u64::try_from(stage_started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "Stage completed"
                );
            }
        }
    }

    async fn advance(
        &self,
        state: ProcessState,
        connection: &Arc<dyn Connection>,
    ) -> Result<ProcessState> {
        let next = match state {
            ProcessState::Init => {
                ProcessState::QueryAcquired(create_query(Arc::clone(connection)).await?)
            }
            ProcessState::QueryAcquired(query) => {
                let database = query.database().await?;
                tracing::debug!("Documenting database '{}'", database.name);
                ProcessState::DatabaseFetched { query, database }
            }
            ProcessState::DatabaseFetched { query, database } => {
                let tables = query.tables(&self.config.process).await?;
                ProcessState::TablesFetched(self.assemble(database, tables))
            }
            ProcessState::TablesFetched(mut model) => {
                sanitize_model(&mut model, self.config.output_format)?;
                ProcessState::Sanitized(model)
            }
            ProcessState::Sanitized(model) | ProcessState::Done(model) => {
                ProcessState::Done(model)
            }
        };
        Ok(next)
    }

    fn assemble(&self, database: DatabaseFacts, tables: Vec<TableFacts>) -> DocumentModel {
        DocumentModel {
            title: self.config.title.clone(),
            organization: self.config.organization.clone(),
            organization_url: self.config.organization_url.clone(),
            version: self.config.version.clone(),
            description: self.config.description.clone(),
            database,
            tables,
        }
    }
}
