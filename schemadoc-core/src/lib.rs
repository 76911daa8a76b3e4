//! Core metadata extraction and model sanitization for SchemaDoc.
//!
//! This crate turns a live database connection into a normalized,
//! renderer-agnostic [`DocumentModel`] and prepares it for a target output
//! format.
//!
//! # Architecture
//! - [`registry`]: static engine identities resolved from a dialect signature
//! - [`connection`]: the connection handle trait and sqlx-backed transports
//! - [`query`]: per-engine metadata queries and the factory that selects one
//! - [`process`]: the linear model assembly pipeline
//! - [`sanitize`]: derive-driven traversal applying text transformations
//!
//! # Security Guarantees
//! - All introspection statements are read-only
//! - Connection URLs are redacted before they reach logs or errors

extern crate self as schemadoc_core;

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod models;
pub mod process;
pub mod query;
pub mod registry;
pub mod sanitize;
pub mod type_dialect;

// Re-export commonly used types
pub use config::{Configuration, ConnectionConfig, OutputFormat, ProcessConfig};
pub use connection::{Connection, MetaRow, connect, signature_from_url};
pub use error::{Result, SchemaDocError, Stage};
pub use logging::init_logging;
pub use models::{ColumnFacts, DatabaseFacts, DocumentModel, TableFacts};
pub use process::DataModelProcess;
pub use query::{MetadataQuery, create_query};
pub use registry::{EngineIdentity, QueryKind, TypeDialectKind};
pub use sanitize::{Sanitize, Transformation, sanitize_model};
