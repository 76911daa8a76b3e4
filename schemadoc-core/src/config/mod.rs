//! Configuration types.
//!
//! - `Configuration`: document metadata, output format and process settings
//! - `ProcessConfig`: table selection and fetch concurrency
//! - `ConnectionConfig`: settings consumed by the sqlx transports
//!
//! # Security
//! These structs intentionally do NOT store passwords or credentials.

mod connection;
mod document;
mod process;

pub use connection::ConnectionConfig;
pub use document::{Configuration, OutputFormat};
pub use process::ProcessConfig;
