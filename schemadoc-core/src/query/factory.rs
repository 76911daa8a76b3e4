//! Query factory.

use super::{DialectQuery, MetadataQuery, OtherQuery, QueryBase, statements_for};
use crate::Result;
use crate::connection::Connection;
use crate::error::SchemaDocError;
use crate::registry;
use std::sync::Arc;

/// Selects and instantiates the metadata query for a connection.
///
/// The connection's dialect signature is resolved against the engine
/// registry. Unrecognized signatures get the fallback query; they are never
/// an error.
///
/// # Errors
/// Returns a fatal `Connection` error if the handle cannot be reached
pub async fn create_query(connection: Arc<dyn Connection>) -> Result<Box<dyn MetadataQuery>> {
    connection.ping().await.map_err(|error| {
        if error.is_fatal() {
            error
        } else {
            SchemaDocError::connection_lost("Connection handle is unreachable", error)
        }
    })?;

    let signature = connection.signature().to_string();
    let engine = registry::resolve(&signature);
    if engine.is_fallback() {
        tracing::info!(
            "Unrecognized database '{}', using standard introspection",
            signature
        );
    } else {
        tracing::info!("Resolved database '{}' to {}", signature, engine);
    }

    let base = QueryBase::new(connection, engine).await?;
    let query: Box<dyn MetadataQuery> = match statements_for(engine.query) {
        Some(statements) => Box::new(DialectQuery::new(base, statements)),
        None => Box::new(OtherQuery::new(base)),
    };

    Ok(query)
}
