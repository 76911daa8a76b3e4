//! Document model output.
//!
//! The sanitized model is written as pretty-printed JSON for an external
//! renderer, either to a file or to stdout.

use schemadoc_core::{DocumentModel, Result, SchemaDocError};
use std::io::Write;
use std::path::Path;

/// Output path meaning stdout.
pub const STDOUT: &str = "-";

/// Serializes the model as pretty-printed JSON.
pub fn render_json(model: &DocumentModel) -> Result<String> {
    serde_json::to_string_pretty(model).map_err(|e| SchemaDocError::Serialization {
        context: "Document model serialization".to_string(),
        source: e,
    })
}

/// Writes the model to `output_path`, or to stdout for [`STDOUT`].
pub async fn save_model(model: &DocumentModel, output_path: &Path) -> Result<()> {
    let json_data = render_json(model)?;

    if output_path == Path::new(STDOUT) {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", json_data)
            .and_then(|()| stdout.flush())
            .map_err(|e| SchemaDocError::Io {
                context: "Failed to write to stdout".to_string(),
                source: e,
            })?;
        return Ok(());
    }

    tokio::fs::write(output_path, json_data)
        .await
        .map_err(|e| SchemaDocError::Io {
            context: format!("Failed to write to {}", output_path.display()),
            source: e,
        })?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use schemadoc_core::{ColumnFacts, DatabaseFacts, TableFacts};

    fn model() -> DocumentModel {
        let mut table = TableFacts::new("orders", None);
        table.columns.push(ColumnFacts::new(1, "id", "integer"));
        DocumentModel {
            title: "Shop".to_string(),
            version: "1.0.0".to_string(),
            database: DatabaseFacts::new("main"),
            tables: vec![table],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_keeps_absent_remarks_null() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&model()).unwrap()).unwrap();
        assert_eq!(json["title"], "Shop");
        assert!(json["tables"][0]["remarks"].is_null());
        assert_eq!(json["tables"][0]["columns"][0]["name"], "id");
    }

    #[tokio::test]
    async fn test_save_model_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.json");

        save_model(&model(), &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: DocumentModel = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, model());
    }

    #[tokio::test]
    async fn test_save_model_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("shop.json");

        let error = save_model(&model(), &path).await.unwrap_err();
        assert!(error.to_string().contains("shop.json"));
    }
}
