//! Document configuration and target output format.

use super::ProcessConfig;
use crate::sanitize::Transformation;
use serde::{Deserialize, Serialize};

/// Target output format of the external renderer.
///
/// The format decides which format-specific sanitization pass runs after trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// HTML renderer, no format-specific pass
    #[default]
    Html,
    /// Word (XML-based) renderer, markup-escaped
    Word,
    /// Markdown renderer, blank-substituted
    Markdown,
}

impl OutputFormat {
    /// The single format-specific pass for this format, if any.
    pub fn format_pass(self) -> Option<Transformation> {
        match self {
            Self::Html => None,
            Self::Word => Some(Transformation::EscapeXml),
            Self::Markdown => Some(Transformation::ReplaceBlank),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Html => write!(f, "HTML"),
            Self::Word => write!(f, "Word"),
            Self::Markdown => write!(f, "Markdown"),
        }
    }
}

/// Configuration for one documentation run.
///
/// # Example
/// ```rust
/// use schemadoc_core::config::{Configuration, OutputFormat};
///
/// let config = Configuration::new("Shop schema", "1.0.0")
///     .with_organization("Acme", Some("https://acme.example".to_string()))
///     .with_output_format(OutputFormat::Markdown);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub title: String,
    pub organization: Option<String>,
    pub organization_url: Option<String>,
    pub version: String,
    pub description: Option<String>,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub process: ProcessConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            title: "Database Documentation".to_string(),
            organization: None,
            organization_url: None,
            version: "1.0.0".to_string(),
            description: None,
            output_format: OutputFormat::default(),
            process: ProcessConfig::default(),
        }
    }
}

impl Configuration {
    /// Creates a configuration with the given title and document version.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if the title is blank or the process settings are invalid
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::error::SchemaDocError::configuration(
                "title cannot be empty",
            ));
        }

        self.process.validate()
    }

    /// Builder method to set the organization and its URL.
    pub fn with_organization(
        mut self,
        organization: impl Into<String>,
        organization_url: Option<String>,
    ) -> Self {
        self.organization = Some(organization.into());
        self.organization_url = organization_url;
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the output format.
    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = output_format;
        self
    }

    /// Builder method to set the process configuration.
    pub fn with_process(mut self, process: ProcessConfig) -> Self {
        self.process = process;
        self
    }
}
