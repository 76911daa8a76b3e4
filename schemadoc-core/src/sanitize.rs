//! Attribute sanitization engine.
//!
//! A sanitization pass applies one string transformation to every textual
//! attribute of a model object and recurses into nested model objects and
//! collections, mutating in place. Textual attributes are discovered by
//! `#[derive(Sanitize)]`, so new model shapes need no per-type code.
//!
//! Traversal is depth-first with parent attributes transformed before
//! children. Absent optional values are never visited.

use crate::config::OutputFormat;
use crate::error::SchemaDocError;
use crate::models::DocumentModel;
use crate::Result;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

pub use schemadoc_derive::Sanitize;

/// Model objects whose textual attributes can be rewritten in place.
pub trait Sanitize {
    /// Passes every present textual attribute to `apply`, own attributes first,
    /// then nested model objects in declaration order.
    fn sanitize_with(&mut self, apply: &mut dyn FnMut(&mut String));
}

impl<T: Sanitize> Sanitize for Vec<T> {
    fn sanitize_with(&mut self, apply: &mut dyn FnMut(&mut String)) {
        for item in self.iter_mut() {
            item.sanitize_with(apply);
        }
    }
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize_with(&mut self, apply: &mut dyn FnMut(&mut String)) {
        if let Some(inner) = self.as_mut() {
            inner.sanitize_with(apply);
        }
    }
}

impl<T: Sanitize + ?Sized> Sanitize for Box<T> {
    fn sanitize_with(&mut self, apply: &mut dyn FnMut(&mut String)) {
        (**self).sanitize_with(apply);
    }
}

/// Built-in string transformations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    /// Strip leading and trailing whitespace
    Trim,
    /// Replace the five XML special characters with entities
    EscapeXml,
    /// Replace characters that break markdown table cells
    ReplaceBlank,
}

impl Transformation {
    /// Applies the transformation, borrowing when nothing changes.
    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self {
            Self::Trim => trim(value),
            Self::EscapeXml => escape_xml(value),
            Self::ReplaceBlank => replace_blank(value),
        }
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trim => write!(f, "trim"),
            Self::EscapeXml => write!(f, "escape-xml"),
            Self::ReplaceBlank => write!(f, "replace-blank"),
        }
    }
}

/// Runs one sanitization pass with a caller-supplied transformation.
pub fn sanitize<T, F>(value: &mut T, transform: F)
where
    T: Sanitize + ?Sized,
    F: Fn(&str) -> Cow<'_, str>,
{
    value.sanitize_with(&mut |text: &mut String| {
        let changed = match transform(text.as_str()) {
            Cow::Borrowed(_) => None,
            Cow::Owned(changed) => Some(changed),
        };
        if let Some(changed) = changed {
            *text = changed;
        }
    });
}

/// Runs one sanitization pass with a built-in transformation.
pub fn apply_transformation<T>(value: &mut T, transformation: Transformation)
where
    T: Sanitize + ?Sized,
{
    sanitize(value, |text| transformation.apply(text));
}

/// Prepares an assembled model for rendering in `format`.
///
/// Trim always runs first, followed by at most one format-specific pass.
///
/// # Errors
/// Returns `SanitizationInputInvalid` when the model has no title or a table
/// or column has no name.
pub fn sanitize_model(model: &mut DocumentModel, format: OutputFormat) -> Result<()> {
    apply_transformation(model, Transformation::Trim);
    validate_model(model)?;

    if let Some(pass) = format.format_pass() {
        tracing::debug!("Applying {} pass for {} output", pass, format);
        apply_transformation(model, pass);
    }

    Ok(())
}

fn validate_model(model: &DocumentModel) -> Result<()> {
    if model.title.is_empty() {
        return Err(SchemaDocError::invalid_sanitization_input(
            "document has no title",
        ));
    }
    for (index, table) in model.tables.iter().enumerate() {
        if table.name.is_empty() {
            return Err(SchemaDocError::invalid_sanitization_input(format!(
                "table at position {} has no name",
                index
            )));
        }
        if let Some(column) = table.columns.iter().find(|c| c.name.is_empty()) {
            return Err(SchemaDocError::invalid_sanitization_input(format!(
                "column {} of table '{}' has no name",
                column.ordinal_position, table.name
            )));
        }
    }
    Ok(())
}

/// Strips leading and trailing whitespace.
pub fn trim(value: &str) -> Cow<'_, str> {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(trimmed.to_string())
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'` as XML entities.
pub fn escape_xml(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 16);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Reverses [`escape_xml`].
///
/// Unknown entities are kept verbatim.
pub fn unescape_xml(value: &str) -> Cow<'_, str> {
    const ENTITIES: [(&str, char); 5] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&apos;", '\''),
    ];

    if !value.contains('&') {
        return Cow::Borrowed(value);
    }

    let mut unescaped = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        unescaped.push_str(&rest[..start]);
        rest = &rest[start..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                unescaped.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                unescaped.push('&');
                rest = &rest[1..];
            }
        }
    }
    unescaped.push_str(rest);
    Cow::Owned(unescaped)
}

/// Placeholder written in place of the markdown cell delimiter.
pub const CELL_DELIMITER_PLACEHOLDER: &str = "&#124;";

#[allow(clippy::expect_used)]
fn line_breaks() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[\r\n\t]+").expect("Invalid line break pattern"))
}

/// Collapses line breaks and tabs into one space and replaces `|`.
pub fn replace_blank(value: &str) -> Cow<'_, str> {
    let spaced = line_breaks().replace_all(value, " ");
    if spaced.contains('|') {
        Cow::Owned(spaced.replace('|', CELL_DELIMITER_PLACEHOLDER))
    } else {
        spaced
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
