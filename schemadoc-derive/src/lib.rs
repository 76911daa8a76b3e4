//! Derive macros for SchemaDoc document models.
//!
//! `#[derive(Sanitize)]` classifies every named field of a struct at compile
//! time so the sanitization engine can reach each textual attribute without
//! hand-written accessors per model type.

use proc_macro::TokenStream;

mod sanitize;

/// Derives `schemadoc_core::sanitize::Sanitize` for a struct with named fields.
///
/// Field handling:
/// - `String`, `Option<String>` and `Vec<String>` are textual and passed to the
///   transformation (absent options are skipped)
/// - `#[sanitizer(nested)]` recurses into a field whose type implements `Sanitize`
///   (including `Vec<T>` and `Option<T>` of such types)
/// - `#[sanitizer(skip)]` leaves a textual field untouched
/// - every other field is left untouched
#[proc_macro_derive(Sanitize, attributes(sanitizer))]
pub fn derive_sanitize(input: TokenStream) -> TokenStream {
    sanitize::derive_sanitize(input.into()).into()
}
