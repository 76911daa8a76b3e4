//! Native-to-common type label conversion per engine family.
//!
//! A type dialect translates a native column type string such as
//! `int(11) unsigned` into a simplified label such as `uint32`. Engines
//! without a registered dialect keep their native type strings.

use crate::registry::TypeDialectKind;

/// Converts native column type strings of one engine family.
pub trait TypeDialect: Send + Sync {
    /// Returns the simplified label, or `None` when the native type is unknown.
    fn simplify(&self, native_type: &str) -> Option<String>;
}

/// Instantiates the converter for a registered dialect.
pub fn for_kind(kind: TypeDialectKind) -> Box<dyn TypeDialect> {
    match kind {
        TypeDialectKind::MySql => Box::new(MySqlTypeDialect),
    }
}

/// Type dialect for MySQL native types.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlTypeDialect;

/// Splits `decimal(10, 2) unsigned zerofill` into its base name, the
/// parenthesized length argument and the unsigned modifier.
fn split_native_type(native_type: &str) -> (String, Option<String>, bool) {
    let lower = native_type.trim().to_lowercase();
    let unsigned = lower.split_whitespace().any(|word| word == "unsigned");

    let (head, args) = match lower.find('(') {
        Some(open) => {
            let close = lower[open..].find(')').map_or(lower.len(), |c| open + c);
            let args = lower[open + 1..close].replace(' ', "");
            (lower[..open].to_string(), Some(args))
        }
        None => (lower.clone(), None),
    };

    let base = head
        .split_whitespace()
        .filter(|word| !matches!(*word, "unsigned" | "signed" | "zerofill"))
        .collect::<Vec<_>>()
        .join(" ");

    (base, args, unsigned)
}

impl TypeDialect for MySqlTypeDialect {
    fn simplify(&self, native_type: &str) -> Option<String> {
        let (base, args, unsigned) = split_native_type(native_type);
        let integer = |bits: u8| {
            if unsigned {
                format!("uint{}", bits)
            } else {
                format!("int{}", bits)
            }
        };

        let label = match base.as_str() {
            // TINYINT(1) and BIT(1) are the conventional boolean columns
            "tinyint" if args.as_deref() == Some("1") => "boolean".to_string(),
            "bit" if args.as_deref().is_none_or(|a| a == "1") => "boolean".to_string(),
            "bool" | "boolean" => "boolean".to_string(),
            "bit" => "bits".to_string(),

            "tinyint" => integer(8),
            "smallint" => integer(16),
            "mediumint" => integer(24),
            "int" | "integer" => integer(32),
            "bigint" => integer(64),
            "year" => "year".to_string(),

            "decimal" | "numeric" | "dec" | "fixed" => "decimal".to_string(),
            "float" => "float".to_string(),
            "double" | "double precision" | "real" => "double".to_string(),

            "char" | "character" | "varchar" | "character varying" | "tinytext" | "text"
            | "mediumtext" | "longtext" => "string".to_string(),
            "enum" => "enum".to_string(),
            "set" => "set".to_string(),

            "date" => "date".to_string(),
            "time" => "time".to_string(),
            "datetime" => "datetime".to_string(),
            "timestamp" => "timestamp".to_string(),

            "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
                "binary".to_string()
            }

            "json" => "json".to_string(),
            "geometry" | "point" | "linestring" | "polygon" | "multipoint"
            | "multilinestring" | "multipolygon" | "geometrycollection" => {
                "geometry".to_string()
            }

            _ => return None,
        };

        Some(label)
    }
}
