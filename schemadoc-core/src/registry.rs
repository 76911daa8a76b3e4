//! Static registry of supported engine families.
//!
//! The registry is read-only process-wide state. Lookups never fail: a
//! signature that matches no engine code resolves to [`OTHER`], whose query
//! relies on standard introspection calls only.

use serde::Serialize;

/// Selects the metadata query implementation for an engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueryKind {
    MySql,
    MariaDb,
    Oracle,
    Db2,
    H2,
    Hsql,
    Sqlite,
    PostgreSql,
    SqlServer,
    Dm,
    HighGo,
    CacheDb,
    /// Standard introspection calls only
    Other,
}

/// Selects the type dialect converter for an engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeDialectKind {
    MySql,
}

/// One supported engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineIdentity {
    /// Engine code matched case-insensitively against dialect signatures
    pub code: &'static str,
    pub display_name: &'static str,
    pub query: QueryKind,
    pub type_dialect: Option<TypeDialectKind>,
}

impl EngineIdentity {
    const fn new(
        code: &'static str,
        display_name: &'static str,
        query: QueryKind,
        type_dialect: Option<TypeDialectKind>,
    ) -> Self {
        Self {
            code,
            display_name,
            query,
            type_dialect,
        }
    }

    /// Whether this is the fallback identity.
    pub fn is_fallback(&self) -> bool {
        self.code == OTHER.code
    }
}

impl std::fmt::Display for EngineIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.code)
    }
}

/// Fallback identity for unrecognized engines.
pub const OTHER: EngineIdentity =
    EngineIdentity::new("other", "Other database", QueryKind::Other, None);

static ENGINES: [EngineIdentity; 17] = [
    EngineIdentity::new(
        "mysql",
        "MySQL",
        QueryKind::MySql,
        Some(TypeDialectKind::MySql),
    ),
    EngineIdentity::new("mariadb", "MariaDB", QueryKind::MariaDb, None),
    EngineIdentity::new("oracle", "Oracle", QueryKind::Oracle, None),
    EngineIdentity::new("db2", "IBM DB2", QueryKind::Db2, None),
    EngineIdentity::new("h2", "H2", QueryKind::H2, None),
    EngineIdentity::new("hsql", "HyperSQL", QueryKind::Hsql, None),
    EngineIdentity::new("sqlite", "SQLite", QueryKind::Sqlite, None),
    EngineIdentity::new("PostgreSql", "PostgreSQL", QueryKind::PostgreSql, None),
    EngineIdentity::new(
        "sqlServer2005",
        "SQL Server 2005",
        QueryKind::SqlServer,
        None,
    ),
    EngineIdentity::new("sqlserver", "SQL Server", QueryKind::SqlServer, None),
    EngineIdentity::new("dm", "Dameng", QueryKind::Dm, None),
    EngineIdentity::new("highgo", "HighGo", QueryKind::HighGo, None),
    EngineIdentity::new("xugu", "XuGu", QueryKind::Other, None),
    EngineIdentity::new("kingbasees", "KingbaseES", QueryKind::Other, None),
    EngineIdentity::new("phoenix", "Phoenix HBase", QueryKind::Other, None),
    EngineIdentity::new("cachedb", "InterSystems Cache", QueryKind::CacheDb, None),
    OTHER,
];

/// All registered engine identities, fallback last.
pub fn engines() -> &'static [EngineIdentity] {
    &ENGINES
}

/// Resolves a dialect signature to its engine identity.
///
/// Matching is exact on the code and ignores ASCII case. Unmatched
/// signatures, including the empty string, resolve to [`OTHER`].
///
/// # Example
/// ```rust
/// use schemadoc_core::registry::{QueryKind, resolve};
///
/// assert_eq!(resolve("MySQL").query, QueryKind::MySql);
/// assert!(resolve("totallyUnknownDb").is_fallback());
/// ```
pub fn resolve(code: &str) -> &'static EngineIdentity {
    match ENGINES
        .iter()
        .find(|engine| engine.code.eq_ignore_ascii_case(code))
    {
        Some(engine) => engine,
        None => {
            tracing::debug!("No engine registered for '{}', using fallback", code);
            &ENGINES[ENGINES.len() - 1]
        }
    }
}
