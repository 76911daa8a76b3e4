//! Engine-specific introspection statements.
//!
//! Each statement is written in its engine's own SQL and placeholder syntax
//! and projects the standard result labels. A `None` statement means the
//! engine is served by the standard introspection call for that step.

use crate::registry::QueryKind;

/// Value bound to a statement placeholder, in placeholder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Name of the table being introspected
    Table,
    /// Current schema of the connection
    Schema,
    /// Current catalog of the connection
    Catalog,
}

/// Case folding the engine applies to unquoted namespace names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierCase {
    AsIs,
    Upper,
    Lower,
}

impl IdentifierCase {
    /// Folds a namespace name the way the engine stores it.
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::AsIs => name.to_string(),
            Self::Upper => name.to_uppercase(),
            Self::Lower => name.to_lowercase(),
        }
    }
}

/// One introspection statement with its bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement {
    pub sql: &'static str,
    pub params: &'static [Param],
}

/// Statement table of one engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectStatements {
    /// Returns the database name in its first column
    pub database: Option<Statement>,
    pub tables: Option<Statement>,
    pub columns: Option<Statement>,
    pub primary_keys: Option<Statement>,
    pub identifier_case: IdentifierCase,
}

/// Statement table for a query kind; `None` for the fallback query.
pub fn statements_for(kind: QueryKind) -> Option<&'static DialectStatements> {
    match kind {
        QueryKind::MySql | QueryKind::MariaDb => Some(&MYSQL),
        QueryKind::PostgreSql | QueryKind::HighGo => Some(&POSTGRESQL),
        QueryKind::Sqlite => Some(&SQLITE),
        QueryKind::Oracle | QueryKind::Dm => Some(&ORACLE),
        QueryKind::SqlServer => Some(&SQL_SERVER),
        QueryKind::Db2 => Some(&DB2),
        QueryKind::H2 => Some(&H2),
        QueryKind::Hsql => Some(&HSQL),
        QueryKind::CacheDb => Some(&CACHE_DB),
        QueryKind::Other => None,
    }
}

static MYSQL: DialectStatements = DialectStatements {
    database: Some(Statement {
        sql: "SELECT DATABASE() AS DATABASE_NAME",
        params: &[],
    }),
    tables: Some(Statement {
        sql: "SELECT TABLE_NAME, TABLE_COMMENT AS REMARKS \
              FROM information_schema.TABLES \
              WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
              ORDER BY TABLE_NAME",
        params: &[Param::Catalog],
    }),
    columns: Some(Statement {
        sql: "SELECT COLUMN_NAME, CAST(ORDINAL_POSITION AS CHAR) AS ORDINAL_POSITION, \
              COLUMN_TYPE AS DATA_TYPE, DATA_TYPE AS TYPE_NAME, \
              CAST(COALESCE(CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION) AS CHAR) AS COLUMN_SIZE, \
              CAST(NUMERIC_SCALE AS CHAR) AS DECIMAL_DIGITS, \
              IS_NULLABLE, COLUMN_DEFAULT AS COLUMN_DEF, COLUMN_COMMENT AS REMARKS \
              FROM information_schema.COLUMNS \
              WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
              ORDER BY ORDINAL_POSITION",
        params: &[Param::Catalog, Param::Table],
    }),
    primary_keys: None,
    identifier_case: IdentifierCase::AsIs,
};

static POSTGRESQL: DialectStatements = DialectStatements {
    database: Some(Statement {
        sql: "SELECT current_database()::text AS database_name",
        params: &[],
    }),
    tables: Some(Statement {
        sql: "SELECT c.relname::text AS table_name, \
              obj_description(c.oid, 'pg_class')::text AS remarks \
              FROM pg_catalog.pg_class c \
              JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
              WHERE n.nspname::text = $1 AND c.relkind IN ('r', 'p') \
              ORDER BY c.relname",
        params: &[Param::Schema],
    }),
    columns: Some(Statement {
        sql: "SELECT a.attname::text AS column_name, a.attnum::text AS ordinal_position, \
              pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type, \
              t.typname::text AS type_name, \
              CASE WHEN a.attnotnull THEN 'NO' ELSE 'YES' END AS is_nullable, \
              pg_catalog.pg_get_expr(d.adbin, d.adrelid) AS column_def, \
              pg_catalog.col_description(a.attrelid, a.attnum) AS remarks \
              FROM pg_catalog.pg_attribute a \
              JOIN pg_catalog.pg_class c ON c.oid = a.attrelid \
              JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
              JOIN pg_catalog.pg_type t ON t.oid = a.atttypid \
              LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum \
              WHERE n.nspname::text = $1 AND c.relname::text = $2 \
                AND a.attnum > 0 AND NOT a.attisdropped \
              ORDER BY a.attnum",
        params: &[Param::Schema, Param::Table],
    }),
    primary_keys: Some(Statement {
        sql: "SELECT a.attname::text AS column_name, k.ord::text AS key_seq \
              FROM pg_catalog.pg_index i \
              JOIN pg_catalog.pg_class c ON c.oid = i.indrelid \
              JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
              CROSS JOIN LATERAL unnest(i.indkey) WITH ORDINALITY AS k(attnum, ord) \
              JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum \
              WHERE i.indisprimary AND n.nspname::text = $1 AND c.relname::text = $2 \
              ORDER BY k.ord",
        params: &[Param::Schema, Param::Table],
    }),
    identifier_case: IdentifierCase::AsIs,
};

static SQLITE: DialectStatements = DialectStatements {
    database: None,
    tables: Some(Statement {
        sql: "SELECT name AS TABLE_NAME, NULL AS REMARKS FROM sqlite_master \
              WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
              ORDER BY name",
        params: &[],
    }),
    columns: Some(Statement {
        sql: "SELECT cid + 1 AS ORDINAL_POSITION, name AS COLUMN_NAME, type AS DATA_TYPE, \
              CASE WHEN \"notnull\" = 0 AND pk = 0 THEN 'YES' ELSE 'NO' END AS IS_NULLABLE, \
              dflt_value AS COLUMN_DEF, NULL AS REMARKS \
              FROM pragma_table_info(?1) ORDER BY cid",
        params: &[Param::Table],
    }),
    primary_keys: None,
    identifier_case: IdentifierCase::AsIs,
};

static ORACLE: DialectStatements = DialectStatements {
    database: Some(Statement {
        sql: "SELECT SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA') AS DATABASE_NAME FROM DUAL",
        params: &[],
    }),
    tables: Some(Statement {
        sql: "SELECT t.TABLE_NAME, c.COMMENTS AS REMARKS \
              FROM ALL_TABLES t \
              LEFT JOIN ALL_TAB_COMMENTS c ON c.OWNER = t.OWNER AND c.TABLE_NAME = t.TABLE_NAME \
              WHERE t.OWNER = :1 \
              ORDER BY t.TABLE_NAME",
        params: &[Param::Schema],
    }),
    columns: Some(Statement {
        sql: "SELECT c.COLUMN_NAME, TO_CHAR(c.COLUMN_ID) AS ORDINAL_POSITION, \
              c.DATA_TYPE AS TYPE_NAME, \
              CASE WHEN c.DATA_PRECISION IS NOT NULL THEN TO_CHAR(c.DATA_PRECISION) \
                   WHEN c.CHAR_LENGTH > 0 THEN TO_CHAR(c.CHAR_LENGTH) END AS COLUMN_SIZE, \
              TO_CHAR(c.DATA_SCALE) AS DECIMAL_DIGITS, c.NULLABLE AS IS_NULLABLE, \
              c.DATA_DEFAULT AS COLUMN_DEF, m.COMMENTS AS REMARKS \
              FROM ALL_TAB_COLUMNS c \
              LEFT JOIN ALL_COL_COMMENTS m ON m.OWNER = c.OWNER \
                AND m.TABLE_NAME = c.TABLE_NAME AND m.COLUMN_NAME = c.COLUMN_NAME \
              WHERE c.OWNER = :1 AND c.TABLE_NAME = :2 \
              ORDER BY c.COLUMN_ID",
        params: &[Param::Schema, Param::Table],
    }),
    primary_keys: Some(Statement {
        sql: "SELECT cc.COLUMN_NAME, TO_CHAR(cc.POSITION) AS KEY_SEQ \
              FROM ALL_CONSTRAINTS k \
              JOIN ALL_CONS_COLUMNS cc ON cc.OWNER = k.OWNER \
                AND cc.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
              WHERE k.CONSTRAINT_TYPE = 'P' AND k.OWNER = :1 AND k.TABLE_NAME = :2 \
              ORDER BY cc.POSITION",
        params: &[Param::Schema, Param::Table],
    }),
    identifier_case: IdentifierCase::Upper,
};

static SQL_SERVER: DialectStatements = DialectStatements {
    database: Some(Statement {
        sql: "SELECT DB_NAME() AS DATABASE_NAME",
        params: &[],
    }),
    tables: Some(Statement {
        sql: "SELECT t.name AS TABLE_NAME, CAST(ep.value AS NVARCHAR(4000)) AS REMARKS \
              FROM sys.tables t \
              JOIN sys.schemas s ON s.schema_id = t.schema_id \
              LEFT JOIN sys.extended_properties ep ON ep.major_id = t.object_id \
                AND ep.minor_id = 0 AND ep.class = 1 AND ep.name = 'MS_Description' \
              WHERE s.name = @P1 \
              ORDER BY t.name",
        params: &[Param::Schema],
    }),
    columns: Some(Statement {
        sql: "SELECT c.name AS COLUMN_NAME, CAST(c.column_id AS VARCHAR(10)) AS ORDINAL_POSITION, \
              ty.name AS TYPE_NAME, \
              CAST(CASE WHEN ty.name IN ('decimal', 'numeric') THEN c.precision \
                        WHEN c.max_length = -1 THEN NULL \
                        WHEN ty.name IN ('nchar', 'nvarchar') THEN c.max_length / 2 \
                        WHEN ty.name IN ('char', 'varchar', 'binary', 'varbinary') THEN c.max_length \
                   END AS VARCHAR(10)) AS COLUMN_SIZE, \
              CAST(CASE WHEN ty.name IN ('decimal', 'numeric') THEN c.scale END AS VARCHAR(10)) \
                AS DECIMAL_DIGITS, \
              CASE WHEN c.is_nullable = 1 THEN 'YES' ELSE 'NO' END AS IS_NULLABLE, \
              OBJECT_DEFINITION(c.default_object_id) AS COLUMN_DEF, \
              CAST(ep.value AS NVARCHAR(4000)) AS REMARKS \
              FROM sys.columns c \
              JOIN sys.tables t ON t.object_id = c.object_id \
              JOIN sys.schemas s ON s.schema_id = t.schema_id \
              JOIN sys.types ty ON ty.user_type_id = c.user_type_id \
              LEFT JOIN sys.extended_properties ep ON ep.major_id = c.object_id \
                AND ep.minor_id = c.column_id AND ep.class = 1 AND ep.name = 'MS_Description' \
              WHERE s.name = @P1 AND t.name = @P2 \
              ORDER BY c.column_id",
        params: &[Param::Schema, Param::Table],
    }),
    primary_keys: None,
    identifier_case: IdentifierCase::AsIs,
};

static DB2: DialectStatements = DialectStatements {
    database: Some(Statement {
        sql: "SELECT CURRENT SERVER AS DATABASE_NAME FROM SYSIBM.SYSDUMMY1",
        params: &[],
    }),
    tables: Some(Statement {
        sql: "SELECT TABNAME AS TABLE_NAME, REMARKS FROM SYSCAT.TABLES \
              WHERE TABSCHEMA = ? AND TYPE = 'T' ORDER BY TABNAME",
        params: &[Param::Schema],
    }),
    columns: Some(Statement {
        sql: "SELECT COLNAME AS COLUMN_NAME, CAST(COLNO + 1 AS VARCHAR(10)) AS ORDINAL_POSITION, \
              TYPENAME AS TYPE_NAME, CAST(LENGTH AS VARCHAR(10)) AS COLUMN_SIZE, \
              CAST(SCALE AS VARCHAR(10)) AS DECIMAL_DIGITS, NULLS AS IS_NULLABLE, \
              DEFAULT AS COLUMN_DEF, REMARKS \
              FROM SYSCAT.COLUMNS WHERE TABSCHEMA = ? AND TABNAME = ? ORDER BY COLNO",
        params: &[Param::Schema, Param::Table],
    }),
    primary_keys: Some(Statement {
        sql: "SELECT COLNAME AS COLUMN_NAME, CAST(KEYSEQ AS VARCHAR(10)) AS KEY_SEQ \
              FROM SYSCAT.COLUMNS \
              WHERE TABSCHEMA = ? AND TABNAME = ? AND KEYSEQ IS NOT NULL ORDER BY KEYSEQ",
        params: &[Param::Schema, Param::Table],
    }),
    identifier_case: IdentifierCase::Upper,
};

static H2: DialectStatements = DialectStatements {
    database: None,
    tables: Some(Statement {
        sql: "SELECT TABLE_NAME, REMARKS FROM INFORMATION_SCHEMA.TABLES \
              WHERE TABLE_SCHEMA = ? AND TABLE_TYPE IN ('TABLE', 'BASE TABLE') \
              ORDER BY TABLE_NAME",
        params: &[Param::Schema],
    }),
    columns: Some(Statement {
        sql: "SELECT COLUMN_NAME, ORDINAL_POSITION, DATA_TYPE AS TYPE_NAME, \
              COALESCE(CHARACTER_MAXIMUM_LENGTH, NUMERIC_PRECISION) AS COLUMN_SIZE, \
              NUMERIC_SCALE AS DECIMAL_DIGITS, IS_NULLABLE, COLUMN_DEFAULT AS COLUMN_DEF, REMARKS \
              FROM INFORMATION_SCHEMA.COLUMNS \
              WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
        params: &[Param::Schema, Param::Table],
    }),
    primary_keys: None,
    identifier_case: IdentifierCase::Upper,
};

static HSQL: DialectStatements = DialectStatements {
    database: None,
    tables: Some(Statement {
        sql: "SELECT TABLE_NAME, REMARKS FROM INFORMATION_SCHEMA.SYSTEM_TABLES \
              WHERE TABLE_SCHEM = ? AND TABLE_TYPE = 'TABLE' ORDER BY TABLE_NAME",
        params: &[Param::Schema],
    }),
    columns: Some(Statement {
        sql: "SELECT COLUMN_NAME, ORDINAL_POSITION, TYPE_NAME, COLUMN_SIZE, DECIMAL_DIGITS, \
              IS_NULLABLE, COLUMN_DEF, REMARKS \
              FROM INFORMATION_SCHEMA.SYSTEM_COLUMNS \
              WHERE TABLE_SCHEM = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
        params: &[Param::Schema, Param::Table],
    }),
    primary_keys: Some(Statement {
        sql: "SELECT COLUMN_NAME, KEY_SEQ FROM INFORMATION_SCHEMA.SYSTEM_PRIMARYKEYS \
              WHERE TABLE_SCHEM = ? AND TABLE_NAME = ? ORDER BY KEY_SEQ",
        params: &[Param::Schema, Param::Table],
    }),
    identifier_case: IdentifierCase::Upper,
};

static CACHE_DB: DialectStatements = DialectStatements {
    database: None,
    tables: None,
    columns: Some(Statement {
        sql: "SELECT COLUMN_NAME, ORDINAL_POSITION, DATA_TYPE AS TYPE_NAME, \
              CHARACTER_MAXIMUM_LENGTH AS COLUMN_SIZE, NUMERIC_SCALE AS DECIMAL_DIGITS, \
              IS_NULLABLE, COLUMN_DEFAULT AS COLUMN_DEF, DESCRIPTION AS REMARKS \
              FROM INFORMATION_SCHEMA.COLUMNS \
              WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
        params: &[Param::Schema, Param::Table],
    }),
    primary_keys: None,
    identifier_case: IdentifierCase::AsIs,
};
