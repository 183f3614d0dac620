//! Target-table introspection.
//!
//! Identifiers are lower-cased before lookup; the convention throughout the
//! workspace is case-insensitive identifiers.

use sqlx::PgPool;

use crate::error::{SyncError, SyncResult};

/// Introspected metadata for one target table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Column names in ordinal order.
    pub columns: Vec<String>,
    /// Primary-key column names, a subset of `columns`.
    pub primary_key: Vec<String>,
}

/// Lower-case and validate an identifier against the allow-list used for
/// every name spliced into SQL text. Schema, table and column names reach
/// this code from configuration and introspection, never from query
/// parameters, so anything outside `[a-z_][a-z0-9_]*` is refused.
pub fn sql_ident(raw: &str) -> SyncResult<String> {
    let ident = raw.to_ascii_lowercase();
    let mut chars = ident.chars();
    let head_ok = matches!(chars.next(), Some('a'..='z' | '_'));
    if head_ok && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_')) {
        Ok(ident)
    } else {
        Err(SyncError::InvalidIdentifier(raw.to_string()))
    }
}

/// Fetch the ordered column list and primary-key columns of
/// `schema.table` from the catalog. Read-only.
pub async fn table_schema(pool: &PgPool, schema: &str, table: &str) -> SyncResult<TableSchema> {
    let schema = schema.to_ascii_lowercase();
    let table = table.to_ascii_lowercase();

    let columns: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT column_name::text
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
        "#,
    )
    .bind(schema.as_str())
    .bind(table.as_str())
    .fetch_all(pool)
    .await?;

    if columns.is_empty() {
        return Err(SyncError::TableNotFound { schema, table });
    }

    // https://wiki.postgresql.org/wiki/Retrieve_primary_key_columns
    let primary_key: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT a.attname::text
        FROM pg_index i
        JOIN pg_attribute a ON a.attrelid = i.indrelid
                           AND a.attnum = ANY(i.indkey)
        WHERE i.indrelid = ($1)::regclass
        AND i.indisprimary
        "#,
    )
    .bind(format!("{schema}.{table}"))
    .fetch_all(pool)
    .await?;

    Ok(TableSchema {
        columns,
        primary_key,
    })
}
