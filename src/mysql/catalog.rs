// ABOUTME: Read-only INFORMATION_SCHEMA queries used for size estimation
// ABOUTME: Fetches per-table storage footprint and checks schema existence

use anyhow::{Context, Result};
use mysql_async::{prelude::*, Conn, Params, Value};

/// Storage footprint of one table as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTableSize {
    pub name: String,
    /// `data_length + index_length` in bytes
    pub total_bytes: u64,
}

/// Build the per-table size query
///
/// With `excluded_count == 0` no exclusion clause is added; otherwise one
/// bound placeholder is emitted per excluded table.
pub fn table_size_query(excluded_count: usize) -> String {
    let mut query = String::from(
        "SELECT TABLE_NAME, \
         COALESCE(DATA_LENGTH, 0) + COALESCE(INDEX_LENGTH, 0) AS total_bytes \
         FROM INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_SCHEMA = ?",
    );

    if excluded_count > 0 {
        let placeholders = vec!["?"; excluded_count].join(", ");
        query.push_str(&format!(" AND TABLE_NAME NOT IN ({})", placeholders));
    }

    query.push_str(" ORDER BY TABLE_NAME");
    query
}

/// Fetch `data_length + index_length` for every table in `schema`
///
/// Tables in `excluded` are filtered out by the query itself. Views report no
/// storage and come back with a size of zero.
pub async fn fetch_table_sizes(
    conn: &mut Conn,
    schema: &str,
    excluded: &[String],
) -> Result<Vec<CatalogTableSize>> {
    tracing::debug!(
        "Querying table sizes for schema '{}' ({} excluded)",
        schema,
        excluded.len()
    );

    let query = table_size_query(excluded.len());
    let mut params: Vec<Value> = Vec::with_capacity(excluded.len() + 1);
    params.push(schema.into());
    params.extend(excluded.iter().map(|t| Value::from(t.as_str())));

    let rows: Vec<(String, u64)> = conn
        .exec(query, Params::Positional(params))
        .await
        .with_context(|| format!("Failed to query table sizes for database '{}'", schema))?;

    Ok(rows
        .into_iter()
        .map(|(name, total_bytes)| CatalogTableSize { name, total_bytes })
        .collect())
}

/// Check whether a schema is present in `INFORMATION_SCHEMA.SCHEMATA`
pub async fn schema_exists(conn: &mut Conn, schema: &str) -> Result<bool> {
    let count: Option<u64> = conn
        .exec_first(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.SCHEMATA WHERE SCHEMA_NAME = ?",
            (schema,),
        )
        .await
        .with_context(|| format!("Failed to look up database '{}'", schema))?;

    Ok(count.unwrap_or(0) > 0)
}
