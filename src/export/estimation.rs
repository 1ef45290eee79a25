// ABOUTME: Expected dump size estimation from catalog metadata
// ABOUTME: Sums per-table data and index footprint, leaving out ignored tables

use anyhow::{bail, Context, Result};
use mysql_async::Conn;
use std::collections::BTreeMap;

use crate::mysql::catalog::{self, CatalogTableSize};
use crate::utils::{bytes_to_megabytes, round_to_hundredths};

/// Size of one exported table in megabytes, rounded to two decimals
#[derive(Debug, Clone, PartialEq)]
pub struct TableSizeEntry {
    pub name: String,
    pub size_mb: f64,
}

impl TableSizeEntry {
    pub fn new(name: impl Into<String>, size_mb: f64) -> Self {
        Self {
            name: name.into(),
            size_mb: round_to_hundredths(size_mb.max(0.0)),
        }
    }
}

impl From<CatalogTableSize> for TableSizeEntry {
    fn from(table: CatalogTableSize) -> Self {
        Self::new(table.name, bytes_to_megabytes(table.total_bytes))
    }
}

/// Expected size of a dump, computed once before the dump starts
#[derive(Debug, Clone, PartialEq)]
pub struct ExportEstimate {
    pub schema: String,
    /// Sum of the rounded per-table sizes
    pub total_size_mb: f64,
    pub per_table: BTreeMap<String, f64>,
}

impl ExportEstimate {
    pub fn table_count(&self) -> usize {
        self.per_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_table.is_empty()
    }

    /// Tables ordered from largest to smallest, ties broken by name
    pub fn largest_first(&self) -> Vec<TableSizeEntry> {
        let mut entries: Vec<TableSizeEntry> = self
            .per_table
            .iter()
            .map(|(name, size)| TableSizeEntry::new(name.clone(), *size))
            .collect();
        entries.sort_by(|a, b| {
            b.size_mb
                .total_cmp(&a.size_mb)
                .then_with(|| a.name.cmp(&b.name))
        });
        entries
    }
}

/// Combine per-table sizes into an estimate, dropping excluded tables
///
/// The total is the sum of the sizes of tables not named in `excluded`, and
/// the per-table map holds exactly those tables.
pub fn summarize_table_sizes<I>(schema: &str, tables: I, excluded: &[String]) -> ExportEstimate
where
    I: IntoIterator<Item = TableSizeEntry>,
{
    let mut per_table = BTreeMap::new();
    let mut total_size_mb = 0.0;

    for entry in tables {
        if excluded.iter().any(|t| t == &entry.name) {
            continue;
        }
        total_size_mb += entry.size_mb;
        per_table.insert(entry.name, entry.size_mb);
    }

    ExportEstimate {
        schema: schema.to_string(),
        total_size_mb: round_to_hundredths(total_size_mb),
        per_table,
    }
}

/// Estimate the size of a dump of `schema` without the `excluded` tables
///
/// Issues one read-only query against `INFORMATION_SCHEMA.TABLES`; table data
/// is never scanned. When the catalog returns no rows the schema's existence
/// is checked: a missing schema is an error, an existing one with nothing to
/// export yields a zero estimate and a warning.
///
/// # Errors
///
/// Returns an error if the schema name is invalid, the catalog query fails,
/// or the schema does not exist.
///
/// # Examples
///
/// ```no_run
/// # use mysql_backup_monitor::export::estimate_export_size;
/// # async fn example(conn: &mut mysql_async::Conn) -> anyhow::Result<()> {
/// let excluded = vec!["logs".to_string()];
/// let estimate = estimate_export_size(conn, "shop", &excluded).await?;
/// println!("{} tables, {:.2} MB", estimate.table_count(), estimate.total_size_mb);
/// # Ok(())
/// # }
/// ```
pub async fn estimate_export_size(
    conn: &mut Conn,
    schema: &str,
    excluded: &[String],
) -> Result<ExportEstimate> {
    crate::utils::validate_mysql_identifier(schema).context("Invalid database name")?;

    tracing::info!("Estimating export size for database '{}'", schema);

    let rows = catalog::fetch_table_sizes(conn, schema, excluded).await?;

    if rows.is_empty() {
        if !catalog::schema_exists(conn, schema).await? {
            bail!(
                "Database '{}' does not exist on the server",
                crate::utils::sanitize_identifier(schema)
            );
        }
        tracing::warn!(
            "Database '{}' has no tables left to export after exclusions; estimate is 0 MB",
            schema
        );
    }

    let estimate = summarize_table_sizes(schema, rows.into_iter().map(TableSizeEntry::from), excluded);

    tracing::info!(
        "Estimated export size: {} across {} table(s)",
        crate::utils::format_megabytes(estimate.total_size_mb),
        estimate.table_count()
    );
    for (name, size) in &estimate.per_table {
        tracing::debug!("  {}.{}: {:.2} MB", schema, name, size);
    }

    Ok(estimate)
}
