// ABOUTME: Estimate command implementation
// ABOUTME: Measures the expected dump size and prints a per-table breakdown

use anyhow::Result;

use crate::config::DumpConfig;
use crate::export::{estimate_export_size, ExportEstimate};
use crate::utils::format_megabytes;

/// Connect, measure the export size, and disconnect
///
/// The connection is closed before this returns, so no database session is
/// held open while a dump runs.
pub async fn measure(config: &DumpConfig) -> Result<ExportEstimate> {
    let mut conn = crate::mysql::connect_mysql(&config.connection).await?;
    let result = estimate_export_size(
        &mut conn,
        &config.connection.database,
        &config.ignore_tables,
    )
    .await;
    crate::mysql::disconnect(conn).await;
    result
}

/// Print the expected dump size of the configured database
pub async fn estimate(config: &DumpConfig) -> Result<ExportEstimate> {
    let estimate = measure(config).await?;
    println!("{}", render_estimate(&estimate, &config.ignore_tables));
    Ok(estimate)
}

/// Human-readable size report, largest tables first
pub fn render_estimate(estimate: &ExportEstimate, ignored: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Database: {}\n", estimate.schema));

    let entries = estimate.largest_first();
    let width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    for entry in &entries {
        out.push_str(&format!(
            "  {:<width$}  {:>12}\n",
            entry.name,
            format_megabytes(entry.size_mb),
            width = width
        ));
    }

    if !ignored.is_empty() {
        out.push_str(&format!("Ignored: {}\n", ignored.join(", ")));
    }

    out.push_str(&format!(
        "Total: {} across {} table(s)",
        format_megabytes(estimate.total_size_mb),
        estimate.table_count()
    ));
    out
}
