// ABOUTME: Dump command implementation
// ABOUTME: Estimates export size, runs mysqldump and shows live progress

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::DumpConfig;
use crate::export::{dump_file_name, monitor_dump, DumpOutcome, DumpPlan, MySqlOptionFile};
use crate::progress::DumpProgressBar;
use crate::utils::{format_duration, format_megabytes};

/// Printed once the dump process has exited successfully
pub const COMPLETION_MESSAGE: &str = "Backup completed successfully.";

/// Lines of stderr kept in a failure message
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Options for a single dump run
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Directory the `asa_<timestamp>.sql` file is written to
    pub output_dir: PathBuf,
    pub poll_interval: Duration,
    pub show_progress: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            poll_interval: crate::export::DEFAULT_POLL_INTERVAL,
            show_progress: true,
        }
    }
}

/// Run a full backup of the configured database
///
/// Steps:
/// 1. Check `mysqldump` is on PATH
/// 2. Measure the expected size, then close the database connection
/// 3. Start `mysqldump` writing to a fresh timestamped file
/// 4. Poll the file and report progress until the process exits
///
/// # Errors
///
/// Returns an error if any step fails, including a non-zero exit from
/// `mysqldump`; the error then carries the tail of its stderr.
pub async fn dump(config: &DumpConfig, options: &DumpOptions) -> Result<DumpOutcome> {
    crate::utils::check_required_tools()?;

    let estimate = super::estimate::measure(config).await?;

    let output_path = output_path_for(&options.output_dir, &chrono::Local::now());
    let option_file = MySqlOptionFile::new(&config.connection)?;
    let plan = DumpPlan::new(config, option_file.path(), output_path);

    let child = plan.spawn()?;
    let mut bar = DumpProgressBar::new(estimate.total_size_mb, options.show_progress);
    let outcome = monitor_dump(child, &plan.output_path, &mut bar, options.poll_interval)
        .await
        .context("Lost track of the running dump")?;

    // The child has exited, so the credentials file can go
    drop(option_file);

    if !outcome.success() {
        bail!(
            "mysqldump exited with {} for database '{}'. Output so far is in {}.\n\
             \n\
             {}",
            outcome.status,
            config.connection.database,
            outcome.output_path.display(),
            diagnostic_tail(&outcome.diagnostics)
        );
    }

    for line in outcome.diagnostics.lines().filter(|l| !l.trim().is_empty()) {
        tracing::warn!("mysqldump: {}", line);
    }

    match outcome.ratio_to_estimate(estimate.total_size_mb) {
        Some(ratio) => tracing::info!(
            "Wrote {} to {} in {} ({:.0}% of the {} estimate)",
            format_megabytes(outcome.final_size_mb),
            outcome.output_path.display(),
            format_duration(outcome.elapsed),
            ratio * 100.0,
            format_megabytes(estimate.total_size_mb)
        ),
        None => tracing::info!(
            "Wrote {} to {} in {}",
            format_megabytes(outcome.final_size_mb),
            outcome.output_path.display(),
            format_duration(outcome.elapsed)
        ),
    }

    println!("{}", COMPLETION_MESSAGE);
    Ok(outcome)
}

/// Path of the dump file for a run started at `started_at`
pub fn output_path_for<Tz: chrono::TimeZone>(
    output_dir: &Path,
    started_at: &chrono::DateTime<Tz>,
) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    output_dir.join(dump_file_name(started_at))
}

/// Last few non-empty stderr lines, for error messages
fn diagnostic_tail(diagnostics: &str) -> String {
    let lines: Vec<&str> = diagnostics
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return "mysqldump produced no error output".to_string();
    }

    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    format!("mysqldump output:\n{}", lines[start..].join("\n"))
}
