// ABOUTME: Wrapper for the mysqldump command used to export a database
// ABOUTME: Builds the argument vector, credentials file and timestamped output path

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::{Child, Command};

use crate::config::{ConnectionSettings, DumpConfig};

/// External dump utility invoked for every backup
pub const DUMP_PROGRAM: &str = "mysqldump";

/// Prefix of generated dump files, followed by a `YYYYMMDDHHMMSS` timestamp
pub const DUMP_FILE_PREFIX: &str = "asa_";

/// Name of the dump file for a run started at `started_at`
///
/// # Examples
///
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use mysql_backup_monitor::export::dump_file_name;
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(dump_file_name(&at), "asa_20240309140507.sql");
/// ```
pub fn dump_file_name<Tz: TimeZone>(started_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}{}.sql",
        DUMP_FILE_PREFIX,
        started_at.format("%Y%m%d%H%M%S")
    )
}

/// One `--ignore-table=<schema>.<table>` flag per table, in input order
pub fn ignore_table_flags(schema: &str, tables: &[String]) -> Vec<String> {
    tables
        .iter()
        .map(|table| format!("--ignore-table={}.{}", schema, table))
        .collect()
}

/// Private MySQL option file holding the dump password
///
/// Passing the password through `--defaults-extra-file` keeps it off the
/// process list. The file is created with owner-only permissions and removed
/// when this value is dropped, so it must outlive the child process.
pub struct MySqlOptionFile {
    file: NamedTempFile,
}

impl MySqlOptionFile {
    pub fn new(settings: &ConnectionSettings) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("mysql-backup-monitor-")
            .suffix(".cnf")
            .tempfile()
            .context("Failed to create temporary MySQL option file")?;

        writeln!(file, "[client]").context("Failed to write MySQL option file")?;
        writeln!(file, "password=\"{}\"", escape_option_value(&settings.password))
            .context("Failed to write MySQL option file")?;
        file.flush().context("Failed to write MySQL option file")?;

        tracing::debug!("Created MySQL option file at {}", file.path().display());

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Escape a value for a double-quoted MySQL option file entry
fn escape_option_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Fully resolved dump invocation
#[derive(Debug, Clone, PartialEq)]
pub struct DumpPlan {
    pub program: String,
    pub args: Vec<String>,
    pub output_path: PathBuf,
}

impl DumpPlan {
    /// Build the `mysqldump` argument vector for `config`
    ///
    /// `--defaults-extra-file` must come first, as mysqldump requires. The
    /// schema is the final positional argument.
    pub fn new(config: &DumpConfig, option_file: &Path, output_path: PathBuf) -> Self {
        let conn = &config.connection;

        let mut args = vec![
            format!("--defaults-extra-file={}", option_file.display()),
            "--host".to_string(),
            conn.host.clone(),
            "--port".to_string(),
            conn.port.to_string(),
            "--user".to_string(),
            conn.user.clone(),
        ];
        args.extend(ignore_table_flags(&conn.database, &config.ignore_tables));
        args.push(conn.database.clone());

        Self {
            program: DUMP_PROGRAM.to_string(),
            args,
            output_path,
        }
    }

    /// Arguments that exclude tables from the dump
    pub fn exclusion_args(&self) -> Vec<&str> {
        self.args
            .iter()
            .filter(|a| a.starts_with("--ignore-table="))
            .map(String::as_str)
            .collect()
    }

    /// Printable command line; credentials live in the option file, not here
    pub fn display_command(&self) -> String {
        format!(
            "{} {} > {}",
            self.program,
            self.args.join(" "),
            self.output_path.display()
        )
    }

    /// Start the dump as a child process without waiting for it
    ///
    /// Stdout is redirected into a newly created output file; an existing file
    /// is never overwritten, and the new file is removed again if the program
    /// cannot be started. Stderr is piped for the monitor to collect. The
    /// child is killed if its handle is dropped before it is reaped.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file cannot be created or the dump
    /// program cannot be started.
    pub fn spawn(&self) -> Result<Child> {
        let output = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.output_path)
            .with_context(|| {
                format!(
                    "Failed to create dump output file {}",
                    self.output_path.display()
                )
            })?;

        tracing::info!("Starting dump: {}", self.display_command());

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(output))
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => Ok(child),
            Err(e) => {
                // Nothing was written, so the empty file is ours to remove
                if let Err(remove_err) = std::fs::remove_file(&self.output_path) {
                    tracing::warn!(
                        "Failed to remove empty dump file {}: {}",
                        self.output_path.display(),
                        remove_err
                    );
                }
                Err(e).with_context(|| {
                    format!(
                        "Failed to execute {}. Is the MySQL client installed?\n\
                         Install with:\n\
                         - Ubuntu/Debian: sudo apt-get install mysql-client\n\
                         - macOS: brew install mysql-client\n\
                         - RHEL/CentOS: sudo yum install mysql",
                        self.program
                    )
                })
            }
        }
    }
}
