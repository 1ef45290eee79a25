// ABOUTME: Loads dump settings from a KEY=VALUE env file
// ABOUTME: Converts DB_* entries into a validated DumpConfig

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Default MySQL TCP port used when `DB_PORT` is absent
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Connection parameters shared by the size estimator and the dump command
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Schema (database) to estimate and dump
    pub database: String,
}

/// Everything a single backup run needs, built once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct DumpConfig {
    pub connection: ConnectionSettings,
    /// Tables left out of both the estimate and the dump, in file order
    pub ignore_tables: Vec<String>,
}

/// Load a `DumpConfig` from an env file
///
/// Reads `DB_USERNAME`, `DB_PASSWORD`, `DB_DATABASE`, `DB_HOST`,
/// `DB_IGNORE_TABLES` and the optional `DB_PORT`. Quoted values are unquoted
/// by the parser. Values are taken literally: a `$` that the parser would
/// expand as a variable is rejected, so the process environment is neither
/// read nor modified.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a value contains an
/// unquoted `$`, a required key is missing, `DB_PORT` is not a valid port, or
/// the database or any ignored table name is not a usable identifier.
pub fn load_dump_config(path: &Path) -> Result<DumpConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    reject_variable_expansion(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    let mut values = HashMap::new();
    for entry in dotenvy::from_read_iter(contents.as_bytes()) {
        let (key, value) = entry
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        values.insert(key, value);
    }

    let config = DumpConfig::from_values(&values)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    tracing::debug!(
        "Loaded config for database '{}' on {}:{} ({} ignored table(s))",
        config.connection.database,
        config.connection.host,
        config.connection.port,
        config.ignore_tables.len()
    );

    Ok(config)
}

impl DumpConfig {
    /// Build a config from already-parsed key/value pairs
    pub fn from_values(values: &HashMap<String, String>) -> Result<Self> {
        let host = required(values, "DB_HOST")?;
        let user = required(values, "DB_USERNAME")?;
        // An empty password is legal for local accounts, but the key must be present
        let password = values
            .get("DB_PASSWORD")
            .cloned()
            .context("Missing required key DB_PASSWORD")?;
        let database = required(values, "DB_DATABASE")?;
        crate::utils::validate_mysql_identifier(&database)
            .context("DB_DATABASE is not a valid database name")?;

        let port = match values.get("DB_PORT").map(|p| p.trim()) {
            None | Some("") => DEFAULT_MYSQL_PORT,
            Some(p) => p
                .parse::<u16>()
                .with_context(|| format!("DB_PORT must be a valid port, got '{}'", p))?,
        };

        let ignore_tables = parse_table_list(values.get("DB_IGNORE_TABLES").map(String::as_str));
        for table in &ignore_tables {
            crate::utils::validate_mysql_identifier(table)
                .context("DB_IGNORE_TABLES contains an invalid table name")?;
        }

        Ok(Self {
            connection: ConnectionSettings {
                host,
                port,
                user,
                password,
                database,
            },
            ignore_tables,
        })
    }
}

fn required(values: &HashMap<String, String>, key: &str) -> Result<String> {
    match values.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        Some(_) => bail!("Required key {} is empty", key),
        None => bail!("Missing required key {}", key),
    }
}

/// Fail on any `$` that dotenvy would treat as `$VAR` / `${VAR}` substitution
///
/// Passwords and table names may legitimately contain `$`. It stays literal
/// inside single quotes or when written as `\$`.
fn reject_variable_expansion(contents: &str) -> Result<()> {
    let mut lines = contents.lines().enumerate();
    while let Some((index, line)) = lines.next() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let key = key.trim();
        let value = value.trim_start();
        if value.starts_with('#') {
            continue;
        }
        let mut scanner = ValueScanner::default();
        let mut chunk = value;
        let mut line_number = index + 1;
        loop {
            if scanner.finds_expansion(chunk) {
                bail!(
                    "Value of {} (line {}) contains '$', which would be expanded as a variable.\n\
                     Wrap the value in single quotes or write the dollar sign as \\$ to keep it literal.",
                    key,
                    line_number
                );
            }
            // Quoted values may continue on the next line
            if !scanner.in_quotes() {
                break;
            }
            match lines.next() {
                Some((next_index, next)) => {
                    chunk = next;
                    line_number = next_index + 1;
                }
                None => break,
            }
        }
    }
    Ok(())
}

/// Quote and escape state while walking one env value
#[derive(Debug, Default)]
struct ValueScanner {
    single_quoted: bool,
    double_quoted: bool,
    escaped: bool,
}

impl ValueScanner {
    /// Walk one physical line of a value, returning true at an expanding `$`
    fn finds_expansion(&mut self, text: &str) -> bool {
        for c in text.chars() {
            if self.escaped {
                self.escaped = false;
            } else if self.single_quoted {
                if c == '\'' {
                    self.single_quoted = false;
                }
            } else if c == '$' {
                return true;
            } else if c == '\\' {
                self.escaped = true;
            } else if self.double_quoted {
                if c == '"' {
                    self.double_quoted = false;
                }
            } else if c == '\'' {
                self.single_quoted = true;
            } else if c == '"' {
                self.double_quoted = true;
            } else if c == ' ' || c == '\t' {
                // Only a trailing comment may follow
                return false;
            }
        }
        false
    }

    fn in_quotes(&self) -> bool {
        self.single_quoted || self.double_quoted
    }
}

/// Split a comma-separated table list, dropping blanks and duplicates
pub fn parse_table_list(raw: Option<&str>) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for name in raw.unwrap_or_default().split(',') {
        let name = name.trim();
        if !name.is_empty() && !tables.iter().any(|t| t == name) {
            tables.push(name.to_string());
        }
    }
    tables
}
