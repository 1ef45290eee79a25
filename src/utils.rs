// ABOUTME: Utility functions for validation, tool discovery and formatting
// ABOUTME: Provides identifier checks, PATH lookups and human-readable sizes

use anyhow::{bail, Result};
use std::time::Duration;
use which::which;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Validate a MySQL identifier (database or table name)
///
/// MySQL permits almost any character in quoted identifiers, but names that are
/// handed to `mysqldump --ignore-table=<db>.<table>` must stay unambiguous.
/// An identifier must:
/// - Be 1-64 characters long
/// - Contain no control characters
/// - Contain no `.`, backtick, slash or backslash
///
/// # Examples
///
/// ```
/// # use mysql_backup_monitor::utils::validate_mysql_identifier;
/// assert!(validate_mysql_identifier("orders").is_ok());
/// assert!(validate_mysql_identifier("order-items").is_ok());
/// assert!(validate_mysql_identifier("shop.orders").is_err());
/// assert!(validate_mysql_identifier("").is_err());
/// ```
pub fn validate_mysql_identifier(identifier: &str) -> Result<()> {
    if identifier.trim().is_empty() {
        bail!("Identifier cannot be empty or whitespace-only");
    }

    // MySQL limit is 64 characters
    let len = identifier.chars().count();
    if len > 64 {
        bail!(
            "Identifier '{}' exceeds maximum length of 64 characters (got {})",
            sanitize_identifier(identifier),
            len
        );
    }

    for (i, c) in identifier.chars().enumerate() {
        if c.is_control() || matches!(c, '.' | '`' | '/' | '\\') {
            bail!(
                "Identifier '{}' contains invalid character '{}' at position {}",
                sanitize_identifier(identifier),
                if c.is_control() {
                    format!("\\x{:02x}", c as u32)
                } else {
                    c.to_string()
                },
                i
            );
        }
    }

    Ok(())
}

/// Sanitize an identifier for display
///
/// Removes control characters and limits length to prevent log injection.
/// For SQL safety use bound parameters instead.
///
/// # Examples
///
/// ```
/// # use mysql_backup_monitor::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\nname"), "tablename");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

/// Check that the MySQL client tools needed for a dump are on PATH
///
/// # Errors
///
/// Returns an error with installation instructions if `mysqldump` is missing.
pub fn check_required_tools() -> Result<()> {
    let tools = ["mysqldump"];
    let mut missing = Vec::new();

    for tool in &tools {
        if which(tool).is_err() {
            missing.push(*tool);
        }
    }

    if !missing.is_empty() {
        bail!(
            "Missing required MySQL client tools: {}\n\
             \n\
             Please install MySQL client tools:\n\
             - Ubuntu/Debian: sudo apt-get install mysql-client\n\
             - macOS: brew install mysql-client\n\
             - RHEL/CentOS: sudo yum install mysql",
            missing.join(", ")
        );
    }

    Ok(())
}

/// Convert a byte count into megabytes (1 MB = 1024 * 1024 bytes)
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

/// Convert megabytes back into whole bytes, saturating at zero
pub fn megabytes_to_bytes(megabytes: f64) -> u64 {
    (megabytes.max(0.0) * BYTES_PER_MEGABYTE).round() as u64
}

/// Round to two decimal places, as the catalog size report does
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a megabyte value into a human-readable string
///
/// Values of a gigabyte or more are shown in GB, everything else in MB,
/// always with two decimal places.
///
/// # Examples
///
/// ```
/// # use mysql_backup_monitor::utils::format_megabytes;
/// assert_eq!(format_megabytes(15.0), "15.00 MB");
/// assert_eq!(format_megabytes(2048.0), "2.00 GB");
/// ```
pub fn format_megabytes(megabytes: f64) -> String {
    if megabytes >= 1024.0 {
        format!("{:.2} GB", megabytes / 1024.0)
    } else {
        format!("{:.2} MB", megabytes)
    }
}

/// Format duration into human-readable string
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use mysql_backup_monitor::utils::format_duration;
/// assert_eq!(format_duration(Duration::from_secs(45)), "~45 seconds");
/// assert_eq!(format_duration(Duration::from_secs(120)), "~2.0 minutes");
/// assert_eq!(format_duration(Duration::from_secs(7200)), "~2.0 hours");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("~{} seconds", secs)
    } else if secs < 3600 {
        format!("~{:.1} minutes", secs as f64 / 60.0)
    } else if secs < 86400 {
        format!("~{:.1} hours", secs as f64 / 3600.0)
    } else {
        format!("~{:.1} days", secs as f64 / 86400.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_required_tools() {
        // Passes on machines with mysqldump installed; otherwise the error must name it
        if let Err(err) = check_required_tools() {
            let err_msg = err.to_string();
            assert!(err_msg.contains("Missing required MySQL client tools"));
            assert!(err_msg.contains("mysqldump"));
        }
    }

    #[test]
    fn test_validate_mysql_identifier_valid() {
        assert!(validate_mysql_identifier("orders").is_ok());
        assert!(validate_mysql_identifier("order_items").is_ok());
        assert!(validate_mysql_identifier("order-items").is_ok());
        assert!(validate_mysql_identifier("2024_archive").is_ok());
        assert!(validate_mysql_identifier("Café").is_ok());

        let max_length_name = "a".repeat(64);
        assert!(validate_mysql_identifier(&max_length_name).is_ok());
    }

    #[test]
    fn test_validate_mysql_identifier_invalid() {
        assert!(validate_mysql_identifier("").is_err());
        assert!(validate_mysql_identifier("   ").is_err());
        assert!(validate_mysql_identifier("shop.orders").is_err());
        assert!(validate_mysql_identifier("orders`; DROP TABLE users; --").is_err());
        assert!(validate_mysql_identifier("../etc/passwd").is_err());
        assert!(validate_mysql_identifier("back\\slash").is_err());
        assert!(validate_mysql_identifier("my\ndb").is_err());
        assert!(validate_mysql_identifier("my\x00db").is_err());

        let too_long = "a".repeat(65);
        assert!(validate_mysql_identifier(&too_long).is_err());
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("normal_table"), "normal_table");
        assert_eq!(sanitize_identifier("table\x00name"), "tablename");
        assert_eq!(sanitize_identifier("table\nname"), "tablename");

        let long_name = "a".repeat(200);
        assert_eq!(sanitize_identifier(&long_name).len(), 100);
    }

    #[test]
    fn test_megabyte_conversions() {
        assert_eq!(bytes_to_megabytes(0), 0.0);
        assert_eq!(bytes_to_megabytes(1_048_576), 1.0);
        assert_eq!(bytes_to_megabytes(10_485_760), 10.0);
        assert_eq!(megabytes_to_bytes(1.5), 1_572_864);
        assert_eq!(megabytes_to_bytes(-3.0), 0);
    }

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(3.3333), 3.33);
        assert_eq!(round_to_hundredths(0.005), 0.01);
        assert_eq!(round_to_hundredths(12.0), 12.0);
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(0.0), "0.00 MB");
        assert_eq!(format_megabytes(3.33), "3.33 MB");
        assert_eq!(format_megabytes(1023.99), "1023.99 MB");
        assert_eq!(format_megabytes(1536.0), "1.50 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "~30 seconds");
        assert_eq!(format_duration(Duration::from_secs(60)), "~1.0 minutes");
        assert_eq!(format_duration(Duration::from_secs(3600)), "~1.0 hours");
        assert_eq!(format_duration(Duration::from_secs(172800)), "~2.0 days");
    }
}
