// ABOUTME: MySQL connection handling for the size estimator
// ABOUTME: Builds connection options from DumpConfig and verifies connectivity

pub mod catalog;

use crate::config::ConnectionSettings;
use anyhow::{Context, Result};
use mysql_async::{prelude::Queryable, Conn, Opts, OptsBuilder};

/// Build `mysql_async` connection options from the configured settings
///
/// The schema is selected as the default database so a nonexistent schema or
/// missing privileges surface at connect time.
pub fn connection_opts(settings: &ConnectionSettings) -> Opts {
    OptsBuilder::default()
        .ip_or_hostname(settings.host.clone())
        .tcp_port(settings.port)
        .user(Some(settings.user.clone()))
        .pass(Some(settings.password.clone()))
        .db_name(Some(settings.database.clone()))
        .into()
}

/// Connect to MySQL
///
/// Opens a single connection and verifies it with a ping. No retries are made.
///
/// # Errors
///
/// Returns an error if the server is unreachable, the credentials are
/// rejected, or the ping fails.
///
/// # Examples
///
/// ```no_run
/// # use mysql_backup_monitor::config::ConnectionSettings;
/// # use mysql_backup_monitor::mysql::connect_mysql;
/// # async fn example() -> anyhow::Result<()> {
/// let settings = ConnectionSettings {
///     host: "localhost".to_string(),
///     port: 3306,
///     user: "backup".to_string(),
///     password: "secret".to_string(),
///     database: "shop".to_string(),
/// };
/// let conn = connect_mysql(&settings).await?;
/// conn.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub async fn connect_mysql(settings: &ConnectionSettings) -> Result<Conn> {
    tracing::info!(
        "Connecting to MySQL at {}:{} as '{}'",
        settings.host,
        settings.port,
        settings.user
    );

    let mut conn = Conn::new(connection_opts(settings)).await.with_context(|| {
        format!(
            "Failed to connect to MySQL at {}:{}.\n\
             \n\
             Common causes:\n\
             - Server is not running or not reachable\n\
             - Invalid username or password\n\
             - Database '{}' does not exist or user lacks access",
            settings.host, settings.port, settings.database
        )
    })?;

    conn.ping()
        .await
        .context("MySQL connection was opened but did not answer ping")?;

    tracing::debug!("Successfully connected to MySQL");

    Ok(conn)
}

/// Close a connection cleanly, logging rather than failing on errors
pub async fn disconnect(conn: Conn) {
    if let Err(e) = conn.disconnect().await {
        tracing::warn!("Failed to close MySQL connection cleanly: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            host: "db.internal".to_string(),
            port: 3307,
            user: "backup".to_string(),
            password: "p@ss;word".to_string(),
            database: "shop".to_string(),
        }
    }

    #[test]
    fn test_connection_opts_carry_settings() {
        let opts = connection_opts(&settings());
        assert_eq!(opts.ip_or_hostname(), "db.internal");
        assert_eq!(opts.tcp_port(), 3307);
        assert_eq!(opts.user(), Some("backup"));
        assert_eq!(opts.pass(), Some("p@ss;word"));
        assert_eq!(opts.db_name(), Some("shop"));
    }
}
