//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies recommended PRAGMAs:
//! WAL journaling, foreign_keys=ON (required for the bar/indicator cascades), and a
//! 5000ms busy_timeout.

use anyhow::{Context, bail};
use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// Turns a `DATABASE_URL`-style string into something `SqliteConnection::establish` accepts.
///
/// Bare paths, `file:` URIs and `:memory:` pass through; a `sqlite://` or `sqlite:` scheme
/// prefix is stripped. Server URLs are rejected since only SQLite is supported.
pub fn normalize_sqlite_url(database_url: &str) -> anyhow::Result<&str> {
    let url = database_url.trim();
    if url.is_empty() {
        bail!("database url is empty");
    }
    if url.starts_with("postgres://") || url.starts_with("postgresql://") || url.starts_with("mysql://") {
        bail!("Unsupported DATABASE_URL: {url} (only SQLite is supported)");
    }
    Ok(url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url))
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let url = normalize_sqlite_url(database_url)?;
    let mut conn = SqliteConnection::establish(url)
        .with_context(|| format!("cannot open SQLite database at {url}"))?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}
