//! set up migrations

use anyhow::anyhow;
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::db::connection::connect_sqlite;

/// Embedded Diesel migrations bundled with this crate.
///
/// These are applied by [`run_pending`] to bring the database schema up to date.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Applies every pending migration on an already open connection.
pub fn run_pending(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;
    Ok(())
}

/// Runs pending Diesel migrations on a SQLite database at the given URL.
///
/// Opens the database through [`connect_sqlite`] (so WAL is set) and applies all embedded
/// migrations, returning an error on failure.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let mut conn = connect_sqlite(url)?;
    run_pending(&mut conn)
}
