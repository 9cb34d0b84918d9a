//! The ticker universe: which symbols a run ingests.

use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};

use crate::{
    schema::tracked_ticker::dsl::*,
    store::{RepoError, RepoResult},
};

/// Canonical form of a user-supplied ticker: trimmed and upper-cased.
pub fn normalize_symbol(raw: &str) -> RepoResult<String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(RepoError::EmptySymbol.into());
    }
    Ok(s.to_ascii_uppercase())
}

/// Every tracked symbol, alphabetically.
pub fn list_tickers(conn: &mut SqliteConnection) -> RepoResult<Vec<String>> {
    Ok(tracked_ticker
        .order(symbol.asc())
        .select(symbol)
        .load::<String>(conn)?)
}

/// Adds `raw` to the universe. Returns `false` when it was already tracked.
pub fn add_ticker(conn: &mut SqliteConnection, raw: &str) -> RepoResult<bool> {
    let sym = normalize_symbol(raw)?;
    let n = insert_into(tracked_ticker)
        .values(symbol.eq(&sym))
        .on_conflict(symbol)
        .do_nothing()
        .execute(conn)?;
    Ok(n == 1)
}

/// Removes `raw` from the universe. Stored bars for it are left alone.
pub fn remove_ticker(conn: &mut SqliteConnection, raw: &str) -> RepoResult<bool> {
    let sym = normalize_symbol(raw)?;
    let n = diesel::delete(tracked_ticker.filter(symbol.eq(&sym))).execute(conn)?;
    Ok(n == 1)
}
