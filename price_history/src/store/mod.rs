//! Per-symbol time-series store (SQLite).
//!
//! A symbol's collection is reached through a typed [`SeriesHandle`] returned by
//! [`SeriesRepo::get_series`]; everything else is keyed by trading date inside that handle.
//! The SQLite implementation lives in [`repo`], the ticker universe helpers in [`universe`].

pub mod repo;
pub mod universe;

use std::collections::BTreeMap;

use bar_provider::models::bar::RawBar;
use chrono::NaiveDate;
use diesel::SqliteConnection;

/// Name of the reserved collection holding the ticker universe.
pub const UNIVERSE_COLLECTION: &str = "tracked_ticker";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
/// Errors raised by the store on top of plain database failures.
pub enum RepoError {
    #[error("symbol cannot be empty")]
    /// A blank symbol was passed where a collection name is required.
    EmptySymbol,

    #[error("no bar for {symbol} on {date}")]
    /// `update_field` targeted a date that was never ingested.
    UnknownDate {
        /// Collection symbol.
        symbol: String,
        /// The missing trading date.
        date: NaiveDate,
    },

    #[error("series for {symbol} is not strictly ascending at {date}")]
    /// A listed series broke the ordering invariant.
    OutOfOrder {
        /// Collection symbol.
        symbol: String,
        /// First date that is not after its predecessor.
        date: NaiveDate,
    },
}

/// Result type used throughout the store for fallible operations.
pub type RepoResult<T> = anyhow::Result<T>;

/// Typed access to one symbol's collection.
///
/// Only the store hands these out, so holding one means the collection exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesHandle {
    id: i32,
    symbol: String,
}

impl SeriesHandle {
    pub(crate) fn new(id: i32, symbol: String) -> Self {
        Self { id, symbol }
    }

    pub(crate) fn id(&self) -> i32 {
        self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

/// A persisted trading day with whatever indicator fields have been computed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    /// Indicator label (e.g. "12_day_ema") -> value.
    pub indicators: BTreeMap<String, f64>,
}

/// What [`SeriesRepo::insert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was created.
    Inserted,
    /// A record for that date already existed and was left untouched.
    AlreadyPresent,
}

/// Portable store surface; the SQLite implementation lives in `repo.rs`.
pub trait SeriesRepo {
    /// Resolves (creating on first use) the collection for `symbol`.
    fn get_series(&self, conn: &mut SqliteConnection, symbol: &str) -> RepoResult<SeriesHandle>;

    /// Resolves the collection for `symbol` without creating it.
    fn find_series(
        &self,
        conn: &mut SqliteConnection,
        symbol: &str,
    ) -> RepoResult<Option<SeriesHandle>>;

    /// Point lookup by trading date.
    fn find_by_date(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        date: NaiveDate,
    ) -> RepoResult<Option<StoredBar>>;

    /// Inserts the bar as one record; an existing date is never overwritten.
    fn insert(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        bar: &RawBar,
    ) -> RepoResult<InsertOutcome>;

    /// Every bar of the collection, strictly ascending by date, indicators attached.
    fn list_ascending_by_date(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
    ) -> RepoResult<Vec<StoredBar>>;

    /// Upserts one indicator field on the bar at `date`, leaving every other field alone.
    fn update_field(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        date: NaiveDate,
        field: &str,
        value: f64,
    ) -> RepoResult<()>;

    /// Names of every collection: the universe plus one per stored symbol.
    fn list_collections(&self, conn: &mut SqliteConnection) -> RepoResult<Vec<String>>;

    /// Drops every collection except `reserved`, returning the names dropped.
    fn drop_all_except(
        &self,
        conn: &mut SqliteConnection,
        reserved: &str,
    ) -> RepoResult<Vec<String>>;
}
