//! Daily price history ingestion and moving-average indicators.
//!
//! - [`store`]: per-symbol series collections in SQLite, plus the ticker universe.
//! - [`ingest`]: idempotent, append-only persistence of fetched bars.
//! - [`indicators`]: SMA/EMA backfill over a symbol's stored closes.
//! - [`pipeline`]: the per-run orchestration with bounded concurrent fetches.
//! - [`config`]: TOML configuration and environment overrides.

pub mod config;
pub mod dates;
pub mod db;
pub mod indicators;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod telemetry;
