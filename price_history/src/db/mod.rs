//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON, and a 5000ms busy_timeout.
//! - Embedded Diesel migrations and runners: [`migrate::run_pending`] on an open connection and
//!   [`migrate::run_sqlite`] which opens one for the given URL.
//!
//! Example:
//! ```no_run
//! use price_history::db::{connection, migrate};
//!
//! let db_path = std::env::temp_dir().join("price_history_example.db");
//! let mut conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! migrate::run_pending(&mut conn).expect("migrations");
//! ```

pub mod connection;
pub mod migrate;
