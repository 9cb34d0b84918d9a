//! Diesel models mapping to the database schema.
//!
//! Row types for [`crate::schema::daily_bar`] (one trading day, keyed by series and date)
//! and [`crate::schema::bar_indicator`] (indicator fields attached to a bar).
//!
//! The domain-facing types live in [`crate::store`]; these structs stay close to the rows.

use diesel::prelude::*;

use crate::schema::*;

/// A row in [`crate::schema::daily_bar`].
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = daily_bar, check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailyBarRow {
    /// FK to `price_series.id`.
    pub series_id: i32,
    /// `YYYY-MM-DD`.
    pub trading_date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// NULL when the source variant carried no volume.
    pub volume: Option<f64>,
}

/// Insertable form of [`DailyBarRow`]; the whole OHLCV record goes in one statement.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = daily_bar)]
pub struct NewDailyBar<'a> {
    pub series_id: i32,
    pub trading_date: &'a str,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
}

/// A row in [`crate::schema::bar_indicator`].
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bar_indicator, check_for_backend(diesel::sqlite::Sqlite))]
pub struct IndicatorRow {
    pub series_id: i32,
    pub trading_date: String,
    /// Field label, e.g. "20_day_sma".
    pub label: String,
    pub value: f64,
}

/// Insertable / changeset form of [`IndicatorRow`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bar_indicator)]
pub struct NewIndicator<'a> {
    pub series_id: i32,
    pub trading_date: &'a str,
    pub label: &'a str,
    pub value: f64,
}
