use std::collections::BTreeMap;

use anyhow::Context;
use bar_provider::models::bar::RawBar;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};
use tracing::{debug, info};

use crate::{
    dates,
    models::{DailyBarRow, IndicatorRow, NewDailyBar, NewIndicator},
    schema::{bar_indicator, daily_bar, price_series, tracked_ticker},
    store::{
        InsertOutcome, RepoError, RepoResult, SeriesHandle, SeriesRepo, StoredBar,
        UNIVERSE_COLLECTION, universe::normalize_symbol,
    },
};

/// Repository for per-symbol series data in a SQLite database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSeriesRepo;

impl SqliteSeriesRepo {
    pub fn new() -> Self {
        Self
    }
}

fn stored_bar(row: DailyBarRow, indicators: BTreeMap<String, f64>) -> RepoResult<StoredBar> {
    Ok(StoredBar {
        date: dates::from_db(&row.trading_date)?,
        open: row.open,
        high: row.high,
        low: row.low,
        close: row.close,
        volume: row.volume,
        indicators,
    })
}

impl SeriesRepo for SqliteSeriesRepo {
    fn get_series(&self, conn: &mut SqliteConnection, symbol: &str) -> RepoResult<SeriesHandle> {
        use crate::schema::price_series::dsl as ps;

        let symbol = normalize_symbol(symbol)?;
        let symbol = symbol.as_str();
        let created = insert_into(ps::price_series)
            .values(ps::symbol.eq(symbol))
            .on_conflict(ps::symbol)
            .do_nothing()
            .execute(conn)?;
        if created > 0 {
            debug!(symbol, "Created series collection");
        }

        let id: i32 = ps::price_series
            .filter(ps::symbol.eq(symbol))
            .select(ps::id)
            .first(conn)
            .with_context(|| format!("series {symbol} vanished after upsert"))?;
        Ok(SeriesHandle::new(id, symbol.to_string()))
    }

    fn find_series(
        &self,
        conn: &mut SqliteConnection,
        symbol: &str,
    ) -> RepoResult<Option<SeriesHandle>> {
        use crate::schema::price_series::dsl as ps;

        let symbol = normalize_symbol(symbol)?;
        let id = ps::price_series
            .filter(ps::symbol.eq(&symbol))
            .select(ps::id)
            .first::<i32>(conn)
            .optional()?;
        Ok(id.map(|id| SeriesHandle::new(id, symbol)))
    }

    fn find_by_date(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        date: NaiveDate,
    ) -> RepoResult<Option<StoredBar>> {
        let day = dates::to_db(date);

        let Some(row) = daily_bar::table
            .find((series.id(), day.as_str()))
            .select(DailyBarRow::as_select())
            .first(conn)
            .optional()?
        else {
            return Ok(None);
        };

        let indicators: BTreeMap<String, f64> = bar_indicator::table
            .filter(bar_indicator::series_id.eq(series.id()))
            .filter(bar_indicator::trading_date.eq(&day))
            .select((bar_indicator::label, bar_indicator::value))
            .load::<(String, f64)>(conn)?
            .into_iter()
            .collect();

        Ok(Some(stored_bar(row, indicators)?))
    }

    fn insert(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        bar: &RawBar,
    ) -> RepoResult<InsertOutcome> {
        let day = dates::to_db(bar.date);
        let row = NewDailyBar {
            series_id: series.id(),
            trading_date: &day,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        };

        // INSERT .. ON CONFLICT DO NOTHING: the stored bar always wins.
        let n = insert_into(daily_bar::table)
            .values(&row)
            .on_conflict((daily_bar::series_id, daily_bar::trading_date))
            .do_nothing()
            .execute(conn)?;

        Ok(if n == 1 {
            InsertOutcome::Inserted
        } else {
            InsertOutcome::AlreadyPresent
        })
    }

    fn list_ascending_by_date(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
    ) -> RepoResult<Vec<StoredBar>> {
        let rows: Vec<DailyBarRow> = daily_bar::table
            .filter(daily_bar::series_id.eq(series.id()))
            .order(daily_bar::trading_date.asc())
            .select(DailyBarRow::as_select())
            .load(conn)?;

        let mut by_date: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for ind in bar_indicator::table
            .filter(bar_indicator::series_id.eq(series.id()))
            .select(IndicatorRow::as_select())
            .load(conn)?
        {
            by_date
                .entry(ind.trading_date)
                .or_default()
                .insert(ind.label, ind.value);
        }

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            let indicators = by_date.remove(&row.trading_date).unwrap_or_default();
            let bar = stored_bar(row, indicators)?;
            if let Some(prev) = bars.last().map(|b: &StoredBar| b.date) {
                if bar.date <= prev {
                    return Err(RepoError::OutOfOrder {
                        symbol: series.symbol().to_string(),
                        date: bar.date,
                    }
                    .into());
                }
            }
            bars.push(bar);
        }
        Ok(bars)
    }

    fn update_field(
        &self,
        conn: &mut SqliteConnection,
        series: &SeriesHandle,
        date: NaiveDate,
        field: &str,
        value: f64,
    ) -> RepoResult<()> {
        let day = dates::to_db(date);

        let exists: i64 = daily_bar::table
            .filter(daily_bar::series_id.eq(series.id()))
            .filter(daily_bar::trading_date.eq(&day))
            .count()
            .get_result(conn)?;
        if exists == 0 {
            return Err(RepoError::UnknownDate {
                symbol: series.symbol().to_string(),
                date,
            }
            .into());
        }

        let row = NewIndicator {
            series_id: series.id(),
            trading_date: &day,
            label: field,
            value,
        };
        insert_into(bar_indicator::table)
            .values(&row)
            .on_conflict((
                bar_indicator::series_id,
                bar_indicator::trading_date,
                bar_indicator::label,
            ))
            .do_update()
            .set(bar_indicator::value.eq(value))
            .execute(conn)?;
        Ok(())
    }

    fn list_collections(&self, conn: &mut SqliteConnection) -> RepoResult<Vec<String>> {
        let mut names = vec![UNIVERSE_COLLECTION.to_string()];
        names.extend(
            price_series::table
                .order(price_series::symbol.asc())
                .select(price_series::symbol)
                .load::<String>(conn)?,
        );
        Ok(names)
    }

    fn drop_all_except(
        &self,
        conn: &mut SqliteConnection,
        reserved: &str,
    ) -> RepoResult<Vec<String>> {
        conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let mut dropped = Vec::new();

            for name in self.list_collections(conn)? {
                if name == reserved {
                    continue;
                }
                if name == UNIVERSE_COLLECTION {
                    diesel::delete(tracked_ticker::table).execute(conn)?;
                } else {
                    let Some(series) = self.find_series(conn, &name)? else {
                        continue;
                    };
                    // Children first so this works even with foreign_keys=OFF.
                    diesel::delete(
                        bar_indicator::table.filter(bar_indicator::series_id.eq(series.id())),
                    )
                    .execute(conn)?;
                    diesel::delete(daily_bar::table.filter(daily_bar::series_id.eq(series.id())))
                        .execute(conn)?;
                    diesel::delete(price_series::table.find(series.id())).execute(conn)?;
                }
                info!(collection = %name, "Dropped collection");
                dropped.push(name);
            }

            Ok(dropped)
        })
    }
}
