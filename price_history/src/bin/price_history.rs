use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use diesel::SqliteConnection;
use price_history::{
    config::{AppConfig, load_config_path},
    db::{connection::connect_sqlite, migrate},
    pipeline::Pipeline,
    store::{SeriesRepo, UNIVERSE_COLLECTION, repo::SqliteSeriesRepo, universe},
    telemetry::init_tracing,
};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Daily price history ingestion and moving averages")]
struct Cli {
    /// TOML configuration file; built-in defaults apply if it does not exist.
    #[arg(long, value_name = "FILE", default_value = "price_history.toml")]
    config: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch, ingest and compute indicators for the ticker universe.
    Run {
        /// Process only these symbols instead of the whole universe.
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
    },
    /// Drop every stored series, keeping the ticker universe.
    Reset,
    /// Manage the ticker universe.
    Tickers {
        #[command(subcommand)]
        sub: TickersSub,
    },
    /// Print the most recent bars of a symbol with their indicators.
    Show {
        symbol: String,
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
}

#[derive(Subcommand)]
enum TickersSub {
    List,
    Add {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    Remove {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
}

fn open_store(config: &AppConfig) -> Result<SqliteConnection> {
    let mut conn = connect_sqlite(&config.database_url)
        .with_context(|| format!("store unavailable at {}", config.database_url))?;
    migrate::run_pending(&mut conn).context("applying migrations")?;
    Ok(conn)
}

/// Normalized, de-duplicated, in the order given.
fn requested_symbols(raw: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for s in raw {
        let sym = universe::normalize_symbol(s)?;
        if !out.contains(&sym) {
            out.push(sym);
        }
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config_path(&cli.config)?;
    let repo = SqliteSeriesRepo::new();

    match cli.cmd {
        Cmd::Run { symbols } => {
            // Credential problems must surface before touching the network or the store.
            let provider = config.provider()?;
            let mut conn = open_store(&config)?;
            let pipeline = Pipeline::new(&config, Arc::new(provider), repo);

            let summary = if symbols.is_empty() {
                pipeline.run_universe(&mut conn).await?
            } else {
                pipeline.run(&mut conn, &requested_symbols(&symbols)?).await
            };
            println!("{summary}");
        }
        Cmd::Reset => {
            let mut conn = open_store(&config)?;
            let dropped = repo.drop_all_except(&mut conn, UNIVERSE_COLLECTION)?;
            info!(count = dropped.len(), "Reset complete");
            for name in &dropped {
                println!("dropped {name}");
            }
            println!("{} collection(s) dropped", dropped.len());
        }
        Cmd::Tickers { sub } => {
            let mut conn = open_store(&config)?;
            match sub {
                TickersSub::List => {
                    for sym in universe::list_tickers(&mut conn)? {
                        println!("{sym}");
                    }
                }
                TickersSub::Add { symbols } => {
                    for s in &symbols {
                        let added = universe::add_ticker(&mut conn, s)?;
                        println!("{} {}", if added { "added" } else { "already tracked" }, s.trim());
                    }
                }
                TickersSub::Remove { symbols } => {
                    for s in &symbols {
                        let removed = universe::remove_ticker(&mut conn, s)?;
                        println!("{} {}", if removed { "removed" } else { "not tracked" }, s.trim());
                    }
                }
            }
        }
        Cmd::Show { symbol, last } => {
            let mut conn = open_store(&config)?;
            let symbol = universe::normalize_symbol(&symbol)?;
            let Some(series) = repo.find_series(&mut conn, &symbol)? else {
                println!("no stored data for {symbol}");
                return Ok(());
            };
            let bars = repo.list_ascending_by_date(&mut conn, &series)?;
            for bar in &bars[bars.len().saturating_sub(last)..] {
                let volume = bar.volume.map_or_else(|| "-".to_string(), |v| v.to_string());
                let indicators = bar
                    .indicators
                    .iter()
                    .map(|(k, v)| format!("{k}={v:.4}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "{} o={} h={} l={} c={} v={} {}",
                    bar.date, bar.open, bar.high, bar.low, bar.close, volume, indicators
                );
            }
        }
    }

    Ok(())
}
