use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use common::{Error, Result, Signal, SignalStore, SignalType};

/// Signal store backed by the `signals` table.
///
/// Rows keep insertion order through the autoincrement `seq` column; a signal
/// id that is already stored is ignored.
pub struct SqliteSignalStore {
    db: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SignalRow {
    id: String,
    symbol: String,
    time: String,
    entry: f64,
    signal_type: String,
    stop_loss: Option<f64>,
    take_profit: Option<f64>,
    tp_hit: bool,
    sl_hit: bool,
    reasoning: String,
    description: String,
}

impl TryFrom<SignalRow> for Signal {
    type Error = Error;

    fn try_from(row: SignalRow) -> Result<Self> {
        let time = DateTime::parse_from_rfc3339(&row.time)
            .map_err(|e| Error::StoreCorruption(format!("signal {} has bad time: {e}", row.id)))?
            .with_timezone(&Utc);
        let signal_type = SignalType::from_str(&row.signal_type)
            .map_err(|e| Error::StoreCorruption(format!("signal {}: {e}", row.id)))?;

        Ok(Signal {
            symbol: row.symbol,
            time,
            id: row.id,
            entry: row.entry,
            signal_type,
            stop_loss: row.stop_loss,
            take_profit: row.take_profit,
            tp_hit: row.tp_hit,
            sl_hit: row.sl_hit,
            reasoning: row.reasoning,
            description: row.description,
        })
    }
}

impl SqliteSignalStore {
    /// Connect (creating the database file if needed) and run migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` opens a separate database.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePool::connect_with(options).await?
        };

        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!(url, "Signal database ready");
        Ok(Self { db: pool })
    }
}

#[async_trait]
impl SignalStore for SqliteSignalStore {
    async fn append(&self, signal: &Signal) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO signals
                (id, symbol, time, entry, signal_type, stop_loss, take_profit,
                 tp_hit, sl_hit, reasoning, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&signal.id)
        .bind(&signal.symbol)
        .bind(signal.time.to_rfc3339())
        .bind(signal.entry)
        .bind(signal.signal_type.to_string())
        .bind(signal.stop_loss)
        .bind(signal.take_profit)
        .bind(signal.tp_hit)
        .bind(signal.sl_hit)
        .bind(&signal.reasoning)
        .bind(&signal.description)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            debug!(signal_id = %signal.id, "Signal already stored");
        }
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Signal>> {
        let rows: Vec<SignalRow> = sqlx::query_as(
            r#"
            SELECT id, symbol, time, entry, signal_type, stop_loss, take_profit,
                   tp_hit, sl_hit, reasoning, description
            FROM signals
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Signal::try_from).collect()
    }
}
